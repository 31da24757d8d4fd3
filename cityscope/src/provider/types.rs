//! Provider trait definitions and wire-level record types.
//!
//! Providers return raw records with unvalidated coordinates and string
//! dates, exactly as a remote API would. Conversion into domain entities
//! happens at ingestion, where invalid records are rejected one by one
//! instead of failing the whole batch.

use crate::entity::{GeoEntity, LayerKind, SafetyLevel};
use crate::geo::{GeoError, LatLng};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;
use std::future::Future;

/// Date format used by provider records.
const DATE_FORMAT: &str = "%Y-%m-%d";

// ====== Errors ======

/// Errors that can occur when fetching from a provider.
///
/// All variants are transient from the caller's point of view: the layer
/// keeps its previous snapshot and the next refresh retries.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The provider could not be reached or refused to answer.
    Unavailable(String),
    /// The provider answered with data that could not be used.
    InvalidResponse(String),
    /// The provider did not answer within the configured deadline.
    Timeout { seconds: u64 },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Unavailable(msg) => {
                write!(f, "Provider unavailable: {}", msg)
            }
            ProviderError::InvalidResponse(msg) => {
                write!(f, "Invalid response: {}", msg)
            }
            ProviderError::Timeout { seconds } => {
                write!(f, "Provider timed out after {}s", seconds)
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Errors rejecting a single record during conversion to a domain entity.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    /// The record's coordinates are out of range.
    Coordinate(GeoError),
    /// The record's date string does not parse.
    Date { value: String },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::Coordinate(err) => write!(f, "{}", err),
            RecordError::Date { value } => {
                write!(f, "invalid date '{}' (expected YYYY-MM-DD)", value)
            }
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordError::Coordinate(err) => Some(err),
            RecordError::Date { .. } => None,
        }
    }
}

impl From<GeoError> for RecordError {
    fn from(err: GeoError) -> Self {
        RecordError::Coordinate(err)
    }
}

// ====== Layer records ======

/// Raw safety zone record as returned by a data provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SafetyRecord {
    pub lat: f64,
    pub lng: f64,
    pub level: SafetyLevel,
}

/// Raw restaurant record as returned by a data provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RestaurantRecord {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub price: String,
}

/// Raw event record as returned by a data provider.
///
/// The date stays a string until ingestion so a malformed date rejects
/// just this record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventRecord {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub date: String,
}

impl TryFrom<SafetyRecord> for GeoEntity {
    type Error = RecordError;

    fn try_from(record: SafetyRecord) -> Result<Self, Self::Error> {
        Ok(GeoEntity::Safety {
            position: LatLng::new(record.lat, record.lng)?,
            level: record.level,
        })
    }
}

impl TryFrom<RestaurantRecord> for GeoEntity {
    type Error = RecordError;

    fn try_from(record: RestaurantRecord) -> Result<Self, Self::Error> {
        Ok(GeoEntity::Restaurant {
            position: LatLng::new(record.lat, record.lng)?,
            name: record.name,
            price: record.price,
        })
    }
}

impl TryFrom<EventRecord> for GeoEntity {
    type Error = RecordError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let date = NaiveDate::parse_from_str(&record.date, DATE_FORMAT)
            .map_err(|_| RecordError::Date {
                value: record.date.clone(),
            })?;
        Ok(GeoEntity::Event {
            position: LatLng::new(record.lat, record.lng)?,
            name: record.name,
            date,
        })
    }
}

/// One layer's worth of raw records, tagged by layer.
#[derive(Debug, Clone)]
pub enum LayerRecords {
    Safety(Vec<SafetyRecord>),
    Restaurants(Vec<RestaurantRecord>),
    Events(Vec<EventRecord>),
}

impl LayerRecords {
    pub fn kind(&self) -> LayerKind {
        match self {
            LayerRecords::Safety(_) => LayerKind::Safety,
            LayerRecords::Restaurants(_) => LayerKind::Restaurants,
            LayerRecords::Events(_) => LayerKind::Events,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            LayerRecords::Safety(records) => records.len(),
            LayerRecords::Restaurants(records) => records.len(),
            LayerRecords::Events(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ====== Search records ======

/// Raw search hit as returned by a search provider.
///
/// Hits carry no coordinates; they are presented in a result list, not
/// placed on the map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchRecord {
    Restaurant {
        name: String,
        description: String,
        price: String,
    },
    Event {
        name: String,
        description: String,
        date: String,
    },
    Info {
        description: String,
    },
}

// ====== Route records ======

/// Raw planned route as returned by a route provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteRecord {
    /// Total distance in kilometres.
    pub distance: f64,
    /// Estimated travel time in minutes.
    pub time: f64,
    pub steps: Vec<RouteStepRecord>,
}

/// One step of a raw route.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteStepRecord {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

// ====== Provider traits ======

/// Source of map layer data.
///
/// Each fetch returns a complete snapshot for one layer; the store replaces
/// that layer wholesale rather than merging.
pub trait MapDataProvider: Send + Sync {
    /// Fetches the current set of safety zones.
    fn fetch_safety(
        &self,
    ) -> impl Future<Output = Result<Vec<SafetyRecord>, ProviderError>> + Send;

    /// Fetches the current set of restaurants.
    fn fetch_restaurants(
        &self,
    ) -> impl Future<Output = Result<Vec<RestaurantRecord>, ProviderError>> + Send;

    /// Fetches the current set of events.
    fn fetch_events(
        &self,
    ) -> impl Future<Output = Result<Vec<EventRecord>, ProviderError>> + Send;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Source of free-text search results.
pub trait SearchProvider: Send + Sync {
    /// Runs a query and returns matching hits, best first.
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<SearchRecord>, ProviderError>> + Send;
}

/// Source of planned routes.
pub trait RouteProvider: Send + Sync {
    /// Plans a route from an origin to the target entity's position.
    fn plan_route(
        &self,
        origin: LatLng,
        target: &GeoEntity,
    ) -> impl Future<Output = Result<RouteRecord, ProviderError>> + Send;
}
