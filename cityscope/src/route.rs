//! Route planning state.
//!
//! Route planning shares the search session's sequencing discipline: every
//! request gets a sequence number, stale responses are discarded, and a
//! failed plan keeps whatever route was already installed. The planner also
//! remembers which entity its route leads to, so a selection moving to a
//! different entity drops a route that no longer applies.

use crate::entity::{EntityKey, GeoEntity};
use crate::geo::LatLng;
use crate::provider::types::{ProviderError, RecordError, RouteRecord};
use serde::Serialize;
use tracing::debug;

/// Sequence number tying a route response to its request.
pub type RouteSeq = u64;

/// One step of a planned route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStep {
    pub name: String,
    pub position: LatLng,
}

/// A validated, installable route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub distance_km: f64,
    pub time_minutes: f64,
    pub steps: Vec<RouteStep>,
}

impl TryFrom<RouteRecord> for Route {
    type Error = RecordError;

    fn try_from(record: RouteRecord) -> Result<Self, Self::Error> {
        let mut steps = Vec::with_capacity(record.steps.len());
        for step in record.steps {
            steps.push(RouteStep {
                position: LatLng::new(step.lat, step.lng)?,
                name: step.name,
            });
        }
        Ok(Route {
            distance_km: record.distance,
            time_minutes: record.time,
            steps,
        })
    }
}

/// What a route completion amounted to.
#[derive(Debug, PartialEq)]
pub enum RouteOutcome {
    /// The route was installed and should be drawn.
    Installed {
        distance_km: f64,
        time_minutes: f64,
        steps: usize,
    },
    /// Planning failed; any previously installed route is kept.
    Failed { message: String },
    /// The response was superseded and discarded.
    Stale,
}

/// Tracks the installed route and the request in flight, if any.
#[derive(Debug, Default)]
pub struct RoutePlanner {
    current: Option<Route>,
    target: Option<EntityKey>,
    current_seq: RouteSeq,
    pending: bool,
}

impl RoutePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts planning a route to `target`, superseding any request in
    /// flight. Returns the sequence number the response must present.
    pub fn begin(&mut self, target: &GeoEntity) -> RouteSeq {
        self.current_seq += 1;
        self.pending = true;
        self.target = Some(target.key());
        self.current_seq
    }

    /// Applies a planning response.
    ///
    /// Success installs the route. Failure reports but leaves the
    /// previously installed route untouched. Superseded responses are
    /// discarded as `Stale`.
    pub fn complete(
        &mut self,
        seq: RouteSeq,
        result: Result<Route, ProviderError>,
    ) -> RouteOutcome {
        if seq != self.current_seq || !self.pending {
            debug!(seq, current = self.current_seq, "Discarded stale route response");
            return RouteOutcome::Stale;
        }
        self.pending = false;

        match result {
            Ok(route) => {
                let outcome = RouteOutcome::Installed {
                    distance_km: route.distance_km,
                    time_minutes: route.time_minutes,
                    steps: route.steps.len(),
                };
                self.current = Some(route);
                outcome
            }
            Err(err) => RouteOutcome::Failed {
                message: err.to_string(),
            },
        }
    }

    /// Drops the installed route and invalidates any request in flight.
    pub fn reset(&mut self) {
        self.current = None;
        self.target = None;
        self.pending = false;
        self.current_seq += 1;
    }

    /// Reacts to the selection moving to `key`.
    ///
    /// A route (or pending request) targeting a different entity is
    /// dropped; one already targeting `key` is kept. Returns whether a
    /// reset happened.
    pub fn retarget(&mut self, key: &EntityKey) -> bool {
        match &self.target {
            Some(target) if target != key => {
                debug!(target = %target, new = %key, "Dropped route after target change");
                self.reset();
                true
            }
            _ => false,
        }
    }

    /// The installed route, if any.
    pub fn route(&self) -> Option<&Route> {
        self.current.as_ref()
    }

    /// Identity of the entity the installed or pending route targets.
    pub fn target(&self) -> Option<&EntityKey> {
        self.target.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SafetyLevel;
    use crate::provider::types::RouteStepRecord;

    fn target(name: &str) -> GeoEntity {
        GeoEntity::Restaurant {
            position: LatLng::new(37.7831, -122.4039).unwrap(),
            name: name.to_string(),
            price: "$".to_string(),
        }
    }

    fn short_route(distance_km: f64) -> Route {
        Route {
            distance_km,
            time_minutes: distance_km * 4.0,
            steps: vec![RouteStep {
                name: "Depart".to_string(),
                position: LatLng::new(37.7749, -122.4194).unwrap(),
            }],
        }
    }

    #[test]
    fn test_begin_and_complete_installs_route() {
        let mut planner = RoutePlanner::new();
        let seq = planner.begin(&target("Taco Town"));

        let outcome = planner.complete(seq, Ok(short_route(1.5)));

        assert_eq!(
            outcome,
            RouteOutcome::Installed {
                distance_km: 1.5,
                time_minutes: 6.0,
                steps: 1,
            }
        );
        assert_eq!(planner.route(), Some(&short_route(1.5)));
        assert!(!planner.is_pending());
    }

    #[test]
    fn test_failure_keeps_installed_route() {
        let mut planner = RoutePlanner::new();
        let seq = planner.begin(&target("Taco Town"));
        planner.complete(seq, Ok(short_route(1.5)));

        let seq = planner.begin(&target("Taco Town"));
        let outcome = planner.complete(
            seq,
            Err(ProviderError::Unavailable("routing offline".to_string())),
        );

        assert!(matches!(outcome, RouteOutcome::Failed { .. }));
        assert_eq!(planner.route(), Some(&short_route(1.5)));
    }

    #[test]
    fn test_superseded_response_is_discarded() {
        let mut planner = RoutePlanner::new();
        let old_seq = planner.begin(&target("Taco Town"));
        let new_seq = planner.begin(&target("Taco Town"));

        assert_eq!(planner.complete(old_seq, Ok(short_route(9.9))), RouteOutcome::Stale);
        assert_eq!(planner.route(), None);

        planner.complete(new_seq, Ok(short_route(1.5)));
        assert_eq!(planner.route(), Some(&short_route(1.5)));
    }

    #[test]
    fn test_reset_invalidates_pending_request() {
        let mut planner = RoutePlanner::new();
        let seq = planner.begin(&target("Taco Town"));

        planner.reset();

        assert_eq!(planner.complete(seq, Ok(short_route(1.5))), RouteOutcome::Stale);
        assert_eq!(planner.route(), None);
        assert_eq!(planner.target(), None);
    }

    #[test]
    fn test_retarget_drops_route_for_other_entity() {
        let mut planner = RoutePlanner::new();
        let seq = planner.begin(&target("Taco Town"));
        planner.complete(seq, Ok(short_route(1.5)));

        let other = GeoEntity::Safety {
            position: LatLng::new(37.7694, -122.4862).unwrap(),
            level: SafetyLevel::Medium,
        };
        assert!(planner.retarget(&other.key()));
        assert_eq!(planner.route(), None);
    }

    #[test]
    fn test_retarget_same_entity_keeps_route() {
        let mut planner = RoutePlanner::new();
        let seq = planner.begin(&target("Taco Town"));
        planner.complete(seq, Ok(short_route(1.5)));

        assert!(!planner.retarget(&target("Taco Town").key()));
        assert_eq!(planner.route(), Some(&short_route(1.5)));
    }

    #[test]
    fn test_retarget_without_target_is_noop() {
        let mut planner = RoutePlanner::new();
        assert!(!planner.retarget(&target("Anywhere").key()));
    }

    #[test]
    fn test_record_conversion_validates_steps() {
        let record = RouteRecord {
            distance: 2.5,
            time: 10.0,
            steps: vec![RouteStepRecord {
                name: "Depart".to_string(),
                lat: 99.0,
                lng: 0.0,
            }],
        };

        assert!(Route::try_from(record).is_err());
    }
}
