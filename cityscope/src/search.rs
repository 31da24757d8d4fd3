//! Search session state machine.
//!
//! Searches run concurrently with everything else, so every submission gets
//! a monotonically increasing sequence number and only the most recently
//! submitted query may complete the session. Responses bearing an older
//! sequence are discarded without touching state, which makes overlapping
//! searches safe: the last one submitted wins regardless of arrival order.

use crate::provider::types::{ProviderError, RecordError, SearchRecord};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

/// Sequence number tying a search response to its submission.
pub type SearchSeq = u64;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ====== Hits ======

/// One presentable search result.
///
/// Hits carry no map position; they live in the results list only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SearchHit {
    Restaurant {
        name: String,
        description: String,
        price: String,
    },
    Event {
        name: String,
        description: String,
        date: NaiveDate,
    },
    Info {
        message: String,
    },
}

impl TryFrom<SearchRecord> for SearchHit {
    type Error = RecordError;

    fn try_from(record: SearchRecord) -> Result<Self, Self::Error> {
        match record {
            SearchRecord::Restaurant {
                name,
                description,
                price,
            } => Ok(SearchHit::Restaurant {
                name,
                description,
                price,
            }),
            SearchRecord::Event {
                name,
                description,
                date,
            } => {
                let parsed = NaiveDate::parse_from_str(&date, DATE_FORMAT)
                    .map_err(|_| RecordError::Date { value: date })?;
                Ok(SearchHit::Event {
                    name,
                    description,
                    date: parsed,
                })
            }
            SearchRecord::Info { description } => Ok(SearchHit::Info {
                message: description,
            }),
        }
    }
}

// ====== Session ======

/// Where the session currently stands.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SearchState {
    #[default]
    Idle,
    Loading {
        query: String,
    },
    Success {
        query: String,
        hits: Vec<SearchHit>,
    },
    Error {
        query: String,
        message: String,
    },
}

/// What a completion attempt amounted to.
#[derive(Debug, PartialEq)]
pub enum SearchOutcome {
    /// The session moved to `Success` with this many hits.
    Success { hits: usize },
    /// The session moved to `Error`.
    Failed { message: String },
    /// The response was superseded and discarded; state is untouched.
    Stale,
}

/// Tracks the active search and arbitrates competing responses.
#[derive(Debug, Default)]
pub struct SearchSession {
    state: SearchState,
    last_hits: Vec<SearchHit>,
    current_seq: SearchSeq,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new search, superseding any in-flight one.
    ///
    /// Returns the sequence number the eventual response must present.
    pub fn begin(&mut self, query: &str) -> SearchSeq {
        self.current_seq += 1;
        self.state = SearchState::Loading {
            query: query.to_string(),
        };
        self.current_seq
    }

    /// Applies a search response.
    ///
    /// Only the response for the most recent `begin` is accepted; anything
    /// else is reported `Stale` and ignored.
    pub fn complete(
        &mut self,
        seq: SearchSeq,
        result: Result<Vec<SearchHit>, ProviderError>,
    ) -> SearchOutcome {
        if seq != self.current_seq {
            debug!(seq, current = self.current_seq, "Discarded stale search response");
            return SearchOutcome::Stale;
        }
        let SearchState::Loading { query } = &self.state else {
            debug!(seq, "Discarded search response for a session not loading");
            return SearchOutcome::Stale;
        };
        let query = query.clone();

        match result {
            Ok(hits) => {
                let count = hits.len();
                self.last_hits = hits.clone();
                self.state = SearchState::Success { query, hits };
                SearchOutcome::Success { hits: count }
            }
            Err(err) => {
                let message = err.to_string();
                self.state = SearchState::Error {
                    query,
                    message: message.clone(),
                };
                SearchOutcome::Failed { message }
            }
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SearchState::Loading { .. })
    }

    /// Hits from the most recent successful search, surviving later
    /// failures until the next success replaces them.
    pub fn last_hits(&self) -> &[SearchHit] {
        &self.last_hits
    }
}
