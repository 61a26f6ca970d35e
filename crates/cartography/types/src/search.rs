//! Search requests and their outcomes.

use crate::ids::CategoryId;
use crate::world::{Position, SearchRadius};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Parameters of one budgeted search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Where the search is centered
    pub origin: Position,
    /// Categories that must not be returned
    pub excluded_categories: BTreeSet<CategoryId>,
    /// Maximum distance passed to every probe
    pub radius: SearchRadius,
    /// Maximum number of probes
    pub sample_size: usize,
    /// Maximum wall time, checked between probes
    pub time_budget: Duration,
}

impl SearchRequest {
    /// Create a request with no exclusions.
    pub fn new(
        origin: Position,
        radius: SearchRadius,
        sample_size: usize,
        time_budget: Duration,
    ) -> Self {
        Self {
            origin,
            excluded_categories: BTreeSet::new(),
            radius,
            sample_size,
            time_budget,
        }
    }

    /// Replace the exclusion set.
    pub fn excluding(mut self, excluded: impl IntoIterator<Item = CategoryId>) -> Self {
        self.excluded_categories = excluded.into_iter().collect();
        self
    }
}

/// A located POI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchResult {
    /// Where the POI starts
    pub position: Position,
    /// Which category it belongs to
    pub category_id: CategoryId,
}

impl SearchResult {
    /// Create a new result.
    pub fn new(position: Position, category_id: CategoryId) -> Self {
        Self {
            position,
            category_id,
        }
    }
}

/// How a search picks among hits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchStrategy {
    /// Return the first hit (lowest latency)
    #[default]
    FirstMatch,
    /// Probe the whole budgeted sample and return the hit closest to the origin
    NearestOfSample,
}

impl SearchStrategy {
    /// Parse the config spelling (`first` or `nearest`).
    pub fn from_config(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "first" | "first_match" => Some(SearchStrategy::FirstMatch),
            "nearest" | "nearest_of_sample" => Some(SearchStrategy::NearestOfSample),
            _ => None,
        }
    }
}

/// Why a search loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopReason {
    /// A POI was found
    Found,
    /// The whitelist minus exclusions was empty; no probe was spent
    NoCandidates,
    /// Every candidate was probed without a hit
    CandidatesExhausted,
    /// The probe budget ran out
    SampleBudget,
    /// The time budget ran out
    TimeBudget,
}

impl StopReason {
    /// Whether the loop was cut short by a budget.
    pub fn is_budget(&self) -> bool {
        matches!(self, StopReason::SampleBudget | StopReason::TimeBudget)
    }
}

/// The observable outcome of one search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    /// What was found, if anything
    pub result: Option<SearchResult>,
    /// Probes spent, including failed ones
    pub probes: usize,
    /// Probes that returned an error
    pub failed_probes: usize,
    /// Wall time spent in the loop
    pub elapsed: Duration,
    /// Why the loop stopped
    pub stop_reason: StopReason,
}

impl SearchReport {
    /// A report for a search that had nothing to probe.
    pub fn no_candidates() -> Self {
        Self {
            result: None,
            probes: 0,
            failed_probes: 0,
            elapsed: Duration::ZERO,
            stop_reason: StopReason::NoCandidates,
        }
    }

    /// Whether a POI was found.
    pub fn found(&self) -> bool {
        self.result.is_some()
    }
}
