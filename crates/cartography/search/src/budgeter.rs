//! Budgeted sampling search.
//!
//! A single [`SpatialIndex::locate`] call may be expensive and cannot be
//! interrupted, so the budgeter bounds the number of calls and checks the
//! wall-time budget between them. Candidates are shuffled so repeated searches
//! around the same origin do not always favor the same categories.

use crate::clock::{Clock, SystemClock};
use cartography_config::RewardCatalog;
use cartography_types::{
    SearchReport, SearchRequest, SearchResult, SearchStrategy, SpatialIndex, StopReason,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Runs budgeted searches against a spatial index.
///
/// Stateless between calls apart from the shuffle seed sequence; safe to share
/// across worker threads.
pub struct SearchBudgeter {
    index: Arc<dyn SpatialIndex>,
    clock: Arc<dyn Clock>,
    strategy: SearchStrategy,
    seed: Option<u64>,
    searches: AtomicU64,
}

impl SearchBudgeter {
    pub fn new(index: Arc<dyn SpatialIndex>) -> Self {
        Self {
            index,
            clock: Arc::new(SystemClock),
            strategy: SearchStrategy::default(),
            seed: None,
            searches: AtomicU64::new(0),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Make candidate order reproducible. Each search still gets its own
    /// order, derived from the seed and the search count.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }

    fn rng(&self) -> StdRng {
        let n = self.searches.fetch_add(1, Ordering::Relaxed);
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(n)),
            None => StdRng::from_entropy(),
        }
    }

    /// Find one POI of an eligible, non-excluded category.
    ///
    /// Probe failures are logged and count against the sample budget; they
    /// never abort the search.
    pub fn search(&self, request: &SearchRequest, catalog: &RewardCatalog) -> SearchReport {
        let start = self.clock.now();
        let mut candidates = catalog.eligible(&request.excluded_categories);
        if candidates.is_empty() {
            tracing::debug!(
                excluded = request.excluded_categories.len(),
                "No eligible categories, skipping search"
            );
            return SearchReport::no_candidates();
        }
        candidates.shuffle(&mut self.rng());

        let mut probes = 0usize;
        let mut failed_probes = 0usize;
        let mut nearest: Option<(i64, SearchResult)> = None;
        let mut stop_reason = StopReason::CandidatesExhausted;

        for category in &candidates {
            if probes >= request.sample_size {
                stop_reason = StopReason::SampleBudget;
                break;
            }
            if self.clock.now().saturating_duration_since(start) >= request.time_budget {
                stop_reason = StopReason::TimeBudget;
                break;
            }

            probes += 1;
            let hit = match self
                .index
                .locate(std::slice::from_ref(category), request.origin, request.radius)
            {
                Ok(hit) => hit,
                Err(err) => {
                    failed_probes += 1;
                    tracing::warn!(category = %category, error = %err, "Probe failed, skipping category");
                    continue;
                }
            };

            let Some(hit) = hit else { continue };
            if request.excluded_categories.contains(&hit.category_id) {
                tracing::debug!(category = %hit.category_id, "Index returned excluded category, ignoring");
                continue;
            }

            match self.strategy {
                SearchStrategy::FirstMatch => {
                    nearest = Some((0, hit));
                    stop_reason = StopReason::Found;
                    break;
                }
                SearchStrategy::NearestOfSample => {
                    let distance = hit.position.horizontal_distance_sq(&request.origin);
                    if nearest.as_ref().map_or(true, |(best, _)| distance < *best) {
                        nearest = Some((distance, hit));
                    }
                }
            }
        }

        let result = nearest.map(|(_, hit)| hit);
        if result.is_some() {
            stop_reason = StopReason::Found;
        }
        let elapsed = self.clock.now().saturating_duration_since(start);

        tracing::debug!(
            probes,
            failed_probes,
            candidates = candidates.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            stop_reason = ?stop_reason,
            found = ?result.as_ref().map(|r| r.category_id.as_str()),
            "Search finished"
        );

        SearchReport {
            result,
            probes,
            failed_probes,
            elapsed,
            stop_reason,
        }
    }

    /// Up to `count` results with pairwise distinct categories.
    ///
    /// Each found category joins the exclusion set of the following searches.
    /// Stops at the first search that finds nothing, so a batch never spends
    /// more than `count` searches. `count` is capped at the number of eligible
    /// categories, the most a batch could ever return.
    pub fn search_batch(
        &self,
        request: &SearchRequest,
        catalog: &RewardCatalog,
        count: usize,
    ) -> Vec<SearchResult> {
        let eligible = catalog.eligible(&request.excluded_categories).len();
        let wanted = count.min(eligible);
        if wanted < count {
            tracing::debug!(requested = count, eligible, "Batch capped at eligible categories");
        }
        let mut request = request.clone();
        let mut results = Vec::with_capacity(wanted);

        for _ in 0..wanted {
            let report = self.search(&request, catalog);
            let Some(result) = report.result else {
                tracing::debug!(
                    found = results.len(),
                    wanted,
                    stop_reason = ?report.stop_reason,
                    "Batch search ended early"
                );
                break;
            };
            request.excluded_categories.insert(result.category_id.clone());
            results.push(result);
        }

        results
    }
}

impl std::fmt::Debug for SearchBudgeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchBudgeter")
            .field("strategy", &self.strategy)
            .field("seed", &self.seed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use cartography_types::{CategoryId, Position, ProbeError, SearchRadius};
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn cat(raw: &str) -> CategoryId {
        CategoryId::parse(raw).unwrap()
    }

    #[derive(Default)]
    struct ScriptedIndex {
        hits: BTreeMap<CategoryId, Position>,
        failing: BTreeSet<CategoryId>,
        calls: AtomicUsize,
        clock: Option<(Arc<ManualClock>, Duration)>,
    }

    impl SpatialIndex for ScriptedIndex {
        fn locate(
            &self,
            categories: &[CategoryId],
            _origin: Position,
            _radius: SearchRadius,
        ) -> Result<Option<SearchResult>, ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some((clock, step)) = &self.clock {
                clock.advance(*step);
            }
            let category = &categories[0];
            if self.failing.contains(category) {
                return Err(ProbeError::new(category.clone(), "index unavailable"));
            }
            Ok(self
                .hits
                .get(category)
                .map(|pos| SearchResult::new(*pos, category.clone())))
        }
    }

    fn request(sample_size: usize) -> SearchRequest {
        SearchRequest::new(
            Position::new(0, 64, 0),
            SearchRadius(2500),
            sample_size,
            Duration::from_secs(60),
        )
    }

    fn catalog(names: &[&str]) -> RewardCatalog {
        RewardCatalog::from_categories(names.iter().map(|n| cat(n)))
    }

    #[test]
    fn empty_candidates_spend_no_probes() {
        let index = Arc::new(ScriptedIndex::default());
        let budgeter = SearchBudgeter::new(index.clone());
        let req = request(40).excluding([cat("zone:a")]);

        let report = budgeter.search(&req, &catalog(&["zone:a"]));

        assert_eq!(report.stop_reason, StopReason::NoCandidates);
        assert_eq!(report.probes, 0);
        assert_eq!(index.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sample_budget_caps_probes() {
        let index = Arc::new(ScriptedIndex::default());
        let budgeter = SearchBudgeter::new(index.clone()).with_seed(7);
        let names: Vec<String> = (0..20).map(|i| format!("zone:c{i}")).collect();
        let catalog = RewardCatalog::from_categories(names.iter().map(|n| cat(n)));

        let report = budgeter.search(&request(5), &catalog);

        assert_eq!(report.probes, 5);
        assert_eq!(report.stop_reason, StopReason::SampleBudget);
        assert_eq!(index.calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn time_budget_stops_between_probes() {
        let clock = Arc::new(ManualClock::new());
        let index = Arc::new(ScriptedIndex {
            clock: Some((clock.clone(), Duration::from_millis(30))),
            ..Default::default()
        });
        let budgeter = SearchBudgeter::new(index.clone()).with_clock(clock.clone());
        let mut req = request(40);
        req.time_budget = Duration::from_millis(50);

        let report = budgeter.search(&req, &catalog(&["zone:a", "zone:b", "zone:c", "zone:d"]));

        // 0ms: probe, 30ms: probe, 60ms: over budget.
        assert_eq!(report.probes, 2);
        assert_eq!(report.stop_reason, StopReason::TimeBudget);
        assert!(report.result.is_none());
        assert_eq!(report.elapsed, Duration::from_millis(60));
    }

    #[test]
    fn time_budget_wins_over_larger_sample_budget() {
        let clock = Arc::new(ManualClock::new());
        let index = Arc::new(ScriptedIndex {
            clock: Some((clock.clone(), Duration::from_millis(40))),
            ..Default::default()
        });
        let budgeter = SearchBudgeter::new(index.clone())
            .with_clock(clock.clone())
            .with_seed(5);
        let mut req = request(5);
        req.time_budget = Duration::from_millis(80);
        let names: Vec<String> = (0..8).map(|i| format!("zone:c{i}")).collect();
        let catalog = RewardCatalog::from_categories(names.iter().map(|n| cat(n)));

        let report = budgeter.search(&req, &catalog);

        // 0ms: probe, 40ms: probe, 80ms: budget spent before the third.
        assert_eq!(report.probes, 2);
        assert_eq!(index.calls.load(Ordering::SeqCst), 2);
        assert_eq!(report.stop_reason, StopReason::TimeBudget);
        assert!(report.result.is_none());
    }

    #[test]
    fn failing_probe_is_skipped() {
        let index = Arc::new(ScriptedIndex {
            hits: [(cat("zone:good"), Position::new(100, 64, 0))].into_iter().collect(),
            failing: [cat("zone:bad")].into_iter().collect(),
            ..Default::default()
        });
        let budgeter = SearchBudgeter::new(index.clone());

        for seed in 0..8 {
            let budgeter = SearchBudgeter::new(index.clone()).with_seed(seed);
            let report = budgeter.search(&request(40), &catalog(&["zone:bad", "zone:good"]));
            assert_eq!(report.result.unwrap().category_id, cat("zone:good"));
            assert_eq!(report.probes, 1 + report.failed_probes);
        }
        assert_eq!(budgeter.strategy(), SearchStrategy::FirstMatch);
    }

    #[test]
    fn nearest_of_sample_picks_closest_hit() {
        let index = Arc::new(ScriptedIndex {
            hits: [
                (cat("zone:far"), Position::new(2000, 64, 0)),
                (cat("zone:near"), Position::new(10, 64, 10)),
                (cat("zone:mid"), Position::new(500, 64, -500)),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        });
        let budgeter = SearchBudgeter::new(index.clone())
            .with_strategy(SearchStrategy::NearestOfSample)
            .with_seed(3);

        let report = budgeter.search(&request(40), &catalog(&["zone:far", "zone:near", "zone:mid"]));

        assert_eq!(report.result.unwrap().category_id, cat("zone:near"));
        assert_eq!(report.probes, 3);
        assert_eq!(report.stop_reason, StopReason::Found);
    }

    #[test]
    fn batch_returns_distinct_categories_and_stops_early() {
        let index = Arc::new(ScriptedIndex {
            hits: [
                (cat("zone:a"), Position::new(1, 64, 1)),
                (cat("zone:b"), Position::new(2, 64, 2)),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        });
        let budgeter = SearchBudgeter::new(index.clone()).with_seed(11);
        let catalog = catalog(&["zone:a", "zone:b", "zone:c"]);

        let results = budgeter.search_batch(&request(40), &catalog, 5);

        let categories: BTreeSet<_> = results.iter().map(|r| r.category_id.clone()).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(categories.len(), 2);
        assert!(!categories.contains(&cat("zone:c")));
    }

    #[test]
    fn huge_batch_is_capped_at_eligible_categories() {
        let index = Arc::new(ScriptedIndex {
            hits: [
                (cat("zone:a"), Position::new(1, 64, 1)),
                (cat("zone:b"), Position::new(2, 64, 2)),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        });
        let budgeter = SearchBudgeter::new(index.clone()).with_seed(2);
        let req = request(40).excluding([cat("zone:c")]);

        let results = budgeter.search_batch(&req, &catalog(&["zone:a", "zone:b", "zone:c"]), 4_000_000_000);

        assert_eq!(results.len(), 2);
        // Two searches hit, then the cap ends the batch without a third.
        assert_eq!(index.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn ruins_scenario_excludes_offered() {
        let index = Arc::new(ScriptedIndex {
            hits: [
                (cat("zone:ruins"), Position::new(300, 70, 40)),
                (cat("zone:tower"), Position::new(50, 70, 40)),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        });
        let budgeter = SearchBudgeter::new(index);
        let req = request(40).excluding([cat("zone:tower")]);

        let report = budgeter.search(&req, &catalog(&["zone:ruins", "zone:tower"]));

        assert_eq!(
            report.result,
            Some(SearchResult::new(Position::new(300, 70, 40), cat("zone:ruins")))
        );
    }
}
