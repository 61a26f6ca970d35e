//! Search orchestration between the simulation thread and the worker pool.
//!
//! All merchant and trade-slot mutation happens here, on the thread that calls
//! [`Orchestrator::request_fill`], [`Orchestrator::record_use`] and
//! [`Orchestrator::tick`]. Workers only run read-only searches and hand their
//! results back through a channel drained once per tick.

use crate::error::{ApplyError, RuntimeError, RuntimeResult};
use crate::handoff::{channel, CompletionGuard, CompletionReceiver, CompletionSender};
use crate::host::{Deciphered, RewardSink, TradeUi};
use crate::job::{
    Completion, JobId, JobKind, JobOutcome, JobPhase, JobTarget, JobTicket, MerchantTarget, PhaseCell,
};
use crate::merchant::{Merchant, MerchantAccess};
use crate::pool::WorkerPool;
use cartography_config::{ConfigHandle, ConfigSnapshot};
use cartography_search::SearchBudgeter;
use cartography_types::slot::{DECIPHERING_LABEL, SEARCHING_LABEL};
use cartography_types::{
    HolderId, Position, RewardPayload, SearchRequest, SlotId, SlotUse, SpatialIndex, TradeSlot,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of [`Orchestrator::request_fill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRequest {
    /// A batch search was submitted for `count` rewards
    Submitted { job: JobId, count: u32 },
    /// The merchant already holds what its tier calls for
    NothingNeeded,
    /// A search for this merchant is already in flight
    Busy,
}

/// What one or more ticks did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub applied: Vec<JobId>,
    pub discarded: Vec<JobId>,
    /// Reward slots created by applied jobs
    pub rewards_added: usize,
    pub restocks_started: Vec<JobId>,
    /// Applied results whose customer session had changed
    pub stale_refreshes: usize,
    /// Decipher jobs that produced a map rather than crumbling
    pub maps_deciphered: usize,
}

impl TickReport {
    fn merge(&mut self, other: TickReport) {
        self.applied.extend(other.applied);
        self.discarded.extend(other.discarded);
        self.rewards_added += other.rewards_added;
        self.restocks_started.extend(other.restocks_started);
        self.stale_refreshes += other.stale_refreshes;
        self.maps_deciphered += other.maps_deciphered;
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.discarded.is_empty() && self.restocks_started.is_empty()
    }
}

/// Drives reward searches for a population of merchants.
pub struct Orchestrator {
    config: ConfigHandle,
    budgeter: Arc<SearchBudgeter>,
    pool: WorkerPool,
    tx: CompletionSender,
    rx: CompletionReceiver,
    jobs: HashMap<JobId, PhaseCell>,
}

impl Orchestrator {
    /// Start an orchestrator with the strategy and pool size of the current
    /// snapshot. Both are fixed for the orchestrator's lifetime.
    pub fn new(config: ConfigHandle, index: Arc<dyn SpatialIndex>) -> RuntimeResult<Self> {
        let strategy = config.current().tunables.search.strategy;
        let budgeter = SearchBudgeter::new(index).with_strategy(strategy);
        Self::with_budgeter(config, budgeter)
    }

    /// Start an orchestrator around a preconfigured budgeter.
    pub fn with_budgeter(config: ConfigHandle, budgeter: SearchBudgeter) -> RuntimeResult<Self> {
        let pool = WorkerPool::new(config.current().tunables.search.worker_threads)?;
        let (tx, rx) = channel();
        Ok(Self {
            config,
            budgeter: Arc::new(budgeter),
            pool,
            tx,
            rx,
            jobs: HashMap::new(),
        })
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// Jobs submitted and not yet applied or discarded.
    pub fn in_flight(&self) -> usize {
        self.jobs.len()
    }

    /// Phase of an in-flight job. Finished jobs are reported by `tick`.
    pub fn job_phase(&self, job: JobId) -> Option<JobPhase> {
        self.jobs.get(&job).map(PhaseCell::get)
    }

    /// The merchant spawned or reached a new tier and may need rewards.
    pub fn request_fill(&mut self, merchant: &mut Merchant) -> RuntimeResult<FillRequest> {
        let snapshot = self.config.current();
        let needed = merchant.rewards_needed(&snapshot.tunables);
        if needed == 0 {
            tracing::debug!(merchant_id = %merchant.id(), "Merchant needs no rewards");
            return Ok(FillRequest::NothingNeeded);
        }
        if !merchant.state.begin_search() {
            tracing::debug!(merchant_id = %merchant.id(), "Fill ignored, search already in flight");
            return Ok(FillRequest::Busy);
        }

        let placeholder = merchant.book.push_placeholder(SEARCHING_LABEL);
        let job = self.submit(merchant, placeholder, JobKind::Fill { count: needed as usize }, snapshot)?;
        Ok(FillRequest::Submitted { job, count: needed })
    }

    /// A customer used `slot`. An exhausted slot is restocked right away if
    /// the merchant is idle, otherwise on a later tick.
    pub fn record_use(&mut self, merchant: &mut Merchant, slot: SlotId) -> RuntimeResult<SlotUse> {
        let used = merchant.book.use_slot(slot)?;
        if used == SlotUse::Exhausted {
            tracing::debug!(merchant_id = %merchant.id(), slot_id = %slot, "Slot exhausted");
            if merchant.state.is_searching() {
                tracing::debug!(merchant_id = %merchant.id(), "Merchant busy, restock deferred");
            } else {
                self.start_restock(merchant, slot)?;
            }
        }
        Ok(used)
    }

    /// Apply finished jobs, then start restocks for idle merchants holding
    /// exhausted slots. Never blocks.
    pub fn tick(
        &mut self,
        merchants: &mut dyn MerchantAccess,
        ui: &mut dyn TradeUi,
        sink: &mut dyn RewardSink,
    ) -> TickReport {
        let mut report = TickReport::default();

        for completion in self.rx.drain() {
            self.finish(completion, merchants, ui, sink, &mut report);
        }

        if self.pool.is_running() {
            for id in merchants.merchant_ids() {
                let Some(merchant) = merchants.merchant_mut(&id) else {
                    continue;
                };
                if merchant.state.is_searching() {
                    continue;
                }
                let Some(slot) = merchant.book.first_exhausted() else {
                    continue;
                };
                match self.start_restock(merchant, slot) {
                    Ok(Some(job)) => report.restocks_started.push(job),
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(merchant_id = %id, error = %err, "Failed to start restock");
                    }
                }
            }
        }

        report
    }

    /// Tick until no job is in flight or `timeout` elapses.
    pub fn tick_until_idle(
        &mut self,
        merchants: &mut dyn MerchantAccess,
        ui: &mut dyn TradeUi,
        sink: &mut dyn RewardSink,
        timeout: Duration,
    ) -> TickReport {
        let deadline = Instant::now() + timeout;
        let mut report = TickReport::default();
        loop {
            report.merge(self.tick(merchants, ui, sink));
            if self.jobs.is_empty() || Instant::now() >= deadline {
                return report;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    /// A holder used an unidentified map at `origin`.
    ///
    /// The map is consumed and a stand-in handed out right away; a wide search
    /// with no exclusions then runs in the background and its result is
    /// delivered on a later tick. Returns `None` if the holder had no map.
    pub fn decipher(
        &mut self,
        holder: HolderId,
        origin: Position,
        sink: &mut dyn RewardSink,
    ) -> RuntimeResult<Option<JobId>> {
        if !self.pool.is_running() {
            return Err(RuntimeError::PoolShutDown);
        }
        if !sink.take_unidentified(holder) {
            tracing::debug!(holder_id = %holder, "Nothing to decipher");
            return Ok(None);
        }
        sink.give_placeholder(holder, DECIPHERING_LABEL);

        let snapshot = self.config.current();
        let request = SearchRequest::new(
            origin,
            snapshot.tunables.decipher.search_radius,
            snapshot.tunables.search.sample_size,
            snapshot.tunables.search.time_budget,
        );
        let ticket = JobTicket {
            id: JobId::generate(),
            kind: JobKind::Decipher,
            target: JobTarget::Holder(holder),
            snapshot,
        };

        match self.dispatch(ticket, request) {
            Ok(job_id) => {
                tracing::info!(job_id = %job_id, holder_id = %holder, "Decipher submitted");
                Ok(Some(job_id))
            }
            Err(err) => {
                sink.deliver(holder, Deciphered::Crumbled);
                sink.remove_placeholder(holder, DECIPHERING_LABEL);
                tracing::warn!(holder_id = %holder, error = %err, "Decipher not submitted");
                Err(err)
            }
        }
    }

    /// Stop the worker pool and drop every job still in flight.
    ///
    /// Returns how many were dropped. Later requests fail with
    /// [`RuntimeError::PoolShutDown`].
    pub fn shutdown(&mut self, timeout: Duration) -> usize {
        self.pool.shutdown(timeout);
        let dropped = self.jobs.len();
        for (_, phase) in self.jobs.drain() {
            phase.set(JobPhase::Discarded);
        }
        tracing::info!(dropped, "Orchestrator shut down");
        dropped
    }

    fn start_restock(&mut self, merchant: &mut Merchant, slot: SlotId) -> RuntimeResult<Option<JobId>> {
        if !merchant.state.begin_search() {
            return Ok(None);
        }
        if let Err(err) = merchant.book.begin_restock(slot) {
            merchant.state.finish_search();
            return Err(err.into());
        }
        let snapshot = self.config.current();
        self.submit(merchant, slot, JobKind::Restock, snapshot).map(Some)
    }

    /// Hand a merchant search to the pool. The caller has already claimed
    /// the merchant's search flag and installed `placeholder`; both are
    /// released here if the pool refuses the job.
    fn submit(
        &mut self,
        merchant: &mut Merchant,
        placeholder: SlotId,
        kind: JobKind,
        snapshot: Arc<ConfigSnapshot>,
    ) -> RuntimeResult<JobId> {
        let tunables = &snapshot.tunables;
        let request = SearchRequest::new(
            merchant.position(),
            tunables.radius_for(merchant.kind()),
            tunables.search.sample_size,
            tunables.search.time_budget,
        )
        .excluding(merchant.state.offered_categories().iter().cloned());

        let ticket = JobTicket {
            id: JobId::generate(),
            kind,
            target: JobTarget::Merchant(MerchantTarget {
                merchant: merchant.id(),
                merchant_kind: merchant.kind(),
                placeholder,
                session: merchant.session(),
            }),
            snapshot: Arc::clone(&snapshot),
        };

        match self.dispatch(ticket, request) {
            Ok(job_id) => {
                tracing::info!(
                    job_id = %job_id,
                    merchant_id = %merchant.id(),
                    kind = ?kind,
                    generation = snapshot.generation,
                    "Search submitted"
                );
                Ok(job_id)
            }
            Err(err) => {
                merchant.book.remove(placeholder);
                merchant.state.finish_search();
                tracing::warn!(merchant_id = %merchant.id(), error = %err, "Search not submitted");
                Err(err)
            }
        }
    }

    fn dispatch(&mut self, ticket: JobTicket, request: SearchRequest) -> RuntimeResult<JobId> {
        let job_id = ticket.id;
        let count = ticket.kind.count();
        let snapshot = Arc::clone(&ticket.snapshot);
        let phase = PhaseCell::new();
        let guard = CompletionGuard::new(ticket, phase.clone(), self.tx.clone());
        let budgeter = Arc::clone(&self.budgeter);
        let worker_phase = phase.clone();

        self.pool.submit(move || {
            worker_phase.set(JobPhase::Running);
            let results = budgeter.search_batch(&request, &snapshot.catalog, count);
            guard.complete(JobOutcome::Found(results));
        })?;

        self.jobs.insert(job_id, phase);
        Ok(job_id)
    }

    fn finish(
        &mut self,
        completion: Completion,
        merchants: &mut dyn MerchantAccess,
        ui: &mut dyn TradeUi,
        sink: &mut dyn RewardSink,
        report: &mut TickReport,
    ) {
        let job_id = completion.ticket.id;
        let Some(phase) = self.jobs.remove(&job_id) else {
            tracing::debug!(job_id = %job_id, "Completion for unknown job, ignoring");
            return;
        };

        match completion.ticket.target {
            JobTarget::Merchant(target) => {
                finish_merchant(target, &completion, &phase, merchants, ui, report)
            }
            JobTarget::Holder(holder) => finish_decipher(holder, &completion, &phase, sink, report),
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("pool", &self.pool)
            .field("in_flight", &self.jobs.len())
            .finish()
    }
}

fn finish_merchant(
    target: MerchantTarget,
    completion: &Completion,
    phase: &PhaseCell,
    merchants: &mut dyn MerchantAccess,
    ui: &mut dyn TradeUi,
    report: &mut TickReport,
) {
    let job_id = completion.ticket.id;
    let merchant_id = target.merchant;
    let Some(merchant) = merchants.merchant_mut(&merchant_id) else {
        phase.set(JobPhase::Discarded);
        report.discarded.push(job_id);
        let err = ApplyError::MerchantGone(merchant_id);
        tracing::info!(job_id = %job_id, error = %err, "Result discarded");
        return;
    };

    let applied = apply_completion(merchant, &target, completion);
    merchant.state.finish_search();

    match applied {
        Ok(added) => {
            phase.set(JobPhase::Applied);
            report.applied.push(job_id);
            report.rewards_added += added;
        }
        Err(err) => {
            if merchant.book.is_pending(target.placeholder) {
                merchant.book.remove(target.placeholder);
            }
            phase.set(JobPhase::Discarded);
            report.discarded.push(job_id);
            tracing::warn!(job_id = %job_id, merchant_id = %merchant_id, error = %err, "Result discarded");
        }
    }

    match (target.session, merchant.session()) {
        (Some(submitted), Some(current)) if submitted == current => {
            ui.refresh(merchant_id, current, merchant.book().slots());
        }
        (Some(_), _) => {
            report.stale_refreshes += 1;
            tracing::debug!(merchant_id = %merchant_id, "Customer session changed, skipping refresh");
        }
        (None, _) => {}
    }
}

/// Hand the holder a map, or the crumbled fallback, then take back the
/// stand-in. A failed worker still crumbles the map.
fn finish_decipher(
    holder: HolderId,
    completion: &Completion,
    phase: &PhaseCell,
    sink: &mut dyn RewardSink,
    report: &mut TickReport,
) {
    let job_id = completion.ticket.id;
    let result = match &completion.outcome {
        JobOutcome::Found(results) => {
            phase.set(JobPhase::Applied);
            report.applied.push(job_id);
            match results.first() {
                Some(found) => {
                    report.maps_deciphered += 1;
                    Deciphered::Map(RewardPayload::from_result(found))
                }
                None => Deciphered::Crumbled,
            }
        }
        JobOutcome::Failed(reason) => {
            phase.set(JobPhase::Discarded);
            report.discarded.push(job_id);
            let err = ApplyError::WorkerFailed(reason.clone());
            tracing::warn!(job_id = %job_id, holder_id = %holder, error = %err, "Decipher failed");
            Deciphered::Crumbled
        }
    };

    tracing::info!(
        job_id = %job_id,
        holder_id = %holder,
        found = matches!(result, Deciphered::Map(_)),
        "Decipher delivered"
    );
    sink.deliver(holder, result);
    sink.remove_placeholder(holder, DECIPHERING_LABEL);
}

/// Swap a job's placeholder for the rewards it found.
fn apply_completion(
    merchant: &mut Merchant,
    target: &MerchantTarget,
    completion: &Completion,
) -> Result<usize, ApplyError> {
    let ticket = &completion.ticket;
    let results = match &completion.outcome {
        JobOutcome::Found(results) => results,
        JobOutcome::Failed(reason) => return Err(ApplyError::WorkerFailed(reason.clone())),
    };
    if !merchant.book.is_pending(target.placeholder) {
        return Err(ApplyError::PlaceholderMissing {
            merchant: target.merchant,
            slot: target.placeholder,
        });
    }

    let max_uses = ticket.snapshot.tunables.max_uses_for(target.merchant_kind);
    let mut rewards = Vec::with_capacity(results.len());
    for result in results {
        if !merchant.state.record_offer(result.category_id.clone()) {
            tracing::debug!(category = %result.category_id, "Category already offered, skipping");
            continue;
        }
        let cost = ticket.snapshot.cost_for(&result.category_id).clone();
        rewards.push(TradeSlot::reward(cost, RewardPayload::from_result(result), max_uses));
    }

    let added = rewards.len();
    merchant.book.resolve(target.placeholder, rewards);
    if matches!(ticket.kind, JobKind::Fill { .. }) && added > 0 {
        merchant.state.record_tier(target.merchant_kind.tier());
    }

    tracing::info!(
        job_id = %ticket.id,
        merchant_id = %target.merchant,
        added,
        kind = ?ticket.kind,
        "Search result applied"
    );
    Ok(added)
}
