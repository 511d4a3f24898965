//! The iteration context.
//!
//! One [`IterationContext`] exists per top-level evaluation. It is passed by
//! `&mut` into the computation body and through every engine call, replacing
//! any process- or thread-global state: two evaluations on two threads each
//! own their context and never share it. The type is neither `Send` nor
//! `Sync`.
//!
//! The context holds
//! - the round number, schedule step and working precision of the active
//!   round,
//! - the pending-restart flag and an optional precision target for the next
//!   round,
//! - the precision policy and the single-valued nesting depth,
//! - the cache registry together with per-round site occurrence counters,
//! - counters reported back to the caller.
//!
//! # Scoped switches
//!
//! `stiff`, `at_step`, `relaxed`, `single_valued` and `with_policy` run a
//! closure with modified settings and restore the previous settings when the
//! closure returns, whatever it returns.

use crate::cache::{CacheRegistry, SiteKey, SlotId};
use crate::config::EngineConfig;
use crate::precision::{Precision, PrecisionPolicy};
use crate::schedule::PrecisionSchedule;
use crate::signal::{Flow, Interrupt, Restart};
use crate::stats::EvalStats;
use rustc_hash::FxHashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Mutable state of one top-level evaluation.
pub struct IterationContext {
    schedule: Arc<PrecisionSchedule>,
    iteration: u32,
    step: usize,
    working: Precision,
    base_policy: PrecisionPolicy,
    policy: PrecisionPolicy,
    restart_pending: bool,
    target: Option<Precision>,
    single_valued: u32,
    thread: ThreadId,
    registry: CacheRegistry,
    occurrences: FxHashMap<SiteKey, u32>,
    stats: EvalStats,
    _not_send: PhantomData<*const ()>,
}

impl IterationContext {
    /// A context positioned at the configured start step, round 0.
    ///
    /// The driver creates one per evaluation; tests and hosts that want to
    /// run a single round by hand can use this directly.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_schedule(Arc::new(config.schedule()), config.start_step, config.policy)
    }

    pub(crate) fn with_schedule(
        schedule: Arc<PrecisionSchedule>,
        start_step: usize,
        policy: PrecisionPolicy,
    ) -> Self {
        let step = schedule.clamp_step(start_step);
        let working = schedule.precision(step);
        IterationContext {
            schedule,
            iteration: 0,
            step,
            working,
            base_policy: policy,
            policy,
            restart_pending: false,
            target: None,
            single_valued: 0,
            thread: thread::current().id(),
            registry: CacheRegistry::new(),
            occurrences: FxHashMap::default(),
            stats: EvalStats::default(),
            _not_send: PhantomData,
        }
    }

    // Round lifecycle

    /// Position the context at the start of round `iteration` on `step`.
    pub(crate) fn begin_round(&mut self, iteration: u32, step: usize) {
        debug_assert_eq!(thread::current().id(), self.thread);
        self.iteration = iteration;
        self.set_step(step);
        self.policy = self.base_policy;
        self.restart_pending = false;
        self.target = None;
        self.single_valued = 0;
        self.occurrences.clear();
        self.stats.rounds += 1;
        self.stats.final_step = self.step;
        self.stats.final_precision = self.working;
    }

    /// Account for a round that ended in a restart.
    pub(crate) fn end_restarted_round(&mut self) {
        self.stats.restarts += 1;
    }

    /// Drop the registry and hand back the counters.
    pub(crate) fn finish(&mut self) -> EvalStats {
        let mut stats = self.stats;
        stats.cache = self.registry.stats();
        self.registry.reset();
        stats
    }

    // Accessors

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Precision requested for the active round (or local scope).
    pub fn working_precision(&self) -> Precision {
        self.working
    }

    pub fn policy(&self) -> PrecisionPolicy {
        self.policy
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread
    }

    pub fn schedule(&self) -> &PrecisionSchedule {
        &self.schedule
    }

    /// Whether cache use is currently disabled (inside a limit operator).
    pub fn is_single_valued(&self) -> bool {
        self.single_valued > 0
    }

    pub fn restart_pending(&self) -> bool {
        self.restart_pending
    }

    /// Precision the next round should reach, if someone asked for one.
    pub fn precision_target(&self) -> Option<Precision> {
        self.target
    }

    pub fn registry(&self) -> &CacheRegistry {
        &self.registry
    }

    pub fn stats(&self) -> EvalStats {
        let mut stats = self.stats;
        stats.cache = self.registry.stats();
        stats
    }

    /// Precision intermediate results of magnitude about `2^magnitude`
    /// should be rounded to under the active policy. `None` stands for an
    /// exactly-zero magnitude.
    ///
    /// Under [`PrecisionPolicy::Relative`] values above one keep a fixed
    /// number of significant bits; smaller values keep the absolute working
    /// precision.
    pub fn rounding_precision(&self, magnitude: Option<i32>) -> Precision {
        match (self.policy, magnitude) {
            (PrecisionPolicy::Relative, Some(m)) if m > 0 => self.working.offset(m),
            _ => self.working,
        }
    }

    // Restart protocol

    /// Flag the round for restart and produce the interrupt to return.
    ///
    /// ```text
    /// if !certain {
    ///     return Err(ctx.restart());
    /// }
    /// ```
    #[must_use]
    pub fn restart(&mut self) -> Interrupt {
        self.restart_pending = true;
        Interrupt::Restart(Restart)
    }

    /// Like [`restart`](Self::restart), also asking the next round to reach
    /// at least `target`.
    #[must_use]
    pub fn restart_toward(&mut self, target: Precision) -> Interrupt {
        self.target = Some(match self.target {
            Some(t) => t.finer(target),
            None => target,
        });
        self.restart()
    }

    /// Forget a restart that was absorbed by a limit operator.
    pub(crate) fn absorb_restart(&mut self) {
        self.restart_pending = false;
        self.target = None;
        self.stats.local_restarts += 1;
    }

    pub(crate) fn note_undecided(&mut self) {
        self.stats.undecided += 1;
    }

    // Caching

    /// Slot for the next occurrence of `site` in this round, or `None`
    /// inside a single-valued scope.
    pub fn slot<T: 'static>(&mut self, site: SiteKey) -> Option<SlotId<T>> {
        if self.is_single_valued() {
            return None;
        }
        let counter = self.occurrences.entry(site).or_insert(0);
        let occurrence = *counter;
        *counter += 1;
        Some(self.registry.slot(site, occurrence))
    }

    /// Memoize `compute` at the caller's site for precision `precision`.
    ///
    /// A value stored in an earlier round of this evaluation is reused when
    /// it was computed at `precision` or finer. Inside a single-valued scope
    /// `compute` always runs.
    #[track_caller]
    pub fn memo<T, F>(&mut self, precision: Precision, compute: F) -> Flow<T>
    where
        T: Clone + 'static,
        F: FnOnce(&mut Self) -> Flow<T>,
    {
        self.memoize(SiteKey::caller(), precision, precision, compute)
    }

    /// [`memo`](Self::memo) with an explicit site.
    pub fn memo_at<T, F>(&mut self, site: SiteKey, precision: Precision, compute: F) -> Flow<T>
    where
        T: Clone + 'static,
        F: FnOnce(&mut Self) -> Flow<T>,
    {
        self.memoize(site, precision, precision, compute)
    }

    /// Look up `site` at `request`; on a miss run `compute` and record the
    /// value as accurate to `recorded`.
    pub(crate) fn memoize<T, F>(
        &mut self,
        site: SiteKey,
        request: Precision,
        recorded: Precision,
        compute: F,
    ) -> Flow<T>
    where
        T: Clone + 'static,
        F: FnOnce(&mut Self) -> Flow<T>,
    {
        let Some(slot) = self.slot::<T>(site) else {
            return compute(self);
        };
        if let Some(value) = self.registry.request(slot, request) {
            return Ok(value);
        }
        let value = compute(self)?;
        self.registry.store(slot, value.clone(), recorded, self.iteration);
        Ok(value)
    }

    /// Store `value` in `slot` as accurate to `precision`.
    pub fn store<T: 'static>(&mut self, slot: SlotId<T>, value: T, precision: Precision) {
        self.registry.store(slot, value, precision, self.iteration);
    }

    /// The value in `slot` if it satisfies `precision`.
    pub fn request<T: Clone + 'static>(&mut self, slot: SlotId<T>, precision: Precision) -> Option<T> {
        self.registry.request(slot, precision)
    }

    // Scoped switches

    /// Move to `step` (clamped to the schedule) and update the working
    /// precision.
    pub(crate) fn set_step(&mut self, step: usize) {
        self.step = self.schedule.clamp_step(step);
        self.working = self.schedule.precision(self.step);
    }

    /// Run `f` on schedule step `step`.
    pub fn at_step<R>(&mut self, step: usize, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.step;
        self.set_step(step);
        let result = f(self);
        self.set_step(saved);
        result
    }

    /// Run `f` `steps` schedule steps finer (coarser if negative).
    pub fn stiff<R>(&mut self, steps: isize, f: impl FnOnce(&mut Self) -> R) -> R {
        let step = self.step.saturating_add_signed(steps).max(1);
        self.at_step(step, f)
    }

    /// Run `f` at half the current step.
    pub fn relaxed<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.at_step(PrecisionSchedule::relaxed_step(self.step), f)
    }

    /// Run `f` with the cache disabled.
    ///
    /// Code whose result does not depend on which of several valid
    /// approximations an inner query returned may run here; limit operators
    /// use it for their inner function.
    pub fn single_valued<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.single_valued += 1;
        let result = f(self);
        self.single_valued -= 1;
        result
    }

    /// Run `f` under a different precision policy.
    pub fn with_policy<R>(&mut self, policy: PrecisionPolicy, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.policy;
        self.policy = policy;
        let result = f(self);
        self.policy = saved;
        result
    }
}

impl std::fmt::Debug for IterationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IterationContext")
            .field("iteration", &self.iteration)
            .field("step", &self.step)
            .field("working", &self.working)
            .field("policy", &self.policy)
            .field("restart_pending", &self.restart_pending)
            .field("single_valued", &self.single_valued)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
