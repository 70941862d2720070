//! Bridge session.
//!
//! A [`Session`] owns the cycle scheduler, the request ledger, the completion queue, the
//! functional store, and both collaborators. It exposes the request lifecycle:
//!
//! 1. **Create:** Load configuration, build the frontend and timing engine, validate their
//!    clock ratios. Failure yields an error and no session.
//! 2. **Submit:** Offer a request to the frontend; on acceptance, record it in the ledger and
//!    apply writes to the functional store.
//! 3. **Advance:** One external tick; drives the frontend and/or the timing engine according
//!    to the scheduler. Completion callbacks run in-line here.
//! 4. **Drain:** Pop one completion (FIFO) and report its issue-to-drain latency.
//! 5. **Finalize:** Flush both collaborators and return the final report. Consumes the
//!    session, so nothing can be called on it afterwards.

use std::fmt;
use std::path::Path;

use tracing::{debug, info, trace, warn};

use crate::common::{BridgeError, Request, RequestKind};
use crate::completion::{Completion, CompletionContext, CompletionQueue};
use crate::config::{BridgeConfig, Config, ConfigLoader, JsonConfigLoader};
use crate::engine::{Frontend, TimingEngine, builder};
use crate::functional::FunctionalStore;
use crate::ledger::RequestLedger;
use crate::scheduler::ClockScheduler;
use crate::stats::{BridgeStats, FinalReport};

/// Completion callback for reads: resolve the functional value and queue it for the driver.
fn complete_read(request: &Request, ctx: &mut CompletionContext<'_>) {
    let value = ctx.resolve(request.addr);
    ctx.push(Completion {
        addr: request.addr,
        value,
    });
}

/// Completion callback for writes: retire the ledger record only; writes are never drained.
fn retire_write(request: &Request, ctx: &mut CompletionContext<'_>) {
    if let Some(record) = ctx.retire(request.addr, RequestKind::Write) {
        trace!(
            latency = ctx.cycle().saturating_sub(record.issue_cycle),
            "write {:#x} retired",
            request.addr
        );
    }
}

/// A live bridge between a driver and a timing engine.
///
/// Single-threaded: every operation runs synchronously on the caller's thread.
pub struct Session {
    frontend: Box<dyn Frontend>,
    engine: Box<dyn TimingEngine>,
    scheduler: ClockScheduler,
    ledger: RequestLedger,
    completions: CompletionQueue,
    store: FunctionalStore,
    stats: BridgeStats,
}

impl Session {
    /// Creates a session from the JSON configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError`] if the file cannot be loaded, the engines cannot be built,
    /// or either clock ratio is zero.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        Self::create_with(&JsonConfigLoader, path.as_ref())
    }

    /// Creates a session using a caller-supplied configuration loader.
    ///
    /// # Errors
    ///
    /// See [`Session::create`].
    pub fn create_with(loader: &dyn ConfigLoader, path: &Path) -> Result<Self, BridgeError> {
        let config = loader.load(path)?;
        info!("loaded bridge configuration from {}", path.display());
        Self::from_config(&config)
    }

    /// Creates a session with the reference collaborators described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError`] if the engines cannot be built or a clock ratio is zero.
    pub fn from_config(config: &Config) -> Result<Self, BridgeError> {
        let (frontend, engine) = builder::build(config)?;
        Self::with_engines(frontend, engine, config.bridge)
    }

    /// Creates a session around caller-supplied collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidClockRatio`] if either collaborator reports a zero ratio.
    pub fn with_engines(
        frontend: Box<dyn Frontend>,
        engine: Box<dyn TimingEngine>,
        bridge: BridgeConfig,
    ) -> Result<Self, BridgeError> {
        let scheduler = ClockScheduler::new(frontend.clock_ratio(), engine.clock_ratio())?;
        info!(
            frontend_ratio = scheduler.frontend_ratio(),
            engine_ratio = scheduler.engine_ratio(),
            policy = ?bridge.overlap_policy,
            "bridge session ready"
        );
        Ok(Self {
            frontend,
            engine,
            scheduler,
            ledger: RequestLedger::new(bridge.overlap_policy),
            completions: CompletionQueue::new(),
            store: FunctionalStore::new(),
            stats: BridgeStats::default(),
        })
    }

    /// Offers a request to the frontend.
    ///
    /// `data` is only meaningful for writes. Returns `true` if the request was accepted.
    /// A rejected request leaves the ledger, the functional store, and the completion queue
    /// untouched; the driver is expected to retry on a later cycle.
    pub fn submit(&mut self, addr: u64, kind: RequestKind, source_id: i32, data: u64) -> bool {
        if !self.ledger.admits(addr) {
            debug!("{kind} {addr:#x} refused: address already in flight");
            self.stats.rejections += 1;
            return false;
        }

        let request = match kind {
            RequestKind::Read => Request::new(addr, kind, source_id).with_callback(complete_read),
            RequestKind::Write => Request::new(addr, kind, source_id).with_callback(retire_write),
        };
        if self.frontend.accept(request).is_err() {
            debug!("{kind} {addr:#x} rejected by frontend");
            self.stats.rejections += 1;
            return false;
        }

        let cycle = self.scheduler.cycle();
        match kind {
            RequestKind::Read => self.stats.reads_accepted += 1,
            RequestKind::Write => {
                self.store.write(addr, data);
                self.stats.writes_accepted += 1;
            }
        }
        self.ledger.record(addr, cycle, kind);
        debug!(cycle, source_id, "{kind} {addr:#x} accepted");
        true
    }

    /// Like [`Session::submit`], taking the driver wire code (`0` = read, `1` = write).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidRequestKind`] for any other code; nothing is submitted.
    pub fn submit_raw(
        &mut self,
        addr: u64,
        code: i32,
        source_id: i32,
        data: u64,
    ) -> Result<bool, BridgeError> {
        let kind = RequestKind::try_from(code)?;
        Ok(self.submit(addr, kind, source_id, data))
    }

    /// Advances the bridge by exactly one external cycle.
    ///
    /// The frontend runs before the timing engine when both fire on the same cycle.
    pub fn advance(&mut self) {
        let plan = self.scheduler.advance();
        let cycle = self.scheduler.cycle();
        trace!(cycle, frontend = plan.frontend, engine = plan.engine, "advance");

        if plan.frontend {
            self.frontend.tick(self.engine.as_mut());
            self.stats.frontend_ticks += 1;
        }
        if plan.engine {
            let mut ctx = CompletionContext::new(
                &self.store,
                &mut self.completions,
                &mut self.ledger,
                cycle,
            );
            self.engine.tick(&mut ctx);
            self.stats.engine_ticks += 1;
        }
        self.stats.cycles = cycle;
    }

    /// Pops the oldest completion, or `None` if nothing is ready.
    ///
    /// Calling this on an empty queue has no side effects.
    pub fn drain(&mut self) -> Option<Completion> {
        let completion = self.completions.pop()?;
        let cycle = self.scheduler.cycle();
        match self.ledger.take(completion.addr, RequestKind::Read) {
            Some(record) => {
                let latency = cycle.saturating_sub(record.issue_cycle);
                debug!(cycle, latency, "read {:#x} drained", completion.addr);
                self.stats.record_latency(latency);
            }
            None => {
                warn!(
                    cycle,
                    "unmatched completion for {:#x}: no in-flight read recorded",
                    completion.addr
                );
                self.stats.unmatched_completions += 1;
            }
        }
        self.stats.completions_drained += 1;
        Some(completion)
    }

    /// Flushes both collaborators and returns the final report.
    pub fn finalize(mut self) -> FinalReport {
        let frontend = self.frontend.finalize();
        let engine = self.engine.finalize();
        if !self.completions.is_empty() {
            warn!(
                "session finalized with {} undrained completion(s)",
                self.completions.len()
            );
        }
        info!(
            cycles = self.stats.cycles,
            accepted = self.stats.accepted(),
            drained = self.stats.completions_drained,
            "bridge session finalized"
        );
        FinalReport {
            bridge: self.stats,
            frontend,
            engine,
        }
    }

    /// External cycles elapsed since creation.
    pub const fn cycle(&self) -> u64 {
        self.scheduler.cycle()
    }

    /// `(frontend, timing engine)` clock ratios.
    pub const fn clock_ratios(&self) -> (u64, u64) {
        (self.scheduler.frontend_ratio(), self.scheduler.engine_ratio())
    }

    /// Completions waiting to be drained.
    pub fn pending_completions(&self) -> usize {
        self.completions.len()
    }

    /// Ledger records not yet retired.
    pub fn in_flight(&self) -> usize {
        self.ledger.len()
    }

    /// Running session counters.
    pub const fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    /// The functional store.
    pub const fn functional(&self) -> &FunctionalStore {
        &self.store
    }

    /// The request ledger.
    pub const fn ledger(&self) -> &RequestLedger {
        &self.ledger
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cycle", &self.scheduler.cycle())
            .field("clock_ratios", &self.clock_ratios())
            .field("in_flight", &self.ledger.len())
            .field("pending_completions", &self.completions.len())
            .field("frontend_pending", &self.frontend.pending())
            .field("engine_in_flight", &self.engine.in_flight())
            .finish_non_exhaustive()
    }
}
