//! Latency-driven timing engine.
//!
//! Each accepted request is stamped with a due cycle of `now + latency`, where the latency
//! comes from a [`MemoryController`]. On every engine tick the requests whose due cycle has
//! arrived are completed in due order; requests due on the same cycle complete in the order
//! they were accepted.

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, trace, warn};

use super::TimingEngine;
use super::controller::{MemoryController, RowOutcome};
use crate::common::{Request, RequestKind};
use crate::completion::CompletionContext;
use crate::stats::EngineStats;

struct InFlight {
    due: u64,
    request: Request,
}

/// Bounded timing engine backed by a latency model.
pub struct LatencyEngine {
    clock_ratio: u32,
    capacity: usize,
    controller: Box<dyn MemoryController>,
    in_flight: VecDeque<InFlight>,
    cycle: u64,
    stats: EngineStats,
}

impl LatencyEngine {
    /// Creates an engine that holds at most `capacity` requests in flight.
    pub fn new(clock_ratio: u32, capacity: usize, controller: Box<dyn MemoryController>) -> Self {
        Self {
            clock_ratio,
            capacity,
            controller,
            in_flight: VecDeque::with_capacity(capacity),
            cycle: 0,
            stats: EngineStats::default(),
        }
    }

    /// Engine cycles executed so far.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Due cycle of the next request to complete, if any.
    pub fn next_due(&self) -> Option<u64> {
        self.in_flight.front().map(|f| f.due)
    }

    fn count_outcome(&mut self, outcome: Option<RowOutcome>) {
        match outcome {
            Some(RowOutcome::Hit) => self.stats.row_hits += 1,
            Some(RowOutcome::Miss) => self.stats.row_misses += 1,
            Some(RowOutcome::Conflict) => self.stats.row_conflicts += 1,
            None => {}
        }
    }
}

impl TimingEngine for LatencyEngine {
    fn clock_ratio(&self) -> u32 {
        self.clock_ratio
    }

    fn send(&mut self, request: Request) -> Result<(), Request> {
        if self.in_flight.len() >= self.capacity {
            self.stats.refused += 1;
            return Err(request);
        }

        let latency = self.controller.access_latency(request.addr);
        let outcome = self.controller.last_outcome();
        self.count_outcome(outcome);
        self.stats.busy_cycles = self.stats.busy_cycles.saturating_add(latency);

        // A saturated due cycle never arrives.
        let due = self.cycle.saturating_add(latency);
        trace!(
            cycle = self.cycle,
            due,
            "{} {:#x} scheduled",
            request.kind,
            request.addr
        );

        // Keep the queue sorted by due cycle; equal due cycles stay in arrival order.
        let pos = self.in_flight.partition_point(|f| f.due <= due);
        self.in_flight.insert(pos, InFlight { due, request });
        Ok(())
    }

    fn tick(&mut self, ctx: &mut CompletionContext<'_>) {
        self.cycle += 1;
        while self.in_flight.front().is_some_and(|f| f.due <= self.cycle) {
            let Some(InFlight { request, .. }) = self.in_flight.pop_front() else {
                break;
            };
            match request.kind {
                RequestKind::Read => self.stats.reads_served += 1,
                RequestKind::Write => self.stats.writes_served += 1,
            }
            request.complete(ctx);
        }
    }

    fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn finalize(&mut self) -> EngineStats {
        if !self.in_flight.is_empty() {
            warn!(
                "timing engine finalized with {} request(s) still in flight",
                self.in_flight.len()
            );
        }
        self.stats.abandoned = self.in_flight.len() as u64;
        self.in_flight.clear();
        self.stats.cycles = self.cycle;
        debug!(
            cycles = self.cycle,
            served = self.stats.served(),
            "timing engine finalized"
        );
        self.stats.clone()
    }
}

impl fmt::Debug for LatencyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LatencyEngine")
            .field("clock_ratio", &self.clock_ratio)
            .field("capacity", &self.capacity)
            .field("in_flight", &self.in_flight.len())
            .field("cycle", &self.cycle)
            .finish_non_exhaustive()
    }
}
