//! Bounded external frontend.
//!
//! Admits driver requests into a fixed-depth pending queue and, on each frontend clock edge,
//! forwards as many as the timing engine will take, oldest first. A full queue is the
//! backpressure signal the driver sees as a rejected submit.

use std::collections::VecDeque;

use tracing::{debug, warn};

use super::{Frontend, TimingEngine};
use crate::common::Request;
use crate::stats::FrontendStats;

/// Frontend with a bounded FIFO of pending requests.
#[derive(Debug)]
pub struct ExternalFrontend {
    clock_ratio: u32,
    depth: usize,
    pending: VecDeque<Request>,
    stats: FrontendStats,
}

impl ExternalFrontend {
    /// Creates a frontend that buffers at most `depth` requests.
    pub fn new(clock_ratio: u32, depth: usize) -> Self {
        Self {
            clock_ratio,
            depth,
            pending: VecDeque::with_capacity(depth),
            stats: FrontendStats::default(),
        }
    }

    /// Maximum number of buffered requests.
    pub const fn depth(&self) -> usize {
        self.depth
    }
}

impl Frontend for ExternalFrontend {
    fn clock_ratio(&self) -> u32 {
        self.clock_ratio
    }

    fn accept(&mut self, request: Request) -> Result<(), Request> {
        if self.pending.len() >= self.depth {
            self.stats.rejected += 1;
            return Err(request);
        }
        self.stats.accepted += 1;
        self.pending.push_back(request);
        Ok(())
    }

    fn tick(&mut self, engine: &mut dyn TimingEngine) {
        self.stats.cycles += 1;
        while let Some(request) = self.pending.pop_front() {
            match engine.send(request) {
                Ok(()) => self.stats.forwarded += 1,
                Err(refused) => {
                    self.pending.push_front(refused);
                    break;
                }
            }
        }
    }

    fn pending(&self) -> usize {
        self.pending.len()
    }

    fn finalize(&mut self) -> FrontendStats {
        if !self.pending.is_empty() {
            warn!(
                "frontend finalized with {} request(s) never forwarded",
                self.pending.len()
            );
        }
        self.stats.abandoned = self.pending.len() as u64;
        self.pending.clear();
        debug!(cycles = self.stats.cycles, "frontend finalized");
        self.stats.clone()
    }
}
