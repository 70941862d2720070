//! Frontend and timing-engine collaborators.
//!
//! The session drives two sub-engines on independent clocks:
//! 1. **Frontend:** Admits driver requests under its own policy (e.g., queue depth) and, on
//!    its clock edges, hands them to the timing engine.
//! 2. **Timing engine:** Decides when each request completes and invokes its callback from
//!    inside its own `tick`.
//!
//! The two never hold references to each other. The session lends the timing engine to the
//! frontend for each frontend tick, and lends a [`CompletionContext`] to the timing engine
//! for each engine tick.
//!
//! Reference implementations: [`ExternalFrontend`](frontend::ExternalFrontend) and
//! [`LatencyEngine`](memory::LatencyEngine) backed by a
//! [`MemoryController`](controller::MemoryController) latency model.

/// Builds the reference collaborators from configuration.
pub mod builder;
/// Latency models (fixed, DRAM row buffer).
pub mod controller;
/// Bounded external frontend.
pub mod frontend;
/// Latency-driven timing engine.
pub mod memory;

use crate::common::Request;
use crate::completion::CompletionContext;
use crate::stats::{EngineStats, FrontendStats};

/// Cycle-level memory timing model.
pub trait TimingEngine: Send {
    /// Relative clock frequency of this engine.
    fn clock_ratio(&self) -> u32;

    /// Offers a request to the engine; a refused request is handed back.
    ///
    /// # Errors
    ///
    /// Returns the request unchanged if the engine cannot take it this cycle.
    fn send(&mut self, request: Request) -> Result<(), Request>;

    /// Advances the engine by one of its own cycles, completing due requests against `ctx`.
    fn tick(&mut self, ctx: &mut CompletionContext<'_>);

    /// Requests accepted but not yet completed.
    fn in_flight(&self) -> usize;

    /// Flushes the engine and returns its statistics.
    fn finalize(&mut self) -> EngineStats;
}

/// Request-accepting side of the bridge.
pub trait Frontend: Send {
    /// Relative clock frequency of this frontend.
    fn clock_ratio(&self) -> u32;

    /// Admits a request; a refused request is handed back.
    ///
    /// # Errors
    ///
    /// Returns the request unchanged if the admission policy refuses it.
    fn accept(&mut self, request: Request) -> Result<(), Request>;

    /// Advances the frontend by one of its own cycles, forwarding work into `engine`.
    fn tick(&mut self, engine: &mut dyn TimingEngine);

    /// Requests admitted but not yet forwarded.
    fn pending(&self) -> usize;

    /// Flushes the frontend and returns its statistics.
    fn finalize(&mut self) -> FrontendStats;
}
