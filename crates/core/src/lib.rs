//! Cycle-stepped co-simulation bridge between a memory request driver and a DRAM timing model.
//!
//! This crate lets an external driver (a CPU/cache model or a testbench) issue memory requests
//! to a cycle-level timing engine and collect completions one external clock tick at a time.
//! It provides:
//! 1. **Session:** The [`Session`] lifecycle (create, submit, advance, drain, finalize).
//! 2. **Scheduling:** A [`ClockScheduler`](scheduler::ClockScheduler) that derives two clock
//!    domains (frontend and timing engine) from one external heartbeat without drift.
//! 3. **Request tracking:** The request ledger, the completion queue, and the functional store
//!    that answers read values independently of the timing model.
//! 4. **Collaborators:** `Frontend` / `TimingEngine` traits with reference implementations
//!    (bounded external frontend, latency engine with fixed or DRAM row-buffer timing).
//! 5. **Configuration and statistics:** JSON configuration loading and end-of-run reports.

/// Common types (requests, request kinds, errors).
pub mod common;
/// Completion entries, the completion queue, and the context lent to timing-engine callbacks.
pub mod completion;
/// Bridge configuration (defaults, enums, JSON loader).
pub mod config;
/// Frontend and timing-engine traits plus reference implementations.
pub mod engine;
/// Functional data model: address to last written value.
pub mod functional;
/// In-flight request ledger used for completion correlation and latency diagnostics.
pub mod ledger;
/// Two-domain clock scheduler driven by one external tick.
pub mod scheduler;
/// Bridge session: owns all state and orchestrates the request lifecycle.
pub mod session;
/// Bridge, frontend, and timing-engine statistics.
pub mod stats;

/// Root configuration type; use `Config::default()` or load from JSON.
pub use crate::config::Config;
/// Request kind and error types used at the session boundary.
pub use crate::common::{BridgeError, RequestKind};
/// A drained read completion.
pub use crate::completion::Completion;
/// The bridge session; construct with `Session::create` or `Session::from_config`.
pub use crate::session::Session;
