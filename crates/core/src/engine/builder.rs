//! Construction of the reference collaborators from a [`Config`].

use super::controller::{DramController, MemoryController, SimpleController};
use super::frontend::ExternalFrontend;
use super::memory::LatencyEngine;
use super::{Frontend, TimingEngine};
use crate::common::BridgeError;
use crate::config::{self, Config};

/// A frontend and the timing engine it feeds.
pub type EnginePair = (Box<dyn Frontend>, Box<dyn TimingEngine>);

/// Builds the configured latency model.
///
/// A `row_bits` of 64 or more places every address in one row.
pub fn build_controller(memory: &config::MemoryConfig) -> Box<dyn MemoryController> {
    match memory.controller {
        config::MemoryController::Simple => Box::new(SimpleController::new(memory.latency)),
        config::MemoryController::Dram => Box::new(DramController::with_row_bits(
            memory.t_cas,
            memory.t_ras,
            memory.t_pre,
            memory.row_bits,
        )),
    }
}

/// Builds the frontend and timing engine described by `config`.
///
/// Clock ratios are not checked here; the session validates them once it asks each
/// collaborator for its ratio.
///
/// # Errors
///
/// Returns [`BridgeError::EngineConstruction`] for zero queue depths.
pub fn build(config: &Config) -> Result<EnginePair, BridgeError> {
    if config.frontend.queue_depth == 0 {
        return Err(BridgeError::EngineConstruction(
            "frontend queue_depth must be positive".into(),
        ));
    }
    if config.memory.queue_depth == 0 {
        return Err(BridgeError::EngineConstruction(
            "memory queue_depth must be positive".into(),
        ));
    }

    let controller = build_controller(&config.memory);
    let engine = LatencyEngine::new(
        config.memory.clock_ratio,
        config.memory.queue_depth,
        controller,
    );
    let frontend = ExternalFrontend::new(config.frontend.clock_ratio, config.frontend.queue_depth);
    Ok((Box::new(frontend), Box::new(engine)))
}
