//! Error definitions for the bridge.
//!
//! Only construction-time problems are errors. Admission rejection is reported as a
//! `false` return from `submit`, and completion correlation misses are diagnostics,
//! so neither appears here.

use std::path::PathBuf;

use thiserror::Error;

use crate::scheduler::ClockDomain;

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON or does not match the schema.
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        /// Path that was being parsed.
        path: PathBuf,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by the session boundary.
///
/// A session is never returned partially constructed: every construction failure
/// is one of these variants and no `Session` value exists afterwards.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A collaborator reported a clock ratio of zero.
    #[error("invalid {domain} clock ratio {ratio}: ratios must be positive")]
    InvalidClockRatio {
        /// Clock domain that reported the ratio.
        domain: ClockDomain,
        /// The offending ratio.
        ratio: u32,
    },

    /// A raw request-kind code outside `0` (read) and `1` (write).
    #[error("invalid request kind code {0}: expected 0 (read) or 1 (write)")]
    InvalidRequestKind(i32),

    /// The frontend or timing engine could not be built from the configuration.
    #[error("engine construction failed: {0}")]
    EngineConstruction(String),
}
