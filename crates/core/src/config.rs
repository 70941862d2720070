//! Configuration system for the bridge.
//!
//! This module defines all configuration structures and enums used to parameterize a
//! session. It provides:
//! 1. **Defaults:** Baseline clock ratios, queue depths, and DRAM timing constants.
//! 2. **Structures:** Config sections for the frontend, the memory timing engine, and the bridge.
//! 3. **Enums:** Memory controller model and in-flight overlap policy.
//! 4. **Loading:** The [`ConfigLoader`] trait and its JSON implementation.
//!
//! Every section and field is optional; missing values take the defaults below.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::ConfigError;

/// Default configuration constants for the bridge.
mod defaults {
    /// Frontend clock ratio (relative frequency of the request-side clock).
    pub const FRONTEND_CLOCK_RATIO: u32 = 8;

    /// Frontend pending-request queue depth.
    pub const FRONTEND_QUEUE_DEPTH: usize = 32;

    /// Timing-engine clock ratio (relative frequency of the DRAM clock).
    pub const MEMORY_CLOCK_RATIO: u32 = 3;

    /// Maximum number of requests the timing engine holds in flight.
    pub const MEMORY_QUEUE_DEPTH: usize = 64;

    /// Fixed access latency of the simple controller, in timing-engine cycles.
    pub const LATENCY: u64 = 100;

    /// CAS (Column Access Strobe) latency in DRAM cycles.
    pub const T_CAS: u64 = 14;

    /// RAS (Row Access Strobe) latency in DRAM cycles.
    pub const T_RAS: u64 = 14;

    /// Precharge latency in DRAM cycles.
    pub const T_PRE: u64 = 14;

    /// Log2 of the DRAM row size in bytes (2 KiB rows).
    pub const ROW_BITS: u32 = 11;
}

/// Memory controller latency models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum MemoryController {
    /// Every access takes `latency` cycles.
    #[default]
    Simple,
    /// Row-buffer model: CAS on a row hit, RAS + CAS on an idle bank,
    /// precharge + RAS + CAS on a row conflict.
    #[serde(alias = "DRAM")]
    Dram,
}

/// How the ledger treats a request to an address that already has one in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum OverlapPolicy {
    /// Accept; the newer record replaces the older one (last issued wins for latency).
    #[default]
    Overwrite,
    /// Accept; keep every record in issue order and retire them oldest first.
    Track,
    /// Refuse the request until the in-flight one has been retired.
    Reject,
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use membridge_core::config::{Config, MemoryController, OverlapPolicy};
///
/// let json = r#"{
///     "frontend": { "clock_ratio": 4 },
///     "memory": { "clock_ratio": 1, "controller": "Dram", "t_cas": 11 },
///     "bridge": { "overlap_policy": "Track" }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.frontend.clock_ratio, 4);
/// assert_eq!(config.frontend.queue_depth, 32);
/// assert_eq!(config.memory.controller, MemoryController::Dram);
/// assert_eq!(config.memory.t_cas, 11);
/// assert_eq!(config.bridge.overlap_policy, OverlapPolicy::Track);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Request-accepting frontend
    pub frontend: FrontendConfig,
    /// DRAM timing engine
    pub memory: MemoryConfig,
    /// Bridge bookkeeping
    pub bridge: BridgeConfig,
}

impl Config {
    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if `json` is malformed or mistyped.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Frontend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Relative clock frequency of the frontend
    #[serde(default = "FrontendConfig::default_clock_ratio")]
    pub clock_ratio: u32,

    /// Pending requests the frontend buffers before rejecting
    #[serde(default = "FrontendConfig::default_queue_depth")]
    pub queue_depth: usize,
}

impl FrontendConfig {
    /// Returns the default frontend clock ratio.
    fn default_clock_ratio() -> u32 {
        defaults::FRONTEND_CLOCK_RATIO
    }

    /// Returns the default frontend queue depth.
    fn default_queue_depth() -> usize {
        defaults::FRONTEND_QUEUE_DEPTH
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            clock_ratio: defaults::FRONTEND_CLOCK_RATIO,
            queue_depth: defaults::FRONTEND_QUEUE_DEPTH,
        }
    }
}

/// Timing-engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Relative clock frequency of the timing engine
    #[serde(default = "MemoryConfig::default_clock_ratio")]
    pub clock_ratio: u32,

    /// Requests the engine holds in flight before refusing more
    #[serde(default = "MemoryConfig::default_queue_depth")]
    pub queue_depth: usize,

    /// Latency model
    #[serde(default)]
    pub controller: MemoryController,

    /// Fixed latency for the simple controller (engine cycles)
    #[serde(default = "MemoryConfig::default_latency")]
    pub latency: u64,

    /// CAS latency (engine cycles)
    #[serde(default = "MemoryConfig::default_t_cas")]
    pub t_cas: u64,

    /// RAS latency (engine cycles)
    #[serde(default = "MemoryConfig::default_t_ras")]
    pub t_ras: u64,

    /// Precharge latency (engine cycles)
    #[serde(default = "MemoryConfig::default_t_pre")]
    pub t_pre: u64,

    /// Log2 of the row size in bytes
    #[serde(default = "MemoryConfig::default_row_bits")]
    pub row_bits: u32,
}

impl MemoryConfig {
    /// Returns the default timing-engine clock ratio.
    fn default_clock_ratio() -> u32 {
        defaults::MEMORY_CLOCK_RATIO
    }

    /// Returns the default timing-engine queue depth.
    fn default_queue_depth() -> usize {
        defaults::MEMORY_QUEUE_DEPTH
    }

    /// Returns the default fixed latency.
    fn default_latency() -> u64 {
        defaults::LATENCY
    }

    /// Returns the default CAS latency.
    fn default_t_cas() -> u64 {
        defaults::T_CAS
    }

    /// Returns the default RAS latency.
    fn default_t_ras() -> u64 {
        defaults::T_RAS
    }

    /// Returns the default precharge latency.
    fn default_t_pre() -> u64 {
        defaults::T_PRE
    }

    /// Returns the default row size (log2 bytes).
    fn default_row_bits() -> u32 {
        defaults::ROW_BITS
    }
}

impl Default for MemoryConfig {
    /// Uses the simple controller with the default DRAM timing parameters kept ready
    /// for a switch to the row-buffer model.
    fn default() -> Self {
        Self {
            clock_ratio: defaults::MEMORY_CLOCK_RATIO,
            queue_depth: defaults::MEMORY_QUEUE_DEPTH,
            controller: MemoryController::default(),
            latency: defaults::LATENCY,
            t_cas: defaults::T_CAS,
            t_ras: defaults::T_RAS,
            t_pre: defaults::T_PRE,
            row_bits: defaults::ROW_BITS,
        }
    }
}

/// Bridge bookkeeping configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Handling of a second request to an address already in flight
    #[serde(default)]
    pub overlap_policy: OverlapPolicy,
}

/// Source of session configuration.
pub trait ConfigLoader {
    /// Loads the configuration stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    fn load(&self, path: &Path) -> Result<Config, ConfigError>;
}

/// Loads configuration from a JSON file.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConfigLoader;

impl ConfigLoader for JsonConfigLoader {
    fn load(&self, path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
