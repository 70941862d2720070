//! Two-domain clock scheduler.
//!
//! The bridge is advanced by one external tick at a time. The frontend and the timing engine
//! each run on their own clock, expressed as an integer ratio. Over a period of
//! `frontend_ratio * engine_ratio` external ticks the frontend is driven `frontend_ratio`
//! times and the timing engine `engine_ratio` times.
//!
//! Both decisions are recomputed from the single cycle counter on every tick rather than
//! accumulated per domain, so the two domains cannot drift apart over long runs.

use std::fmt;

use crate::common::BridgeError;

/// Identifies one of the two clock domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockDomain {
    /// The request-accepting frontend.
    Frontend,
    /// The DRAM timing engine.
    Engine,
}

impl fmt::Display for ClockDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frontend => write!(f, "frontend"),
            Self::Engine => write!(f, "timing engine"),
        }
    }
}

/// Which sub-engines to drive on a given external tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickPlan {
    /// Drive the frontend this tick.
    pub frontend: bool,
    /// Drive the timing engine this tick.
    pub engine: bool,
}

/// Monotonic cycle counter plus the two fixed clock ratios.
#[derive(Debug, Clone)]
pub struct ClockScheduler {
    frontend_ratio: u64,
    engine_ratio: u64,
    period: u64,
    cycle: u64,
}

impl ClockScheduler {
    /// Creates a scheduler at cycle 0.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidClockRatio`] if either ratio is zero.
    pub fn new(frontend_ratio: u32, engine_ratio: u32) -> Result<Self, BridgeError> {
        if frontend_ratio == 0 {
            return Err(BridgeError::InvalidClockRatio {
                domain: ClockDomain::Frontend,
                ratio: frontend_ratio,
            });
        }
        if engine_ratio == 0 {
            return Err(BridgeError::InvalidClockRatio {
                domain: ClockDomain::Engine,
                ratio: engine_ratio,
            });
        }
        let frontend_ratio = u64::from(frontend_ratio);
        let engine_ratio = u64::from(engine_ratio);
        Ok(Self {
            frontend_ratio,
            engine_ratio,
            period: frontend_ratio * engine_ratio,
            cycle: 0,
        })
    }

    /// Advances the counter by one and returns which domains fire on the new cycle.
    pub fn advance(&mut self) -> TickPlan {
        self.cycle += 1;
        self.plan_for(self.cycle)
    }

    /// Returns the tick plan for cycle `n` without advancing.
    pub const fn plan_for(&self, n: u64) -> TickPlan {
        let phase = n % self.period;
        TickPlan {
            frontend: phase % self.engine_ratio == 0,
            engine: phase % self.frontend_ratio == 0,
        }
    }

    /// Number of external ticks since creation.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Frontend clock ratio.
    pub const fn frontend_ratio(&self) -> u64 {
        self.frontend_ratio
    }

    /// Timing-engine clock ratio.
    pub const fn engine_ratio(&self) -> u64 {
        self.engine_ratio
    }

    /// Length in external ticks of one full scheduling period.
    pub const fn period(&self) -> u64 {
        self.period
    }
}
