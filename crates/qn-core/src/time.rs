//! Simulation time model.
//!
//! # Design
//!
//! Time is continuous and represented by `SimTime`, a totally ordered `f64`
//! wrapper.  An entity that has never been attached to a running event list
//! sits at `SimTime::NEG_INFINITY`, so any first update moves it forward.
//!
//! Ordering uses `f64::total_cmp`, which makes `SimTime` usable as a
//! `BTreeMap` key.  NaN is never a valid simulation time; the event list
//! rejects it at scheduling.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{QnError, QnResult};

// ── SimTime ──────────────────────────────────────────────────────────────────

/// An absolute simulation time.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);
    pub const NEG_INFINITY: SimTime = SimTime(f64::NEG_INFINITY);
    pub const INFINITY: SimTime = SimTime(f64::INFINITY);

    /// Validate and wrap a raw time value.
    pub fn try_new(t: f64) -> QnResult<SimTime> {
        if t.is_nan() {
            return Err(QnError::InvalidTime(t));
        }
        Ok(SimTime(t))
    }

    /// The time `dt` after `self`.
    #[inline]
    pub fn after(self, dt: f64) -> SimTime {
        SimTime(self.0 + dt)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for SimTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<f64> for SimTime {
    fn from(t: f64) -> Self {
        SimTime(t)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.0)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
///
/// Typically built by the application crate and passed to
/// `qn_sim::SimBuilder`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Time the event list is reset to before the run.
    pub start_time: SimTime,

    /// Events strictly after this time are left in the list.  `None` runs
    /// until the list is empty.
    pub end_time: Option<SimTime>,

    /// Master RNG seed for routing selectors.  Same seed, same trajectory.
    pub seed: u64,

    /// Upper bound on dispatched events, guarding against models that never
    /// drain (e.g. feedback loops with zero service times).  `None` = unbounded.
    pub max_events: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_time: SimTime::ZERO,
            end_time:   None,
            seed:       42,
            max_events: None,
        }
    }
}

impl SimConfig {
    /// Check the configuration for contradictions.
    pub fn validate(&self) -> QnResult<()> {
        if self.start_time.0.is_nan() {
            return Err(QnError::InvalidTime(self.start_time.0));
        }
        if let Some(end) = self.end_time {
            if end.0.is_nan() {
                return Err(QnError::InvalidTime(end.0));
            }
            if end < self.start_time {
                return Err(QnError::Config(format!(
                    "end time {end} precedes start time {}",
                    self.start_time
                )));
            }
        }
        Ok(())
    }
}
