//! Regeneration of the primary pool.
//!
//! The base rate follows a falling logistic in the current amount, so the
//! pool refills quickly when empty and stalls as it approaches the midpoint:
//!
//! ```text
//! raw = gain * r_max / (1 + e^((current - midpoint) / steepness))
//! ```
//!
//! The raw rate is then scaled, in order, by the upgrade multiplier
//! `(L + 1) / (L + 5)`, the idle-worker multiplier (only with Idle Chorus),
//! the season multiplier and the weather multiplier. The product is clamped
//! to `[0, r_max]` and only then multiplied by the combo multiplier, so an
//! Intone combo can push the effective rate above `r_max`.

use serde::{Deserialize, Serialize};

use crate::pool::ResourcePool;

/// Shape of the regeneration curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegenParams {
    /// Ceiling of the clamped rate, per second.
    #[serde(default = "default_r_max")]
    pub r_max: f64,
    /// Amount at which the curve reaches `gain * r_max / 2`.
    #[serde(default = "default_midpoint")]
    pub midpoint: f64,
    /// Midpoint used once Clarity is owned.
    #[serde(default = "default_clarity_midpoint")]
    pub clarity_midpoint: f64,
    /// Horizontal scale of the logistic.
    #[serde(default = "default_steepness")]
    pub steepness: f64,
    /// Vertical scale of the logistic.
    #[serde(default = "default_gain")]
    pub gain: f64,
    /// Bonus per idle worker when Idle Chorus is owned.
    #[serde(default = "default_idle_bonus")]
    pub idle_bonus_per_worker: f64,
}

const fn default_r_max() -> f64 {
    6.0
}
const fn default_midpoint() -> f64 {
    1000.0
}
const fn default_clarity_midpoint() -> f64 {
    1600.0
}
const fn default_steepness() -> f64 {
    150.0
}
const fn default_gain() -> f64 {
    2.0
}
const fn default_idle_bonus() -> f64 {
    0.05
}

impl Default for RegenParams {
    fn default() -> Self {
        Self {
            r_max: default_r_max(),
            midpoint: default_midpoint(),
            clarity_midpoint: default_clarity_midpoint(),
            steepness: default_steepness(),
            gain: default_gain(),
            idle_bonus_per_worker: default_idle_bonus(),
        }
    }
}

/// Everything the rate depends on besides the curve shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegenInputs {
    /// Current amount of the pool.
    pub current: f64,
    /// Insight Flow level.
    pub upgrade_level: u32,
    /// Followers not assigned to any task.
    pub idle_workers: u32,
    /// Whether Idle Chorus is owned.
    pub idle_bonus_enabled: bool,
    /// Whether Clarity is owned.
    pub clarity: bool,
    /// Season multiplier.
    pub season_multiplier: f64,
    /// Weather multiplier, when an overlay is active.
    pub weather_multiplier: Option<f64>,
    /// Intone combo multiplier (at least 1).
    pub combo_multiplier: f64,
}

impl RegenInputs {
    /// Inputs with every multiplier neutral.
    pub const fn neutral(current: f64) -> Self {
        Self {
            current,
            upgrade_level: 0,
            idle_workers: 0,
            idle_bonus_enabled: false,
            clarity: false,
            season_multiplier: 1.0,
            weather_multiplier: None,
            combo_multiplier: 1.0,
        }
    }
}

/// The logistic term before any multiplier.
pub fn saturation(params: &RegenParams, current: f64, clarity: bool) -> f64 {
    let midpoint = if clarity {
        params.clarity_midpoint
    } else {
        params.midpoint
    };
    let steepness = if params.steepness > 0.0 {
        params.steepness
    } else {
        1.0
    };
    let exponent = (current - midpoint) / steepness;
    params.gain * params.r_max / (1.0 + exponent.exp())
}

/// `(level + 1) / (level + 5)`: 0.2 at level 0, approaching 1.
pub fn upgrade_multiplier(level: u32) -> f64 {
    let l = f64::from(level);
    (l + 1.0) / (l + 5.0)
}

/// `1 + idle_workers * bonus`, or 1 when the bonus is not owned.
pub fn idle_multiplier(params: &RegenParams, idle_workers: u32, enabled: bool) -> f64 {
    if enabled {
        params
            .idle_bonus_per_worker
            .mul_add(f64::from(idle_workers), 1.0)
    } else {
        1.0
    }
}

/// Per-second regeneration rate. Never negative.
pub fn compute_regen_rate(params: &RegenParams, inputs: &RegenInputs) -> f64 {
    let rate = saturation(params, inputs.current, inputs.clarity)
        * upgrade_multiplier(inputs.upgrade_level)
        * idle_multiplier(params, inputs.idle_workers, inputs.idle_bonus_enabled)
        * inputs.season_multiplier
        * inputs.weather_multiplier.unwrap_or(1.0);
    let clamped = if rate.is_finite() {
        rate.clamp(0.0, params.r_max)
    } else {
        0.0
    };
    clamped * inputs.combo_multiplier.max(1.0)
}

/// Credit `rate * dt` to `pool`, capped at its max. Returns the amount added.
pub fn apply_regen(pool: &mut ResourcePool, rate: f64, dt: f64) -> f64 {
    pool.credit(rate * dt)
}
