//! The Intone charge machine.
//!
//! ```text
//! Idle --invoke--> Charging(1) --invoke--> ... --invoke--> Charged(timer)
//!   ^                  |                                        |
//!   +---- decay to 0 --+                                        |
//!   +------------------------- timer elapsed -------------------+
//! ```
//!
//! While charging, one charge decays for every full idle interval that
//! passes without an invocation. Reaching `max_charges` enters `Charged` for
//! a fixed duration, during which further invocations are refused.

use litany_types::Rejection;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tuning for the charge machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntoneParams {
    /// Charges needed to enter `Charged`.
    #[serde(default = "default_max_charges")]
    pub max_charges: u32,
    /// Seconds without an invocation before one charge decays.
    #[serde(default = "default_decay_interval")]
    pub decay_interval_secs: f64,
    /// How long `Charged` lasts.
    #[serde(default = "default_charged_duration")]
    pub charged_duration_secs: f64,
    /// Combo multiplier while `Charged`.
    #[serde(default = "default_charged_multiplier")]
    pub charged_multiplier: f64,
    /// Combo bonus per charge while `Charging`.
    #[serde(default = "default_per_charge_bonus")]
    pub per_charge_bonus: f64,
}

const fn default_max_charges() -> u32 {
    5
}
const fn default_decay_interval() -> f64 {
    4.0
}
const fn default_charged_duration() -> f64 {
    12.0
}
const fn default_charged_multiplier() -> f64 {
    2.5
}
const fn default_per_charge_bonus() -> f64 {
    0.1
}

impl Default for IntoneParams {
    fn default() -> Self {
        Self {
            max_charges: default_max_charges(),
            decay_interval_secs: default_decay_interval(),
            charged_duration_secs: default_charged_duration(),
            charged_multiplier: default_charged_multiplier(),
            per_charge_bonus: default_per_charge_bonus(),
        }
    }
}

/// State of the charge machine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IntoneState {
    /// No charges.
    #[default]
    Idle,
    /// Building up.
    Charging {
        /// Charges accumulated, in `1..max_charges`.
        charges: u32,
        /// Seconds since the last invocation or decay step.
        idle_seconds: f64,
    },
    /// Fully charged; invocations are refused until the timer runs out.
    Charged {
        /// Seconds left.
        remaining_seconds: f64,
    },
}

/// The charge machine with its tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct IntoneCharge {
    params: IntoneParams,
    state: IntoneState,
}

impl IntoneCharge {
    /// An idle machine.
    pub fn new(params: IntoneParams) -> Self {
        Self {
            params,
            state: IntoneState::Idle,
        }
    }

    /// Restore a stored state. Out-of-range values are normalized.
    pub fn with_state(params: IntoneParams, state: IntoneState) -> Self {
        let state = match state {
            IntoneState::Charging { charges: 0, .. } => IntoneState::Idle,
            IntoneState::Charging { charges, .. } if charges >= params.max_charges => {
                IntoneState::Charged {
                    remaining_seconds: params.charged_duration_secs,
                }
            }
            IntoneState::Charged { remaining_seconds }
                if !remaining_seconds.is_finite() || remaining_seconds <= 0.0 =>
            {
                IntoneState::Idle
            }
            other => other,
        };
        Self { params, state }
    }

    /// Current state.
    pub const fn state(&self) -> IntoneState {
        self.state
    }

    /// Tuning in use.
    pub const fn params(&self) -> &IntoneParams {
        &self.params
    }

    /// Whether an invocation would be accepted.
    pub fn can_charge(&self) -> Result<(), Rejection> {
        match self.state {
            IntoneState::Charged { remaining_seconds } => {
                Err(Rejection::ChargeLocked { remaining_seconds })
            }
            IntoneState::Idle | IntoneState::Charging { .. } => Ok(()),
        }
    }

    /// Add one charge. Reaching the maximum enters `Charged`.
    pub fn invoke(&mut self) -> Result<IntoneState, Rejection> {
        self.can_charge()?;
        let charges = match self.state {
            IntoneState::Charging { charges, .. } => charges.saturating_add(1),
            IntoneState::Idle | IntoneState::Charged { .. } => 1,
        };
        self.state = if charges >= self.params.max_charges {
            debug!(charges, "Intone fully charged");
            IntoneState::Charged {
                remaining_seconds: self.params.charged_duration_secs,
            }
        } else {
            IntoneState::Charging {
                charges,
                idle_seconds: 0.0,
            }
        };
        Ok(self.state)
    }

    /// Advance timers by `dt` seconds: decay charges or run down the charged
    /// timer.
    pub fn advance(&mut self, dt: f64) {
        self.state = match self.state {
            IntoneState::Idle => IntoneState::Idle,
            IntoneState::Charging {
                charges,
                idle_seconds,
            } => {
                let interval = self.params.decay_interval_secs;
                let mut charges = charges;
                let mut idle = idle_seconds + dt;
                if interval > 0.0 {
                    while idle >= interval && charges > 0 {
                        idle -= interval;
                        charges = charges.saturating_sub(1);
                    }
                }
                if charges == 0 {
                    IntoneState::Idle
                } else {
                    IntoneState::Charging {
                        charges,
                        idle_seconds: idle,
                    }
                }
            }
            IntoneState::Charged { remaining_seconds } => {
                let left = remaining_seconds - dt;
                if left > 0.0 {
                    IntoneState::Charged {
                        remaining_seconds: left,
                    }
                } else {
                    debug!("Intone resonance faded");
                    IntoneState::Idle
                }
            }
        };
    }

    /// Combo multiplier applied to regeneration after the clamp.
    pub fn multiplier(&self) -> f64 {
        match self.state {
            IntoneState::Idle => 1.0,
            IntoneState::Charging { charges, .. } => self
                .params
                .per_charge_bonus
                .mul_add(f64::from(charges), 1.0),
            IntoneState::Charged { .. } => self.params.charged_multiplier.max(1.0),
        }
    }
}

impl Default for IntoneCharge {
    fn default() -> Self {
        Self::new(IntoneParams::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn charges_build_to_charged() {
        let mut intone = IntoneCharge::default();
        for expected in 1..5 {
            let state = intone.invoke().unwrap();
            assert_eq!(
                state,
                IntoneState::Charging {
                    charges: expected,
                    idle_seconds: 0.0
                }
            );
        }
        let state = intone.invoke().unwrap();
        assert!(matches!(state, IntoneState::Charged { .. }));
        assert!((intone.multiplier() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn charged_rejects_invocations_until_timer_ends() {
        let mut intone = IntoneCharge::default();
        for _ in 0..5 {
            intone.invoke().unwrap();
        }
        let err = intone.invoke().unwrap_err();
        assert!(matches!(err, Rejection::ChargeLocked { .. }));

        intone.advance(11.0);
        assert!(intone.invoke().is_err());
        intone.advance(1.5);
        assert_eq!(intone.state(), IntoneState::Idle);
        assert!(intone.invoke().is_ok());
    }

    #[test]
    fn idle_intervals_decay_charges() {
        let mut intone = IntoneCharge::default();
        intone.invoke().unwrap();
        intone.invoke().unwrap();
        intone.invoke().unwrap();
        assert!((intone.multiplier() - 1.3).abs() < 1e-12);

        intone.advance(3.9);
        assert!(matches!(intone.state(), IntoneState::Charging { charges: 3, .. }));

        // One large delta can decay several charges.
        intone.advance(8.5);
        assert_eq!(intone.state(), IntoneState::Idle);
        assert!((intone.multiplier() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invocation_resets_the_idle_timer() {
        let mut intone = IntoneCharge::default();
        intone.invoke().unwrap();
        intone.advance(3.0);
        intone.invoke().unwrap();
        intone.advance(3.0);
        assert!(matches!(intone.state(), IntoneState::Charging { charges: 2, .. }));
    }

    #[test]
    fn restored_state_is_normalized() {
        let params = IntoneParams::default();
        let state = IntoneCharge::with_state(
            params,
            IntoneState::Charging {
                charges: 0,
                idle_seconds: 1.0,
            },
        )
        .state();
        assert_eq!(state, IntoneState::Idle);

        let state = IntoneCharge::with_state(
            params,
            IntoneState::Charged {
                remaining_seconds: -2.0,
            },
        )
        .state();
        assert_eq!(state, IntoneState::Idle);
    }
}
