//! Outcome types for player actions.
//!
//! Every player-facing entry point (craft, cast, toggle, purchase) reports a
//! structured result. Failures are described by [`Rejection`]: they are
//! local, recoverable, and never mutate state.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::UpgradeKind;

/// Why a player action was refused.
///
/// The `Display` implementation is the human-readable reason shown to the
/// player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Rejection {
    /// The craft selection was empty, too large, or contained duplicates.
    #[error("invalid selection: {reason}")]
    InvalidSelection {
        /// What is wrong with the selection.
        reason: String,
    },

    /// No unlocked recipe accepts the selected resources.
    #[error("nothing can be made from that selection")]
    NoMatchingRecipe,

    /// The named recipe exists but has not been unlocked yet.
    #[error("{recipe} has not been unlocked")]
    RecipeLocked {
        /// The locked recipe.
        recipe: String,
    },

    /// The named recipe does not exist in the book.
    #[error("unknown recipe: {recipe}")]
    UnknownRecipe {
        /// The requested name.
        recipe: String,
    },

    /// A skill, resource, or affordability requirement is not met.
    #[error("{reason}")]
    RequirementNotMet {
        /// Human-readable explanation.
        reason: String,
    },

    /// The recipe is still cooling down.
    #[error("{recipe} is cooling down ({remaining_seconds:.1}s left)")]
    OnCooldown {
        /// The cooling recipe.
        recipe: String,
        /// Seconds until it can be cast again.
        remaining_seconds: f64,
    },

    /// Every memory slot is occupied.
    #[error("all {slots} memory slots are in use")]
    CapacityExceeded {
        /// Buffs currently holding a slot.
        active: u32,
        /// Total memory slots.
        slots: u32,
    },

    /// The Intone charge is fully built and its timer is still running.
    #[error("the intonation is already resonating ({remaining_seconds:.1}s left)")]
    ChargeLocked {
        /// Seconds until charging is possible again.
        remaining_seconds: f64,
    },

    /// The upgrade is already at its maximum level.
    #[error("{upgrade} is already at its maximum level ({max_level})")]
    MaxLevelReached {
        /// The capped upgrade.
        upgrade: UpgradeKind,
        /// Its maximum level.
        max_level: u32,
    },

    /// The recipe is not a duration recipe and cannot be toggled.
    #[error("{recipe} is not a sustained recipe")]
    NotSustained {
        /// The recipe that was toggled.
        recipe: String,
    },
}

impl Rejection {
    /// Shorthand for [`Rejection::RequirementNotMet`].
    pub fn requirement(reason: impl Into<String>) -> Self {
        Self::RequirementNotMet {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`Rejection::InvalidSelection`].
    pub fn selection(reason: impl Into<String>) -> Self {
        Self::InvalidSelection {
            reason: reason.into(),
        }
    }
}

/// Result of a craft attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CraftOutcome {
    /// Whether a recipe was applied.
    pub success: bool,
    /// The matched recipe, when one was found (also set on some failures,
    /// e.g. cooldowns, so the UI can highlight it).
    pub recipe: Option<String>,
    /// Why the craft failed, when it did.
    pub rejection: Option<Rejection>,
}

impl CraftOutcome {
    /// A successful craft of `recipe`.
    pub fn applied(recipe: impl Into<String>) -> Self {
        Self {
            success: true,
            recipe: Some(recipe.into()),
            rejection: None,
        }
    }

    /// A failed craft with no recipe attached.
    pub const fn rejected(rejection: Rejection) -> Self {
        Self {
            success: false,
            recipe: None,
            rejection: Some(rejection),
        }
    }

    /// A failed craft that did resolve to `recipe`.
    pub fn rejected_for(recipe: impl Into<String>, rejection: Rejection) -> Self {
        Self {
            success: false,
            recipe: Some(recipe.into()),
            rejection: Some(rejection),
        }
    }

    /// The human-readable failure reason, if any.
    pub fn reason(&self) -> Option<String> {
        self.rejection.as_ref().map(ToString::to_string)
    }
}
