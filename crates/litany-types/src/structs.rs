//! Core entity structs shared between the engine and its collaborators.
//!
//! These are the read-only shapes handed to the rendering layer: followers,
//! running buffs, the weather overlay and pool, skill and recipe views.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{RecipeTag, Resource, Season, SkillTag, Weather};
use crate::ids::FollowerId;

// ---------------------------------------------------------------------------
// Followers
// ---------------------------------------------------------------------------

/// The four attributes of a follower. Every value is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Attributes {
    /// Physical power.
    pub strength: u32,
    /// Agility and precision.
    pub dexterity: u32,
    /// Staying power.
    pub endurance: u32,
    /// Wit.
    pub intelligence: u32,
}

impl Attributes {
    /// Sum of all four attributes.
    pub const fn total(&self) -> u32 {
        self.strength
            .saturating_add(self.dexterity)
            .saturating_add(self.endurance)
            .saturating_add(self.intelligence)
    }

    /// The smallest of the four attributes.
    pub fn min_value(&self) -> u32 {
        self.strength
            .min(self.dexterity)
            .min(self.endurance)
            .min(self.intelligence)
    }
}

/// A recruited follower (disciple).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Follower {
    /// Sequential identifier.
    pub id: FollowerId,
    /// Randomly allocated attributes.
    pub attributes: Attributes,
}

// ---------------------------------------------------------------------------
// Crafting
// ---------------------------------------------------------------------------

/// One selectable unit on the crafting board: the `index`-th token of a
/// resource. Two tokens of the same resource are distinct selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Token {
    /// Which resource the token stands for.
    pub resource: Resource,
    /// Position among the tokens of that resource.
    pub index: u32,
}

impl Token {
    /// Token `index` of `resource`.
    pub const fn new(resource: Resource, index: u32) -> Self {
        Self { resource, index }
    }
}

// ---------------------------------------------------------------------------
// Active effects
// ---------------------------------------------------------------------------

/// A running duration recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActiveBuff {
    /// Name of the recipe that produced this buff.
    pub recipe: String,
    /// Seconds left before the buff expires. Always positive while stored.
    pub remaining_seconds: f64,
    /// Scale applied to the recipe's per-second outputs.
    pub multiplier: f64,
    /// Whether this buff holds a memory slot.
    pub occupies_slot: bool,
}

/// A transient weather event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WeatherOverlay {
    /// The kind of weather.
    pub kind: Weather,
    /// Regeneration multiplier while active.
    pub multiplier: f64,
    /// Seconds until the weather clears.
    pub remaining_seconds: f64,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Read-only view of a resource pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PoolView {
    /// Which resource.
    pub resource: Resource,
    /// Current amount.
    pub current: f64,
    /// Capacity.
    pub max: f64,
    /// Whether the pool has ever been credited.
    pub unlocked: bool,
}

/// Read-only view of a skill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SkillView {
    /// Which skill.
    pub skill: SkillTag,
    /// Accumulated XP.
    pub xp: f64,
    /// Level derived from `xp`.
    pub level: u32,
    /// XP still needed for the next level.
    pub xp_to_next: f64,
}

/// Read-only view of a recipe, as listed in the recipe panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RecipeView {
    /// Recipe name.
    pub name: String,
    /// Whether the recipe can be used.
    pub unlocked: bool,
    /// What one cast debits.
    pub cost: BTreeMap<Resource, f64>,
    /// Behaviour tags.
    pub tags: BTreeSet<RecipeTag>,
    /// Seconds of cooldown left, if cooling down.
    pub cooldown_remaining: Option<f64>,
    /// Whether a buff from this recipe is running.
    pub active: bool,
}

/// Read-only view of the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CalendarView {
    /// Current season.
    pub season: Season,
    /// Index of the season within the configured cycle.
    pub season_index: u32,
    /// Zero-based day within the season.
    pub day_in_season: u32,
    /// Season regeneration multiplier.
    pub multiplier: f64,
    /// Weather overlay, if any.
    pub weather: Option<WeatherOverlay>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_totals() {
        let attrs = Attributes {
            strength: 3,
            dexterity: 1,
            endurance: 2,
            intelligence: 1,
        };
        assert_eq!(attrs.total(), 7);
        assert_eq!(attrs.min_value(), 1);
    }
}
