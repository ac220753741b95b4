//! Change notifications emitted by the engine.
//!
//! There is one variant per mutation category so a rendering layer can
//! subscribe to exactly what it draws instead of polling engine state.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Season, SkillTag, UpgradeKind, Weather};
use crate::ids::FollowerId;

/// A notification describing something that changed inside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EngineEvent {
    /// One or more pools changed. Emitted after every tick and every
    /// successful mutating action.
    ResourcesChanged,
    /// A recipe became available.
    RecipeUnlocked {
        /// The unlocked recipe.
        recipe: String,
    },
    /// A follower joined.
    FollowerGained {
        /// The new follower.
        follower: FollowerId,
    },
    /// The season rolled over.
    SeasonChanged {
        /// The new season.
        season: Season,
    },
    /// A weather event started (`Some`) or cleared (`None`).
    WeatherChanged {
        /// The new weather.
        weather: Option<Weather>,
    },
    /// A skill reached a new level.
    SkillLevelUp {
        /// The skill.
        skill: SkillTag,
        /// Its new level.
        level: u32,
    },
    /// A duration recipe started running.
    BuffStarted {
        /// The recipe.
        recipe: String,
    },
    /// A duration recipe stopped running.
    BuffExpired {
        /// The recipe.
        recipe: String,
    },
    /// An upgrade was purchased.
    UpgradePurchased {
        /// The upgrade.
        upgrade: UpgradeKind,
        /// Its new level.
        level: u32,
    },
    /// A skill milestone granted an extra memory slot.
    MemorySlotGranted {
        /// Stable identifier of the milestone.
        milestone: String,
        /// Total memory slots after the grant.
        slots: u32,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = EngineEvent::SeasonChanged {
            season: Season::Winter,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "season_changed");
        assert_eq!(json["season"], "winter");
    }
}
