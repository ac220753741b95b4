//! Enumeration types for the Litany economy.
//!
//! Resources, skill tags, recipe tags, seasons, weather kinds and upgrade
//! kinds. Every enum has a stable snake-case identifier used in configuration
//! files, craft selections and the rendering layer.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Error returned when an identifier does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} identifier: {value}")]
pub struct ParseIdentError {
    /// Which enum was being parsed (e.g. `"resource"`).
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Implements `as_str`, `Display` and `FromStr` from a variant/identifier table.
macro_rules! identifiers {
    ($ty:ident, $kind:literal, { $($variant:ident => $ident:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The stable snake-case identifier for this variant.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $ident),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseIdentError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($ident => Ok(Self::$variant),)+
                    other => Err(ParseIdentError {
                        kind: $kind,
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A bounded, regenerating quantity held by the player.
///
/// [`Resource::Insight`] is the primary pool: it is the only one driven by
/// the regeneration curve. The others are produced by crafting and buffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Resource {
    /// Primary resource, regenerates passively.
    Insight,
    /// Produced by murmuring; the raw material of speech.
    Sound,
    /// Produced by contemplation.
    Thought,
    /// Articulated from thought and sound; fuels sustained recipes.
    Word,
}

identifiers!(Resource, "resource", {
    Insight => "insight",
    Sound => "sound",
    Thought => "thought",
    Word => "word",
});

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

/// A skill that accumulates XP from crafting and recruitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SkillTag {
    /// Vocal recipes (murmur, intone, articulate).
    Speech,
    /// Contemplative recipes.
    Reflection,
    /// Sustained generator recipes.
    Resonance,
    /// Recruitment of followers.
    Calling,
}

identifiers!(SkillTag, "skill", {
    Speech => "speech",
    Reflection => "reflection",
    Resonance => "resonance",
    Calling => "calling",
});

// ---------------------------------------------------------------------------
// Recipe Tags
// ---------------------------------------------------------------------------

/// Behavioural tags attached to a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RecipeTag {
    /// Produces its outputs immediately when cast.
    SingleCast,
    /// Produces outputs every tick while running.
    Generator,
    /// Occupies a memory slot while running.
    Buff,
    /// Runs for a fixed number of seconds.
    Duration,
    /// Consumes upkeep every tick while running.
    Drain,
    /// Contributes to calling power.
    Voice,
}

identifiers!(RecipeTag, "recipe tag", {
    SingleCast => "single_cast",
    Generator => "generator",
    Buff => "buff",
    Duration => "duration",
    Drain => "drain",
    Voice => "voice",
});

// ---------------------------------------------------------------------------
// Seasons
// ---------------------------------------------------------------------------

/// The season of the in-game year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Season {
    /// Regeneration +25%.
    Spring,
    /// Normal regeneration.
    Summer,
    /// Regeneration -25%.
    Autumn,
    /// Regeneration -50%.
    Winter,
}

identifiers!(Season, "season", {
    Spring => "spring",
    Summer => "summer",
    Autumn => "autumn",
    Winter => "winter",
});

impl Season {
    /// Multiplier applied to primary regeneration during this season.
    pub const fn regen_multiplier(self) -> f64 {
        match self {
            Self::Spring => 1.25,
            Self::Summer => 1.0,
            Self::Autumn => 0.75,
            Self::Winter => 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// A transient weather event layered on top of the season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Weather {
    /// Gentle rain, regeneration +10%.
    Rain,
    /// Regeneration -30%.
    Storm,
    /// Regeneration -20%.
    Drought,
    /// Regeneration -40%.
    Snow,
    /// Rare lights in the sky, regeneration +50%.
    Aurora,
}

identifiers!(Weather, "weather", {
    Rain => "rain",
    Storm => "storm",
    Drought => "drought",
    Snow => "snow",
    Aurora => "aurora",
});

impl Weather {
    /// Multiplier applied to primary regeneration while this weather lasts.
    pub const fn regen_multiplier(self) -> f64 {
        match self {
            Self::Rain => 1.1,
            Self::Storm => 0.7,
            Self::Drought => 0.8,
            Self::Snow => 0.6,
            Self::Aurora => 1.5,
        }
    }
}

// ---------------------------------------------------------------------------
// Upgrades
// ---------------------------------------------------------------------------

/// A purchasable upgrade in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum UpgradeKind {
    /// Raises the regeneration upgrade level.
    InsightFlow,
    /// Raises the insight pool maximum.
    InsightVessel,
    /// Raises the sound pool maximum.
    SoundVessel,
    /// Raises the thought pool maximum.
    ThoughtVessel,
    /// Grants one memory slot per level.
    MemoryPalace,
    /// Enables the idle-follower regeneration bonus.
    IdleChorus,
    /// Moves the regeneration midpoint higher.
    Clarity,
}

identifiers!(UpgradeKind, "upgrade", {
    InsightFlow => "insight_flow",
    InsightVessel => "insight_vessel",
    SoundVessel => "sound_vessel",
    ThoughtVessel => "thought_vessel",
    MemoryPalace => "memory_palace",
    IdleChorus => "idle_chorus",
    Clarity => "clarity",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn resource_identifiers_parse() {
        assert_eq!("insight".parse::<Resource>().unwrap(), Resource::Insight);
        assert_eq!(" Sound ".parse::<Resource>().unwrap(), Resource::Sound);
        assert!("gold".parse::<Resource>().is_err());
    }

    #[test]
    fn display_matches_serde() {
        for resource in Resource::ALL {
            let json = serde_json::to_string(resource).unwrap();
            assert_eq!(json, format!("\"{resource}\""));
        }
        for kind in UpgradeKind::ALL {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn parse_error_names_the_kind() {
        let err = "monsoon".parse::<Weather>().unwrap_err();
        assert_eq!(err.to_string(), "unknown weather identifier: monsoon");
    }

    #[test]
    fn summer_is_neutral() {
        assert!((Season::Summer.regen_multiplier() - 1.0).abs() < f64::EPSILON);
    }
}
