//! Shared type definitions for the Litany incremental game engine.
//!
//! This crate is the single source of truth for the shapes that cross the
//! engine boundary. Types flow downstream to `TypeScript` via `ts-rs` for the
//! rendering layer.
//!
//! # Modules
//!
//! - [`actions`] -- Craft outcomes and the [`Rejection`] taxonomy
//! - [`enums`] -- Resources, skills, recipe tags, seasons, weather, upgrades
//! - [`events`] -- Change notifications ([`EngineEvent`])
//! - [`ids`] -- Type-safe identifiers
//! - [`structs`] -- Followers, craft tokens, buffs, weather overlays and views

pub mod actions;
pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{CraftOutcome, Rejection};
pub use enums::{ParseIdentError, RecipeTag, Resource, Season, SkillTag, UpgradeKind, Weather};
pub use events::EngineEvent;
pub use ids::FollowerId;
pub use structs::{
    ActiveBuff, Attributes, CalendarView, Follower, PoolView, RecipeView, SkillView, Token,
    WeatherOverlay,
};
