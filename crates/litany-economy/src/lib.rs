//! Economy rules for the Litany incremental game engine.
//!
//! Everything here is a pure state transition over explicit values: no I/O,
//! no clocks, no global state. Randomness is passed in by the caller. The
//! tick driver in `litany-core` sequences these pieces.
//!
//! # Modules
//!
//! - [`pool`] -- Bounded resource pools and atomic multi-resource payments
//! - [`skills`] -- XP and geometric level thresholds
//! - [`upgrades`] -- Upgrade costs, caps and derived capacities
//! - [`regen`] -- Logistic regeneration curve and its multiplier stack
//! - [`recipes`] -- The ordered recipe book and unlock evaluation
//! - [`crafting`] -- Selection matching and recipe application
//! - [`effects`] -- Running buffs, cooldowns and memory slots
//! - [`intone`] -- The Intone charge machine (combo multiplier)
//! - [`recruitment`] -- The follower lottery and attribute allocation
//! - [`error`] -- Contract-violation errors

pub mod crafting;
pub mod effects;
pub mod error;
pub mod intone;
pub mod pool;
pub mod recipes;
pub mod recruitment;
pub mod regen;
pub mod skills;
pub mod upgrades;

pub use crafting::{CraftFailure, CraftReport, MAX_SELECTION, Selection, Workshop};
pub use effects::{EffectScheduler, MILESTONES, Milestone};
pub use error::EconomyError;
pub use intone::{IntoneCharge, IntoneParams, IntoneState};
pub use pool::{Amounts, Pools, ResourcePool};
pub use recipes::{Recipe, RecipeBook, Requirements};
pub use recruitment::{MAX_RECRUIT_POINTS, RecruitParams};
pub use regen::{RegenInputs, RegenParams};
pub use skills::{Skill, SkillSet};
pub use upgrades::{Cost, UpgradeLedger};
