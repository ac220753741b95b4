//! Skill system: XP tracking with geometric level thresholds.
//!
//! # Level Formula
//!
//! The XP needed to advance from level `L` to `L + 1` is
//! `threshold(L) = round(50 * 1.2^L)`:
//!
//! | Level | Threshold | Cumulative XP to reach next |
//! |-------|-----------|-----------------------------|
//! | 0     | 50        | 50                          |
//! | 1     | 60        | 110                         |
//! | 2     | 72        | 182                         |
//! | 3     | 86        | 268                         |
//! | 4     | 104       | 372                         |
//!
//! The level is *derived* from XP on every read path. Nothing stores a level
//! that could drift out of sync with the XP that produced it.

use std::collections::BTreeMap;

use litany_types::{SkillTag, SkillView};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// XP needed to go from level 0 to level 1.
pub const BASE_THRESHOLD: f64 = 50.0;

/// Geometric growth of the per-level threshold.
pub const THRESHOLD_GROWTH: f64 = 1.2;

/// Hard cap on derived levels, bounding the derivation loop.
pub const MAX_SKILL_LEVEL: u32 = 200;

// ---------------------------------------------------------------------------
// Level derivation
// ---------------------------------------------------------------------------

/// XP required to advance from `level` to `level + 1`.
pub fn threshold(level: u32) -> f64 {
    let exponent = i32::try_from(level).unwrap_or(i32::MAX);
    (BASE_THRESHOLD * THRESHOLD_GROWTH.powi(exponent)).round()
}

/// Total XP required to reach `level` from zero.
pub fn cumulative_xp(level: u32) -> f64 {
    (0..level).map(threshold).sum()
}

/// The largest level `L` such that the thresholds for `0..L` sum to at most
/// `xp`. Non-finite or negative XP maps to level 0.
pub fn level_for_xp(xp: f64) -> u32 {
    if !xp.is_finite() || xp <= 0.0 {
        return 0;
    }
    let mut level: u32 = 0;
    let mut spent = 0.0;
    while level < MAX_SKILL_LEVEL {
        let next = spent + threshold(level);
        if next > xp {
            break;
        }
        spent = next;
        level = level.saturating_add(1);
    }
    level
}

// ---------------------------------------------------------------------------
// Skill
// ---------------------------------------------------------------------------

/// XP tracker for one skill.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Skill {
    xp: f64,
    level: u32,
}

impl Skill {
    /// Rebuild a skill from stored XP. The level is recomputed.
    pub fn from_xp(xp: f64) -> Self {
        let xp = if xp.is_finite() { xp.max(0.0) } else { 0.0 };
        Self {
            xp,
            level: level_for_xp(xp),
        }
    }

    /// Accumulated XP.
    pub const fn xp(&self) -> f64 {
        self.xp
    }

    /// Current level, derived from XP.
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// XP still needed for the next level.
    pub fn xp_to_next(&self) -> f64 {
        let next = self.level.saturating_add(1);
        (cumulative_xp(next) - self.xp).max(0.0)
    }

    /// Add XP and recompute the level.
    ///
    /// Returns `Some(new_level)` if the level rose. Non-positive and
    /// non-finite grants are ignored, so the level never decreases.
    pub fn grant(&mut self, amount: f64) -> Option<u32> {
        if !amount.is_finite() || amount <= 0.0 {
            return None;
        }
        let before = self.level;
        self.xp += amount;
        self.level = level_for_xp(self.xp);
        (self.level > before).then_some(self.level)
    }
}

// ---------------------------------------------------------------------------
// SkillSet
// ---------------------------------------------------------------------------

/// All skills of the player.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillSet {
    skills: BTreeMap<SkillTag, Skill>,
}

impl SkillSet {
    /// Every skill at zero XP.
    pub fn new() -> Self {
        Self {
            skills: SkillTag::ALL.iter().map(|t| (*t, Skill::default())).collect(),
        }
    }

    /// Rebuild from stored XP values. Levels are re-derived.
    pub fn from_xp_map(xp: &BTreeMap<SkillTag, f64>) -> Self {
        let mut set = Self::new();
        for (tag, value) in xp {
            set.skills.insert(*tag, Skill::from_xp(*value));
        }
        set
    }

    /// Borrow one skill.
    pub fn get(&self, tag: SkillTag) -> Skill {
        self.skills.get(&tag).copied().unwrap_or_default()
    }

    /// Level of one skill.
    pub fn level(&self, tag: SkillTag) -> u32 {
        self.get(tag).level()
    }

    /// Grant XP to one skill. Returns the new level on level-up.
    pub fn grant(&mut self, tag: SkillTag, amount: f64) -> Option<u32> {
        self.skills.entry(tag).or_default().grant(amount)
    }

    /// XP per skill, for snapshots.
    pub fn xp_map(&self) -> BTreeMap<SkillTag, f64> {
        self.skills.iter().map(|(t, s)| (*t, s.xp())).collect()
    }

    /// Read-only views for rendering.
    pub fn views(&self) -> Vec<SkillView> {
        self.skills
            .iter()
            .map(|(skill, s)| SkillView {
                skill: *skill,
                xp: s.xp(),
                level: s.level(),
                xp_to_next: s.xp_to_next(),
            })
            .collect()
    }
}

impl Default for SkillSet {
    fn default() -> Self {
        Self::new()
    }
}
