//! Active effects: running buffs, cooldowns and memory slots.
//!
//! A duration recipe registers an [`ActiveBuff`] when cast. Buff-tagged
//! duration recipes hold one memory slot while they run. Each tick the
//! scheduler credits the buff's outputs and debits its upkeep for the part of
//! the tick it was alive, then counts down buffs and cooldowns and drops
//! anything that reached zero.
//!
//! Memory slots come from three places: a base count, Memory Palace levels,
//! and skill milestones. Milestones are claimed once and remembered by id.

use std::collections::{BTreeMap, BTreeSet};

use litany_types::{ActiveBuff, Rejection, RecipeTag, SkillTag};
use tracing::debug;

use crate::pool::{Amounts, Pools};
use crate::recipes::{Recipe, RecipeBook};
use crate::skills::SkillSet;

/// Memory slots available before any upgrade or milestone.
pub const DEFAULT_BASE_SLOTS: u32 = 2;

/// A skill level that grants one extra memory slot the first time it is
/// reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    /// Stable identifier, stored once claimed.
    pub id: &'static str,
    /// The skill watched.
    pub skill: SkillTag,
    /// Level that triggers the grant.
    pub level: u32,
}

/// Milestones that grant memory slots.
pub const MILESTONES: &[Milestone] = &[
    Milestone {
        id: "deep_focus",
        skill: SkillTag::Reflection,
        level: 3,
    },
    Milestone {
        id: "clear_voice",
        skill: SkillTag::Speech,
        level: 5,
    },
];

/// Running buffs, cooldowns and claimed milestones.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectScheduler {
    buffs: Vec<ActiveBuff>,
    cooldowns: BTreeMap<String, f64>,
    base_slots: u32,
    milestones: BTreeSet<String>,
}

impl EffectScheduler {
    /// An empty scheduler.
    pub const fn new(base_slots: u32) -> Self {
        Self {
            buffs: Vec::new(),
            cooldowns: BTreeMap::new(),
            base_slots,
            milestones: BTreeSet::new(),
        }
    }

    /// Rebuild from stored cooldowns and milestones, with no buffs running.
    /// Finished cooldowns are dropped. Buffs go back in through
    /// [`restore_buff`](Self::restore_buff) once slots are known.
    pub fn from_parts(
        base_slots: u32,
        cooldowns: BTreeMap<String, f64>,
        milestones: BTreeSet<String>,
    ) -> Self {
        let cooldowns = cooldowns
            .into_iter()
            .filter(|(_, left)| left.is_finite() && *left > 0.0)
            .collect();
        Self {
            buffs: Vec::new(),
            cooldowns,
            base_slots,
            milestones,
        }
    }

    // ---- Accessors ----

    /// Running buffs, in activation order.
    pub fn buffs(&self) -> &[ActiveBuff] {
        &self.buffs
    }

    /// Remaining cooldowns by recipe name.
    pub const fn cooldowns(&self) -> &BTreeMap<String, f64> {
        &self.cooldowns
    }

    /// Ids of claimed milestones.
    pub const fn claimed_milestones(&self) -> &BTreeSet<String> {
        &self.milestones
    }

    /// Whether `recipe` has a running buff.
    pub fn is_active(&self, recipe: &str) -> bool {
        self.buffs.iter().any(|b| b.recipe == recipe)
    }

    // ---- Memory slots ----

    /// Total memory slots given the Memory Palace level.
    pub fn memory_slots(&self, palace_level: u32) -> u32 {
        let claimed = u32::try_from(self.milestones.len()).unwrap_or(u32::MAX);
        self.base_slots
            .saturating_add(palace_level)
            .saturating_add(claimed)
    }

    /// Buffs currently holding a slot.
    pub fn active_slot_count(&self) -> u32 {
        let count = self.buffs.iter().filter(|b| b.occupies_slot).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Refuse if starting `recipe` would need a slot and none is free.
    /// Refreshing a buff that is already running needs no new slot.
    pub fn ensure_capacity(&self, recipe: &Recipe, palace_level: u32) -> Result<(), Rejection> {
        if !recipe.occupies_slot() || self.is_active(&recipe.name) {
            return Ok(());
        }
        let active = self.active_slot_count();
        let slots = self.memory_slots(palace_level);
        if active >= slots {
            return Err(Rejection::CapacityExceeded { active, slots });
        }
        Ok(())
    }

    /// Claim every milestone whose skill level has been reached. Returns the
    /// ids claimed by this call.
    pub fn claim_milestones(&mut self, skills: &SkillSet) -> Vec<String> {
        let mut claimed = Vec::new();
        for milestone in MILESTONES {
            if skills.level(milestone.skill) >= milestone.level
                && self.milestones.insert(milestone.id.to_owned())
            {
                claimed.push(milestone.id.to_owned());
            }
        }
        claimed
    }

    // ---- Buffs ----

    /// Start (or refresh) the buff for a duration recipe.
    ///
    /// Returns `true` if a new buff was registered, `false` on refresh or if
    /// the recipe has no duration.
    pub fn activate(&mut self, recipe: &Recipe) -> bool {
        let Some(duration) = recipe.duration else {
            return false;
        };
        if let Some(existing) = self.buffs.iter_mut().find(|b| b.recipe == recipe.name) {
            existing.remaining_seconds = duration;
            existing.multiplier = recipe.potency;
            return false;
        }
        self.buffs.push(ActiveBuff {
            recipe: recipe.name.clone(),
            remaining_seconds: duration,
            multiplier: recipe.potency,
            occupies_slot: recipe.occupies_slot(),
        });
        true
    }

    /// Re-register a stored buff with `remaining` seconds left.
    ///
    /// Slot use and multiplier come from `recipe`, never from the stored
    /// record, and the timer is capped at the recipe's duration. A buff that
    /// is already running is left as is.
    pub fn restore_buff(
        &mut self,
        recipe: &Recipe,
        remaining: f64,
        palace_level: u32,
    ) -> Result<(), Rejection> {
        let Some(duration) = recipe.duration else {
            return Err(Rejection::NotSustained {
                recipe: recipe.name.clone(),
            });
        };
        if self.is_active(&recipe.name) {
            return Ok(());
        }
        self.ensure_capacity(recipe, palace_level)?;
        self.buffs.push(ActiveBuff {
            recipe: recipe.name.clone(),
            remaining_seconds: remaining.min(duration),
            multiplier: recipe.potency,
            occupies_slot: recipe.occupies_slot(),
        });
        Ok(())
    }

    /// Stop a running buff early, freeing its slot.
    pub fn deactivate(&mut self, recipe: &str) -> Option<ActiveBuff> {
        let index = self.buffs.iter().position(|b| b.recipe == recipe)?;
        Some(self.buffs.remove(index))
    }

    /// Credit outputs and debit upkeep of every running buff for this tick.
    ///
    /// Each buff acts for `min(dt, remaining)` seconds. A buff whose upkeep
    /// cannot be paid produces nothing this tick. Returns the total credited.
    pub fn apply_buff_effects(&self, book: &RecipeBook, pools: &mut Pools, dt: f64) -> Amounts {
        let mut credited = Amounts::new();
        for buff in &self.buffs {
            let Some(recipe) = book.get(&buff.recipe) else {
                continue;
            };
            let dt_eff = dt.min(buff.remaining_seconds).max(0.0);
            if dt_eff <= 0.0 {
                continue;
            }
            let upkeep: Amounts = recipe
                .upkeep
                .iter()
                .map(|(r, per_sec)| (*r, per_sec * dt_eff))
                .collect();
            if let Err(reason) = pools.pay(&upkeep) {
                debug!(recipe = %buff.recipe, %reason, "Buff upkeep unpaid, skipping");
                continue;
            }
            let gained = pools.credit_all(&recipe.scaled_outputs(buff.multiplier * dt_eff));
            for (resource, amount) in gained {
                *credited.entry(resource).or_insert(0.0) += amount;
            }
        }
        credited
    }

    /// Sum of multipliers of running voice buffs.
    pub fn voice_power(&self, book: &RecipeBook) -> f64 {
        self.buffs
            .iter()
            .filter(|b| {
                book.get(&b.recipe)
                    .is_some_and(|r| r.has_tag(RecipeTag::Voice))
            })
            .map(|b| b.multiplier)
            .sum()
    }

    // ---- Cooldowns ----

    /// Seconds left on `recipe`'s cooldown, if any.
    pub fn cooldown_remaining(&self, recipe: &str) -> Option<f64> {
        self.cooldowns.get(recipe).copied()
    }

    /// Refuse if `recipe` is cooling down.
    pub fn check_cooldown(&self, recipe: &str) -> Result<(), Rejection> {
        match self.cooldown_remaining(recipe) {
            Some(remaining_seconds) => Err(Rejection::OnCooldown {
                recipe: recipe.to_owned(),
                remaining_seconds,
            }),
            None => Ok(()),
        }
    }

    /// Start `recipe`'s cooldown, if it has one.
    pub fn start_cooldown(&mut self, recipe: &Recipe) {
        if let Some(seconds) = recipe.cooldown.filter(|s| *s > 0.0) {
            self.cooldowns.insert(recipe.name.clone(), seconds);
        }
    }

    // ---- Time ----

    /// Count down buffs and cooldowns by `dt`. Returns the names of buffs
    /// that expired.
    pub fn advance(&mut self, dt: f64) -> Vec<String> {
        let mut expired = Vec::new();
        self.buffs.retain_mut(|buff| {
            buff.remaining_seconds -= dt;
            if buff.remaining_seconds > 0.0 {
                true
            } else {
                expired.push(buff.recipe.clone());
                false
            }
        });
        self.cooldowns.retain(|_, left| {
            *left -= dt;
            *left > 0.0
        });
        expired
    }
}

impl Default for EffectScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_SLOTS)
    }
}
