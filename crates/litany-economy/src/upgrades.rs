//! Purchasable upgrades.
//!
//! Every upgrade is a level counter. Costs and derived stats are pure
//! functions of the level, so pool maxima are always recomputed from the base
//! capacity and the current levels, never patched incrementally.
//!
//! | Upgrade        | Effect                                   | Max |
//! |----------------|------------------------------------------|-----|
//! | Insight Flow   | regen curve level                        | --  |
//! | Insight Vessel | insight capacity `base * (1 + 0.25 L)`   | --  |
//! | Sound Vessel   | sound capacity `base + 10 L`             | --  |
//! | Thought Vessel | thought capacity `base + 5 L`            | --  |
//! | Memory Palace  | one memory slot per level                | 3   |
//! | Idle Chorus    | idle-worker regen bonus                  | 1   |
//! | Clarity        | switches the regen midpoint              | 1   |

use std::collections::BTreeMap;

use litany_types::{Rejection, Resource, SkillTag, UpgradeKind};
use tracing::info;

use crate::pool::{Amounts, Pools};
use crate::skills::SkillSet;

/// Price of the next level of an upgrade.
#[derive(Debug, Clone, PartialEq)]
pub enum Cost {
    /// An amount of the primary resource (insight).
    Primary(f64),
    /// Amounts of several resources.
    Mixed(Amounts),
}

impl Cost {
    /// Normalize to a resource map.
    pub fn to_amounts(&self) -> Amounts {
        match self {
            Self::Primary(amount) => Amounts::from([(Resource::Insight, *amount)]),
            Self::Mixed(amounts) => amounts.clone(),
        }
    }
}

fn geometric(base: f64, growth: f64, level: u32) -> f64 {
    let exponent = i32::try_from(level).unwrap_or(i32::MAX);
    (base * growth.powi(exponent)).round()
}

/// Cost of buying `kind` when it currently sits at `level`.
pub fn cost(kind: UpgradeKind, level: u32) -> Cost {
    let l = f64::from(level);
    match kind {
        UpgradeKind::InsightFlow => Cost::Primary(geometric(20.0, 1.45, level)),
        UpgradeKind::InsightVessel => Cost::Primary(geometric(50.0, 1.6, level)),
        UpgradeKind::SoundVessel => Cost::Mixed(Amounts::from([
            (Resource::Insight, geometric(40.0, 1.5, level)),
            (Resource::Sound, 2.0f64.mul_add(l, 5.0)),
        ])),
        UpgradeKind::ThoughtVessel => Cost::Mixed(Amounts::from([
            (Resource::Insight, geometric(60.0, 1.5, level)),
            (Resource::Thought, 3.0 + l),
        ])),
        UpgradeKind::MemoryPalace => Cost::Mixed(Amounts::from([
            (Resource::Insight, geometric(150.0, 2.0, level)),
            (Resource::Thought, geometric(4.0, 2.0, level)),
        ])),
        UpgradeKind::IdleChorus => Cost::Primary(300.0),
        UpgradeKind::Clarity => Cost::Mixed(Amounts::from([
            (Resource::Insight, 600.0),
            (Resource::Word, 2.0),
        ])),
    }
}

/// Highest purchasable level, if capped.
pub const fn max_level(kind: UpgradeKind) -> Option<u32> {
    match kind {
        UpgradeKind::MemoryPalace => Some(3),
        UpgradeKind::IdleChorus | UpgradeKind::Clarity => Some(1),
        UpgradeKind::InsightFlow
        | UpgradeKind::InsightVessel
        | UpgradeKind::SoundVessel
        | UpgradeKind::ThoughtVessel => None,
    }
}

/// Skill prerequisite for purchasing `kind`.
pub const fn prerequisite(kind: UpgradeKind) -> Option<(SkillTag, u32)> {
    match kind {
        UpgradeKind::Clarity => Some((SkillTag::Reflection, 4)),
        _ => None,
    }
}

/// Upgrade levels owned by the player.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpgradeLedger {
    levels: BTreeMap<UpgradeKind, u32>,
}

impl UpgradeLedger {
    /// A ledger with nothing purchased.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored levels. Levels above an upgrade's cap are clamped.
    pub fn from_levels(levels: &BTreeMap<UpgradeKind, u32>) -> Self {
        let levels = levels
            .iter()
            .filter(|(_, level)| **level > 0)
            .map(|(kind, level)| {
                let capped = max_level(*kind).map_or(*level, |cap| (*level).min(cap));
                (*kind, capped)
            })
            .collect();
        Self { levels }
    }

    /// Owned levels, for snapshots.
    pub fn levels(&self) -> &BTreeMap<UpgradeKind, u32> {
        &self.levels
    }

    /// Level of one upgrade.
    pub fn level(&self, kind: UpgradeKind) -> u32 {
        self.levels.get(&kind).copied().unwrap_or(0)
    }

    /// Level fed into the regen curve.
    pub fn regen_level(&self) -> u32 {
        self.level(UpgradeKind::InsightFlow)
    }

    /// Whether idle workers boost regeneration.
    pub fn idle_bonus_active(&self) -> bool {
        self.level(UpgradeKind::IdleChorus) > 0
    }

    /// Whether the regen midpoint has been switched.
    pub fn clarity_owned(&self) -> bool {
        self.level(UpgradeKind::Clarity) > 0
    }

    /// Extra memory slots bought.
    pub fn memory_slot_bonus(&self) -> u32 {
        self.level(UpgradeKind::MemoryPalace)
    }

    /// Capacity of `resource` given its base capacity.
    pub fn capacity(&self, resource: Resource, base: f64) -> f64 {
        match resource {
            Resource::Insight => {
                base * 0.25f64.mul_add(f64::from(self.level(UpgradeKind::InsightVessel)), 1.0)
            }
            Resource::Sound => 10.0f64.mul_add(f64::from(self.level(UpgradeKind::SoundVessel)), base),
            Resource::Thought => {
                5.0f64.mul_add(f64::from(self.level(UpgradeKind::ThoughtVessel)), base)
            }
            Resource::Word => base,
        }
    }

    /// Recompute every pool maximum from `base` capacities and current levels.
    pub fn apply_capacities(&self, pools: &mut Pools, base: &Amounts) {
        for (resource, base_max) in base {
            pools.set_max(*resource, self.capacity(*resource, *base_max));
        }
    }

    /// Price of the next level of `kind`.
    pub fn next_cost(&self, kind: UpgradeKind) -> Cost {
        cost(kind, self.level(kind))
    }

    /// Check every purchase condition without mutating anything.
    pub fn check(&self, kind: UpgradeKind, pools: &Pools, skills: &SkillSet) -> Result<Amounts, Rejection> {
        let level = self.level(kind);
        if let Some(max_level) = max_level(kind) {
            if level >= max_level {
                return Err(Rejection::MaxLevelReached {
                    upgrade: kind,
                    max_level,
                });
            }
        }
        if let Some((skill, needed)) = prerequisite(kind) {
            let have = skills.level(skill);
            if have < needed {
                return Err(Rejection::requirement(format!(
                    "{kind} requires {skill} level {needed} (currently {have})"
                )));
            }
        }
        let price = self.next_cost(kind).to_amounts();
        pools.check_affordable(&price)?;
        Ok(price)
    }

    /// Buy one level of `kind`: check, debit, increment, then recompute pool
    /// maxima from `base`.
    ///
    /// Returns the new level.
    pub fn purchase(
        &mut self,
        kind: UpgradeKind,
        pools: &mut Pools,
        skills: &SkillSet,
        base: &Amounts,
    ) -> Result<u32, Rejection> {
        let price = self.check(kind, pools, skills)?;
        pools.pay(&price)?;
        let entry = self.levels.entry(kind).or_insert(0);
        *entry = entry.saturating_add(1);
        let level = *entry;
        self.apply_capacities(pools, base);
        info!(upgrade = %kind, level, "Upgrade purchased");
        Ok(level)
    }
}
