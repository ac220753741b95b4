//! The mutable state owned by one engine instance.

use std::collections::BTreeMap;

use litany_economy::{
    Amounts, EffectScheduler, IntoneCharge, Pools, RecipeBook, RecruitParams, RegenInputs,
    RegenParams, ResourcePool, SkillSet, UpgradeLedger, Workshop,
};
use litany_types::{Follower, FollowerId, Resource};

use crate::clock::SeasonClock;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::weather::WeatherSystem;

/// All state the tick driver and the player actions work on.
///
/// Everything here is plain data; there is no global state. Derived values
/// (levels, maxima, the season) are recomputed from it on demand.
#[derive(Debug, Clone)]
pub struct EngineState {
    /// Resource pools.
    pub pools: Pools,
    /// Player skills.
    pub skills: SkillSet,
    /// Purchased upgrade levels.
    pub upgrades: UpgradeLedger,
    /// Recipes and their unlock flags.
    pub book: RecipeBook,
    /// Running buffs, cooldowns and claimed milestones.
    pub effects: EffectScheduler,
    /// The Intone charge machine.
    pub intone: IntoneCharge,
    /// Day and season counter.
    pub clock: SeasonClock,
    /// Weather roller and overlay.
    pub weather: WeatherSystem,
    /// Recruited followers, in recruitment order.
    pub followers: Vec<Follower>,
    /// Followers assigned to some task, and therefore not idle.
    pub assigned_followers: u32,
    /// Regeneration curve tuning.
    pub regen: RegenParams,
    /// Recruitment tuning.
    pub recruitment: RecruitParams,
    /// Pool capacities before upgrades.
    pub base_maxima: Amounts,
    /// Total simulated seconds.
    pub elapsed_seconds: f64,
    /// Ticks run so far.
    pub ticks: u64,
    /// Primary regeneration rate computed by the latest tick.
    pub last_regen_rate: f64,
}

impl EngineState {
    /// Fresh state from configuration, using the standard recipe book.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if a pool spec, the recipe book or the time
    /// configuration is invalid.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        Self::with_book(config, RecipeBook::standard()?)
    }

    /// Fresh state from configuration with a custom recipe book.
    ///
    /// # Errors
    ///
    /// Same conditions as [`EngineState::new`].
    pub fn with_book(config: &EngineConfig, book: RecipeBook) -> Result<Self, EngineError> {
        let mut pools = BTreeMap::new();
        for resource in Resource::ALL {
            let spec = config.pools.spec(*resource);
            pools.insert(
                *resource,
                ResourcePool::with_current(spec.start, spec.max, spec.unlocked)?,
            );
        }
        let mut state = Self {
            pools: Pools::from_map(pools),
            skills: SkillSet::new(),
            upgrades: UpgradeLedger::new(),
            book,
            effects: EffectScheduler::new(config.effects.base_memory_slots),
            intone: IntoneCharge::new(config.intone),
            clock: SeasonClock::new(&config.time)?,
            weather: WeatherSystem::new(config.weather.clone()),
            followers: Vec::new(),
            assigned_followers: 0,
            regen: config.regen,
            recruitment: config.recruitment,
            base_maxima: config.pools.base_maxima(),
            elapsed_seconds: 0.0,
            ticks: 0,
            last_regen_rate: 0.0,
        };
        state.book.evaluate_unlocks(&state.pools, &state.skills);
        Ok(state)
    }

    /// Number of recruited followers.
    pub fn follower_count(&self) -> u32 {
        u32::try_from(self.followers.len()).unwrap_or(u32::MAX)
    }

    /// Followers not assigned to any task.
    pub fn idle_workers(&self) -> u32 {
        self.follower_count()
            .saturating_sub(self.assigned_followers)
    }

    /// Id for the next recruited follower.
    pub fn next_follower_id(&self) -> FollowerId {
        self.followers
            .iter()
            .map(|f| f.id)
            .max()
            .and_then(FollowerId::next)
            .unwrap_or(FollowerId::FIRST)
    }

    /// Current Memory Palace level.
    pub fn palace_level(&self) -> u32 {
        self.upgrades.memory_slot_bonus()
    }

    /// Total memory slots right now.
    pub fn memory_slots(&self) -> u32 {
        self.effects.memory_slots(self.palace_level())
    }

    /// Inputs to the primary regeneration rate, as things stand.
    pub fn regen_inputs(&self) -> RegenInputs {
        RegenInputs {
            current: self.pools.current(Resource::Insight),
            upgrade_level: self.upgrades.regen_level(),
            idle_workers: self.idle_workers(),
            idle_bonus_enabled: self.upgrades.idle_bonus_active(),
            clarity: self.upgrades.clarity_owned(),
            season_multiplier: self.clock.multiplier(),
            weather_multiplier: self.weather.multiplier(),
            combo_multiplier: self.intone.multiplier(),
        }
    }

    /// Split the state into the recipe book and the parts a craft mutates.
    pub fn workshop(&mut self) -> (&RecipeBook, Workshop<'_>) {
        let palace_level = self.upgrades.memory_slot_bonus();
        (
            &self.book,
            Workshop {
                pools: &mut self.pools,
                skills: &mut self.skills,
                effects: &mut self.effects,
                intone: &mut self.intone,
                palace_level,
            },
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use litany_types::Attributes;

    #[test]
    fn fresh_state_follows_config() {
        let state = EngineState::new(&EngineConfig::default()).unwrap();
        let insight = state.pools.get(Resource::Insight).unwrap();
        assert!(insight.unlocked());
        assert!((insight.max() - 1200.0).abs() < f64::EPSILON);
        assert!(!state.pools.get(Resource::Word).unwrap().unlocked());
        assert_eq!(state.memory_slots(), 2);
        assert!(state.book.get("Murmur").unwrap().is_unlocked());
        assert!(!state.book.get("Articulate").unwrap().is_unlocked());
    }

    #[test]
    fn idle_workers_exclude_assigned() {
        let mut state = EngineState::new(&EngineConfig::default()).unwrap();
        for id in 1..=3 {
            state.followers.push(Follower {
                id: FollowerId(id),
                attributes: Attributes::default(),
            });
        }
        state.assigned_followers = 5;
        assert_eq!(state.idle_workers(), 0);
        state.assigned_followers = 1;
        assert_eq!(state.idle_workers(), 2);
        assert_eq!(state.next_follower_id(), FollowerId(4));
    }
}
