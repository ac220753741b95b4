//! The engine facade: one instance owns all state.
//!
//! Every player-facing call goes through [`Engine`]. Calls are processed in
//! order, one at a time; nothing is shared across threads. The random source
//! is injected so tests can pin a seed while production draws from the OS.
//!
//! Listeners registered with [`Engine::subscribe`] are notified after each
//! mutation completes.

use std::collections::BTreeMap;

use litany_economy::crafting::{self, CraftFailure, CraftReport};
use litany_economy::recruitment;
use litany_economy::{Amounts, IntoneState, Recipe, Selection};
use litany_types::{
    ActiveBuff, CalendarView, CraftOutcome, EngineEvent, Follower, PoolView, RecipeView,
    Rejection, Resource, SkillTag, SkillView, Token, UpgradeKind, WeatherOverlay,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{EngineListener, Listeners};
use crate::snapshot::EngineSnapshot;
use crate::state::EngineState;
use crate::tick::{TickSummary, run_tick};

/// Calling power added per Calling level.
const CALLING_POWER_PER_LEVEL: f64 = 0.1;

/// A running game economy.
#[derive(Debug)]
pub struct Engine<R: Rng = StdRng> {
    config: EngineConfig,
    state: EngineState,
    selection: Selection,
    rng: R,
    listeners: Listeners,
}

impl Engine<StdRng> {
    /// Build from configuration. Uses `world.seed` when set, otherwise
    /// seeds from the operating system.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the configuration is invalid.
    pub fn from_config(config: EngineConfig) -> Result<Self, EngineError> {
        let rng = config
            .world
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self::new(config, rng)
    }
}

impl<R: Rng> Engine<R> {
    /// Build from configuration with an explicit random source.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the configuration is invalid.
    pub fn new(config: EngineConfig, rng: R) -> Result<Self, EngineError> {
        config.validate()?;
        let state = EngineState::new(&config)?;
        info!(
            seed = ?config.world.seed,
            recipes = state.book.len(),
            "Engine initialized"
        );
        Ok(Self {
            config,
            state,
            selection: Selection::default(),
            rng,
            listeners: Listeners::default(),
        })
    }

    /// Register a listener for every event published from now on.
    pub fn subscribe(&mut self, listener: impl EngineListener + 'static) {
        self.listeners.register(Box::new(listener));
    }

    fn publish(&mut self, events: &[EngineEvent]) {
        self.listeners.publish(events);
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Advance the economy by `dt` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Tick`] if `dt` is negative or not finite.
    pub fn tick(&mut self, dt: f64) -> Result<TickSummary, EngineError> {
        let summary = run_tick(&mut self.state, &mut self.rng, dt)?;
        self.publish(&summary.events());
        Ok(summary)
    }

    // -----------------------------------------------------------------------
    // Crafting
    // -----------------------------------------------------------------------

    /// Select or deselect a token for the next craft. Returns whether it is
    /// selected afterwards.
    pub fn toggle_token(&mut self, token: Token) -> bool {
        self.selection.toggle(token)
    }

    /// Tokens currently selected.
    pub fn selection(&self) -> &[Token] {
        self.selection.tokens()
    }

    /// Craft from the current selection. The selection is cleared whatever
    /// the outcome.
    pub fn craft_selected(&mut self) -> CraftOutcome {
        let tokens = self.selection.take();
        self.attempt_craft(&tokens)
    }

    /// Craft from an explicit token list.
    pub fn attempt_craft(&mut self, tokens: &[Token]) -> CraftOutcome {
        let max = self.selection.max();
        let (book, mut workshop) = self.state.workshop();
        let result = crafting::attempt_craft(book, &mut workshop, tokens, max);
        self.finish(result)
    }

    /// Cast a recipe by name without a selection.
    pub fn cast_buff(&mut self, recipe: &str) -> CraftOutcome {
        let (book, mut workshop) = self.state.workshop();
        let result = crafting::cast_recipe(book, &mut workshop, recipe);
        self.finish(result)
    }

    /// Stop a running duration recipe, or start it if it is not running.
    pub fn toggle_active(&mut self, recipe: &str) -> CraftOutcome {
        if self.state.effects.deactivate(recipe).is_some() {
            debug!(%recipe, "Buff deactivated");
            self.publish(&[EngineEvent::BuffExpired {
                recipe: recipe.to_owned(),
            }]);
            return CraftOutcome::applied(recipe);
        }
        match self.state.book.get(recipe).map(Recipe::is_sustained) {
            None => CraftOutcome::rejected(Rejection::UnknownRecipe {
                recipe: recipe.to_owned(),
            }),
            Some(false) => CraftOutcome::rejected_for(
                recipe,
                Rejection::NotSustained {
                    recipe: recipe.to_owned(),
                },
            ),
            Some(true) => self.cast_buff(recipe),
        }
    }

    fn finish(&mut self, result: Result<CraftReport, CraftFailure>) -> CraftOutcome {
        match result {
            Ok(report) => {
                let mut events: Vec<EngineEvent> = report
                    .level_ups
                    .iter()
                    .map(|(skill, level)| EngineEvent::SkillLevelUp {
                        skill: *skill,
                        level: *level,
                    })
                    .collect();
                if report.buff_started {
                    events.push(EngineEvent::BuffStarted {
                        recipe: report.recipe.clone(),
                    });
                }
                events.push(EngineEvent::ResourcesChanged);
                self.publish(&events);
                report.outcome()
            }
            Err(failure) => {
                debug!(
                    recipe = ?failure.recipe,
                    reason = %failure.rejection,
                    "Craft rejected"
                );
                failure.outcome()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Upgrades
    // -----------------------------------------------------------------------

    /// Buy one level of `kind`. Returns the new level.
    pub fn purchase_upgrade(&mut self, kind: UpgradeKind) -> Result<u32, Rejection> {
        let state = &mut self.state;
        let level =
            state
                .upgrades
                .purchase(kind, &mut state.pools, &state.skills, &state.base_maxima)?;
        self.publish(&[
            EngineEvent::UpgradePurchased {
                upgrade: kind,
                level,
            },
            EngineEvent::ResourcesChanged,
        ]);
        Ok(level)
    }

    /// Level owned of `kind`.
    pub fn upgrade_level(&self, kind: UpgradeKind) -> u32 {
        self.state.upgrades.level(kind)
    }

    /// Price of the next level of `kind`.
    pub fn next_upgrade_cost(&self, kind: UpgradeKind) -> Amounts {
        self.state.upgrades.next_cost(kind).to_amounts()
    }

    // -----------------------------------------------------------------------
    // Followers
    // -----------------------------------------------------------------------

    /// Call power from voice buffs and the Calling skill.
    pub fn calling_power(&self) -> f64 {
        let level = f64::from(self.state.skills.level(SkillTag::Calling));
        1.0 + self.state.effects.voice_power(&self.state.book)
            + CALLING_POWER_PER_LEVEL * level
    }

    /// Roll once for a new follower with the given call power.
    pub fn attempt_recruit(&mut self, call_power: f64) -> Option<Follower> {
        let follower = recruitment::attempt_recruit(
            &self.state.recruitment,
            call_power,
            self.state.follower_count(),
            self.state.next_follower_id(),
            &mut self.rng,
        )?;
        self.state.followers.push(follower);
        info!(
            follower = %follower.id,
            attributes = follower.attributes.total(),
            followers = self.state.followers.len(),
            "Follower recruited"
        );

        let mut events = vec![EngineEvent::FollowerGained {
            follower: follower.id,
        }];
        let xp = self.state.recruitment.xp_per_recruit;
        if let Some(level) = self.state.skills.grant(SkillTag::Calling, xp) {
            events.push(EngineEvent::SkillLevelUp {
                skill: SkillTag::Calling,
                level,
            });
        }
        self.publish(&events);
        Some(follower)
    }

    /// Roll once with the current [`calling_power`](Self::calling_power).
    pub fn recruit(&mut self) -> Option<Follower> {
        let power = self.calling_power();
        self.attempt_recruit(power)
    }

    /// Set how many followers are busy. Capped at the follower count.
    pub fn set_assigned_followers(&mut self, assigned: u32) {
        self.state.assigned_followers = assigned.min(self.state.follower_count());
    }

    /// Followers not assigned to any task.
    pub fn idle_workers(&self) -> u32 {
        self.state.idle_workers()
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Every pool.
    pub fn pools(&self) -> Vec<PoolView> {
        self.state.pools.views()
    }

    /// Current amount of one resource.
    pub fn amount(&self, resource: Resource) -> f64 {
        self.state.pools.current(resource)
    }

    /// Every skill.
    pub fn skills(&self) -> Vec<SkillView> {
        self.state.skills.views()
    }

    /// Level of one skill.
    pub fn skill_level(&self, skill: SkillTag) -> u32 {
        self.state.skills.level(skill)
    }

    /// Every recipe, in book order.
    pub fn recipes(&self) -> Vec<RecipeView> {
        self.state
            .book
            .iter()
            .map(|recipe| RecipeView {
                name: recipe.name.clone(),
                unlocked: recipe.is_unlocked(),
                cost: recipe.cost(),
                tags: recipe.tags.clone(),
                cooldown_remaining: self.state.effects.cooldown_remaining(&recipe.name),
                active: self.state.effects.is_active(&recipe.name),
            })
            .collect()
    }

    /// Running buffs.
    pub fn active_buffs(&self) -> &[ActiveBuff] {
        self.state.effects.buffs()
    }

    /// Remaining cooldowns by recipe.
    pub fn cooldowns(&self) -> &BTreeMap<String, f64> {
        self.state.effects.cooldowns()
    }

    /// Recruited followers.
    pub fn followers(&self) -> &[Follower] {
        &self.state.followers
    }

    /// Season, day and weather.
    pub fn calendar(&self) -> CalendarView {
        self.state.clock.view(self.state.weather.overlay())
    }

    /// The running weather overlay.
    pub fn weather(&self) -> Option<WeatherOverlay> {
        self.state.weather.overlay()
    }

    /// Total memory slots.
    pub fn memory_slots(&self) -> u32 {
        self.state.memory_slots()
    }

    /// Memory slots in use.
    pub fn used_memory_slots(&self) -> u32 {
        self.state.effects.active_slot_count()
    }

    /// Intone charge state.
    pub fn intone(&self) -> IntoneState {
        self.state.intone.state()
    }

    /// Primary regeneration rate if a tick ran now.
    pub fn regen_rate(&self) -> f64 {
        litany_economy::regen::compute_regen_rate(&self.state.regen, &self.state.regen_inputs())
    }

    /// Raw state, for inspection.
    pub const fn state(&self) -> &EngineState {
        &self.state
    }

    /// Configuration in use.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// Capture the whole state.
    pub fn export(&self) -> EngineSnapshot {
        EngineSnapshot::capture(&self.state)
    }

    /// Replace the whole state with `snapshot`. The selection is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Snapshot`] on a version mismatch. The current
    /// state is kept in that case.
    pub fn import(&mut self, snapshot: &EngineSnapshot) -> Result<(), EngineError> {
        self.state = snapshot.restore(&self.config)?;
        self.selection.clear();
        info!(
            ticks = self.state.ticks,
            followers = self.state.followers.len(),
            "Snapshot imported"
        );
        self.publish(&[EngineEvent::ResourcesChanged]);
        Ok(())
    }
}
