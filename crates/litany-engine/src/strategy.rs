//! A fixed play policy used by the headless runner.
//!
//! Each frame the policy walks the recipe list in declaration order and
//! casts whatever is unlocked, off cooldown and affordable, buys the
//! cheapest upgrade it can, and rolls for a follower on a fixed cadence.
//! Nothing here is clever; it exists to drive every engine path.

use litany_core::Engine;
use litany_economy::IntoneState;
use litany_types::{RecipeTag, Resource, Token, UpgradeKind};
use rand::Rng;
use tracing::debug;

/// Seconds between recruitment rolls.
const RECRUIT_INTERVAL_SECONDS: f64 = 10.0;

/// Sound kept in reserve before the policy spends any on Intone.
const INTONE_SOUND_RESERVE: f64 = 3.0;

/// Counters for what the policy did over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Successful crafts and casts.
    pub crafts: u64,
    /// Refused crafts and casts.
    pub rejections: u64,
    /// Upgrade levels bought.
    pub upgrades: u64,
    /// Recruitment rolls made.
    pub recruit_rolls: u64,
    /// Followers gained.
    pub followers: u64,
}

/// The policy and its running tally.
#[derive(Debug, Default)]
pub struct Autoplayer {
    tally: Tally,
    since_recruit: f64,
}

impl Autoplayer {
    /// A fresh policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// What has happened so far.
    pub const fn tally(&self) -> Tally {
        self.tally
    }

    /// Act once after a frame of `dt` seconds.
    pub fn act<R: Rng>(&mut self, engine: &mut Engine<R>, dt: f64) {
        self.murmur(engine);
        self.cast_recipes(engine);
        self.buy_upgrades(engine);

        self.since_recruit += dt;
        if self.since_recruit >= RECRUIT_INTERVAL_SECONDS {
            self.since_recruit = 0.0;
            self.tally.recruit_rolls = self.tally.recruit_rolls.saturating_add(1);
            if engine.recruit().is_some() {
                self.tally.followers = self.tally.followers.saturating_add(1);
                let count = u32::try_from(engine.followers().len()).unwrap_or(u32::MAX);
                engine.set_assigned_followers(count / 2);
            }
        }
    }

    /// Turn insight into sound through the selection board.
    fn murmur<R: Rng>(&mut self, engine: &mut Engine<R>) {
        let Some(view) = engine.recipes().into_iter().find(|r| r.name == "Murmur") else {
            return;
        };
        if !view.unlocked || view.cooldown_remaining.is_some() {
            return;
        }
        if !affordable(engine, &view.cost) {
            return;
        }
        engine.toggle_token(Token::new(Resource::Insight, 0));
        let outcome = engine.craft_selected();
        self.record(outcome.success);
    }

    /// Cast every other ready recipe by name.
    fn cast_recipes<R: Rng>(&mut self, engine: &mut Engine<R>) {
        for view in engine.recipes() {
            if view.name == "Murmur"
                || !view.unlocked
                || view.active
                || view.cooldown_remaining.is_some()
                || !affordable(engine, &view.cost)
            {
                continue;
            }
            if view.name == "Intone" {
                let charged = matches!(engine.intone(), IntoneState::Charged { .. });
                if charged || engine.amount(Resource::Sound) <= INTONE_SOUND_RESERVE {
                    continue;
                }
            }
            if view.tags.contains(&RecipeTag::Duration)
                && engine.used_memory_slots() >= engine.memory_slots()
            {
                continue;
            }
            let outcome = engine.cast_buff(&view.name);
            debug!(recipe = %view.name, success = outcome.success, "Policy cast");
            self.record(outcome.success);
        }
    }

    /// Buy the first affordable upgrade, at most one per frame.
    fn buy_upgrades<R: Rng>(&mut self, engine: &mut Engine<R>) {
        for kind in UpgradeKind::ALL {
            let cost = engine.next_upgrade_cost(*kind);
            if !affordable(engine, &cost) {
                continue;
            }
            if engine.purchase_upgrade(*kind).is_ok() {
                self.tally.upgrades = self.tally.upgrades.saturating_add(1);
                return;
            }
        }
    }

    const fn record(&mut self, success: bool) {
        if success {
            self.tally.crafts = self.tally.crafts.saturating_add(1);
        } else {
            self.tally.rejections = self.tally.rejections.saturating_add(1);
        }
    }
}

/// Whether every pool holds at least its share of `cost`.
fn affordable<'a, R: Rng>(
    engine: &Engine<R>,
    cost: impl IntoIterator<Item = (&'a Resource, &'a f64)>,
) -> bool {
    cost.into_iter()
        .all(|(resource, amount)| engine.amount(*resource) >= *amount)
}
