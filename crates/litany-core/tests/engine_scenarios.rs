//! End-to-end scenarios driven through the [`Engine`] facade.
//!
//! Every test pins its random source with `SmallRng::seed_from_u64`, so
//! outcomes are reproducible.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::missing_panics_doc
)]

use litany_core::{ChannelListener, Engine, EngineConfig, EngineSnapshot, PoolState};
use litany_economy::IntoneState;
use litany_types::{EngineEvent, Rejection, Resource, Season, SkillTag, Token, UpgradeKind};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

// =============================================================================
// Helpers
// =============================================================================

/// A config with a neutral season and no weather, so rates are exact.
fn calm_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.time.seasons = vec![Season::Summer];
    config.weather.enabled = false;
    config
}

/// An engine whose pools hold `amounts` and with `unlocked` recipes open.
fn engine_with(
    config: EngineConfig,
    amounts: &[(Resource, f64)],
    unlocked: &[&str],
) -> Engine<SmallRng> {
    let mut engine = Engine::new(config, SmallRng::seed_from_u64(7)).unwrap();
    let mut snapshot = engine.export();
    for (resource, amount) in amounts {
        snapshot.pools.insert(
            *resource,
            PoolState {
                current: *amount,
                unlocked: true,
            },
        );
    }
    snapshot
        .unlocked_recipes
        .extend(unlocked.iter().map(|name| (*name).to_owned()));
    engine.import(&snapshot).unwrap();
    engine
}

fn token(resource: Resource, index: u32) -> Token {
    Token::new(resource, index)
}

// =============================================================================
// Regeneration
// =============================================================================

#[test]
fn regen_at_midpoint_is_one_point_two_per_second() {
    let mut engine = engine_with(calm_config(), &[(Resource::Insight, 1000.0)], &[]);
    assert!((engine.regen_rate() - 1.2).abs() < 1e-9);

    engine.tick(1.0).unwrap();
    assert!((engine.amount(Resource::Insight) - 1001.2).abs() < 1e-6);
}

#[test]
fn regen_slows_as_the_pool_fills() {
    let mut engine = engine_with(calm_config(), &[], &[]);
    let mut last_rate = f64::INFINITY;
    for _ in 0..200 {
        let summary = engine.tick(5.0).unwrap();
        assert!(summary.regen_rate <= last_rate + 1e-12);
        last_rate = summary.regen_rate;
    }
}

#[test]
fn spring_boosts_regeneration() {
    let mut config = calm_config();
    config.time.seasons = vec![Season::Spring];
    let spring = engine_with(config, &[(Resource::Insight, 1000.0)], &[]);
    assert!((spring.regen_rate() - 1.5).abs() < 1e-9);
}

#[test]
fn full_intone_charge_multiplies_regeneration() {
    let mut engine = engine_with(
        calm_config(),
        &[(Resource::Insight, 1000.0), (Resource::Sound, 10.0)],
        &["Intone"],
    );
    for _ in 0..4 {
        assert!(engine.cast_buff("Intone").success);
    }
    assert!(matches!(engine.intone(), IntoneState::Charging { charges: 4, .. }));
    assert!(engine.cast_buff("Intone").success);
    assert!(matches!(engine.intone(), IntoneState::Charged { .. }));
    assert!((engine.regen_rate() - 3.0).abs() < 1e-9);

    let outcome = engine.cast_buff("Intone");
    assert!(matches!(
        outcome.rejection,
        Some(Rejection::ChargeLocked { .. })
    ));
    assert!((engine.amount(Resource::Sound) - 5.0).abs() < 1e-9);

    // The charged state ends with its timer.
    engine.tick(12.5).unwrap();
    assert_eq!(engine.intone(), IntoneState::Idle);
}

// =============================================================================
// Crafting
// =============================================================================

#[test]
fn contemplate_turns_sound_and_insight_into_thought() {
    let mut engine = engine_with(
        calm_config(),
        &[(Resource::Insight, 100.0), (Resource::Sound, 5.0)],
        &[],
    );
    engine.toggle_token(token(Resource::Sound, 0));
    engine.toggle_token(token(Resource::Insight, 0));
    let outcome = engine.craft_selected();

    assert!(outcome.success, "{:?}", outcome.reason());
    assert_eq!(outcome.recipe.as_deref(), Some("Contemplate"));
    assert!((engine.amount(Resource::Sound) - 4.0).abs() < 1e-9);
    assert!((engine.amount(Resource::Insight) - 75.0).abs() < 1e-9);
    assert!((engine.amount(Resource::Thought) - 1.0).abs() < 1e-9);
    assert!(engine.selection().is_empty());
    assert_eq!(engine.cooldowns().get("Contemplate"), Some(&1.0));
}

#[test]
fn first_match_is_final() {
    let mut engine = engine_with(
        calm_config(),
        &[
            (Resource::Insight, 100.0),
            (Resource::Sound, 5.0),
            (Resource::Thought, 5.0),
        ],
        &["Articulate"],
    );
    let before = engine.pools();
    let outcome = engine.attempt_craft(&[
        token(Resource::Thought, 0),
        token(Resource::Sound, 0),
        token(Resource::Insight, 0),
    ]);

    // Articulate wins the match and then fails its Reflection requirement;
    // Contemplate is never tried.
    assert!(!outcome.success);
    assert_eq!(outcome.recipe.as_deref(), Some("Articulate"));
    assert!(matches!(
        outcome.rejection,
        Some(Rejection::RequirementNotMet { .. })
    ));
    assert_eq!(engine.pools(), before);
}

#[test]
fn invalid_selections_change_nothing() {
    let mut engine = engine_with(calm_config(), &[(Resource::Insight, 100.0)], &[]);
    let before = engine.export();

    let empty = engine.attempt_craft(&[]);
    assert!(matches!(
        empty.rejection,
        Some(Rejection::InvalidSelection { .. })
    ));
    let four = engine.attempt_craft(&[
        token(Resource::Insight, 0),
        token(Resource::Insight, 1),
        token(Resource::Insight, 2),
        token(Resource::Insight, 3),
    ]);
    assert!(matches!(
        four.rejection,
        Some(Rejection::InvalidSelection { .. })
    ));
    let twice = engine.attempt_craft(&[token(Resource::Insight, 0), token(Resource::Insight, 0)]);
    assert!(matches!(
        twice.rejection,
        Some(Rejection::InvalidSelection { .. })
    ));
    let word = engine.attempt_craft(&[token(Resource::Word, 0)]);
    assert_eq!(word.rejection, Some(Rejection::NoMatchingRecipe));

    assert_eq!(engine.export(), before);
}

#[test]
fn murmur_unlocks_intone_on_the_next_tick() {
    let mut engine = engine_with(calm_config(), &[(Resource::Insight, 100.0)], &[]);
    let (listener, rx) = ChannelListener::channel();
    engine.subscribe(listener);

    let outcome = engine.attempt_craft(&[token(Resource::Insight, 0)]);
    assert_eq!(outcome.recipe.as_deref(), Some("Murmur"));
    assert!(outcome.success);
    assert!(engine.state().pools.get(Resource::Sound).unwrap().unlocked());

    engine.tick(0.1).unwrap();
    let events: Vec<EngineEvent> = rx.try_iter().collect();
    assert!(events.contains(&EngineEvent::RecipeUnlocked {
        recipe: "Intone".to_owned()
    }));
    assert!(engine
        .recipes()
        .iter()
        .any(|r| r.name == "Intone" && r.unlocked));
}

// =============================================================================
// Active effects
// =============================================================================

#[test]
fn memory_slots_cap_running_buffs() {
    let mut engine = engine_with(
        calm_config(),
        &[
            (Resource::Insight, 500.0),
            (Resource::Sound, 10.0),
            (Resource::Thought, 5.0),
            (Resource::Word, 5.0),
        ],
        &["Resonance", "Rumination", "Call"],
    );
    assert_eq!(engine.memory_slots(), 2);
    assert!(engine.cast_buff("Resonance").success);
    assert!(engine.cast_buff("Rumination").success);

    let before = engine.pools();
    let refused = engine.cast_buff("Call");
    assert_eq!(
        refused.rejection,
        Some(Rejection::CapacityExceeded {
            active: 2,
            slots: 2
        })
    );
    assert_eq!(engine.pools(), before);

    // Turning one off frees its slot.
    assert!(engine.toggle_active("Resonance").success);
    assert_eq!(engine.used_memory_slots(), 1);
    assert!(engine.toggle_active("Call").success);
    assert_eq!(engine.used_memory_slots(), 2);
}

#[test]
fn toggling_on_a_third_buff_is_refused_when_slots_are_full() {
    let mut engine = engine_with(
        calm_config(),
        &[
            (Resource::Insight, 500.0),
            (Resource::Sound, 10.0),
            (Resource::Thought, 5.0),
            (Resource::Word, 5.0),
        ],
        &["Resonance", "Rumination", "Call"],
    );
    assert!(engine.toggle_active("Resonance").success);
    assert!(engine.toggle_active("Rumination").success);
    assert_eq!(engine.used_memory_slots(), engine.memory_slots());

    let before = engine.pools();
    let refused = engine.toggle_active("Call");
    assert!(!refused.success);
    assert_eq!(refused.recipe.as_deref(), Some("Call"));
    assert_eq!(
        refused.rejection,
        Some(Rejection::CapacityExceeded {
            active: 2,
            slots: 2
        })
    );
    assert_eq!(engine.pools(), before);
    assert_eq!(engine.used_memory_slots(), 2);
    assert!(engine.cooldowns().get("Call").is_none());
}

#[test]
fn buffs_expire_and_free_their_slot() {
    let mut engine = engine_with(
        calm_config(),
        &[(Resource::Sound, 10.0), (Resource::Word, 5.0)],
        &["Resonance"],
    );
    let (listener, rx) = ChannelListener::channel();
    engine.subscribe(listener);
    assert!(engine.cast_buff("Resonance").success);
    assert_eq!(
        rx.try_recv().unwrap(),
        EngineEvent::BuffStarted {
            recipe: "Resonance".to_owned()
        }
    );

    engine.tick(29.0).unwrap();
    assert_eq!(engine.active_buffs().len(), 1);
    let summary = engine.tick(5.0).unwrap();
    assert_eq!(summary.expired_buffs, vec!["Resonance".to_owned()]);
    assert!(engine.active_buffs().is_empty());

    // Still cooling down after the buff ended.
    let again = engine.cast_buff("Resonance");
    assert!(matches!(again.rejection, Some(Rejection::OnCooldown { .. })));
}

#[test]
fn buff_output_is_limited_to_its_remaining_time() {
    let mut config = calm_config();
    // Room for the buff's whole output.
    config.pools.insight.max = 10_000.0;
    let mut engine = engine_with(
        config,
        &[
            (Resource::Insight, 0.0),
            (Resource::Sound, 10.0),
            (Resource::Word, 5.0),
        ],
        &["Resonance"],
    );
    assert!(engine.cast_buff("Resonance").success);
    // 30 s of Resonance at 2 insight per second, inside one 40 s tick.
    let summary = engine.tick(40.0).unwrap();
    let from_buff = summary.buff_output.get(&Resource::Insight).copied();
    assert!((from_buff.unwrap() - 60.0).abs() < 1e-9);
}

// =============================================================================
// Upgrades
// =============================================================================

#[test]
fn upgrades_debit_and_level_up() {
    let mut engine = engine_with(calm_config(), &[(Resource::Insight, 25.0)], &[]);
    assert_eq!(engine.purchase_upgrade(UpgradeKind::InsightFlow), Ok(1));
    assert!((engine.amount(Resource::Insight) - 5.0).abs() < 1e-9);

    let short = engine.purchase_upgrade(UpgradeKind::InsightFlow);
    assert!(matches!(short, Err(Rejection::RequirementNotMet { .. })));
    assert_eq!(engine.upgrade_level(UpgradeKind::InsightFlow), 1);
}

#[test]
fn vessels_raise_capacity() {
    let mut engine = engine_with(
        calm_config(),
        &[(Resource::Insight, 100.0), (Resource::Sound, 10.0)],
        &[],
    );
    engine.purchase_upgrade(UpgradeKind::SoundVessel).unwrap();
    let sound = engine
        .pools()
        .into_iter()
        .find(|p| p.resource == Resource::Sound)
        .unwrap();
    assert!((sound.max - 30.0).abs() < 1e-9);
    assert!((sound.current - 5.0).abs() < 1e-9);
}

#[test]
fn clarity_needs_reflection_and_caps_at_one() {
    let mut engine = engine_with(
        calm_config(),
        &[(Resource::Insight, 1200.0), (Resource::Word, 5.0)],
        &[],
    );
    let refused = engine.purchase_upgrade(UpgradeKind::Clarity).unwrap_err();
    assert!(refused.to_string().contains("reflection"));

    let mut snapshot = engine.export();
    snapshot.skills.insert(SkillTag::Reflection, 10_000.0);
    engine.import(&snapshot).unwrap();
    assert_eq!(engine.purchase_upgrade(UpgradeKind::Clarity), Ok(1));
    assert!(matches!(
        engine.purchase_upgrade(UpgradeKind::Clarity),
        Err(Rejection::MaxLevelReached { max_level: 1, .. })
    ));
}

// =============================================================================
// Recruitment
// =============================================================================

#[test]
fn first_follower_with_power_one_always_joins() {
    for seed in 0..25 {
        let mut engine = Engine::new(calm_config(), SmallRng::seed_from_u64(seed)).unwrap();
        let follower = engine.attempt_recruit(1.0).unwrap();
        assert_eq!(follower.id.into_inner(), 1);
        let attrs = follower.attributes;
        assert!(attrs.min_value() >= 1);
        assert!((7..=9).contains(&attrs.total()));
    }
}

#[test]
fn followers_are_numbered_in_order() {
    let mut engine = Engine::new(calm_config(), SmallRng::seed_from_u64(1)).unwrap();
    let mut joined = 0;
    for _ in 0..200 {
        if engine.attempt_recruit(1000.0).is_some() {
            joined += 1;
        }
    }
    let ids: Vec<u32> = engine.followers().iter().map(|f| f.id.into_inner()).collect();
    assert_eq!(ids, (1..=joined).collect::<Vec<u32>>());
}

#[test]
fn idle_followers_boost_regen_with_idle_chorus() {
    let mut engine = engine_with(calm_config(), &[(Resource::Insight, 1000.0)], &[]);
    for _ in 0..4 {
        engine.attempt_recruit(1e9).unwrap();
    }
    let base = engine.regen_rate();
    let mut snapshot = engine.export();
    snapshot.upgrades.insert(UpgradeKind::IdleChorus, 1);
    engine.import(&snapshot).unwrap();
    assert!((engine.regen_rate() - base * 1.2).abs() < 1e-9);

    engine.set_assigned_followers(4);
    assert!((engine.regen_rate() - base).abs() < 1e-9);
}

// =============================================================================
// Time
// =============================================================================

#[test]
fn season_rollover_is_announced() {
    let mut config = EngineConfig::default();
    config.time.seconds_per_day = 1.0;
    config.time.days_per_season = 1;
    config.weather.enabled = false;
    let mut engine = Engine::new(config, SmallRng::seed_from_u64(3)).unwrap();
    let (listener, rx) = ChannelListener::channel();
    engine.subscribe(listener);

    engine.tick(1.0).unwrap();
    let events: Vec<EngineEvent> = rx.try_iter().collect();
    assert!(events.contains(&EngineEvent::SeasonChanged {
        season: Season::Summer
    }));
    assert_eq!(engine.calendar().season, Season::Summer);

    // Three more seasons bring spring back.
    engine.tick(3.0).unwrap();
    assert_eq!(engine.calendar().season, Season::Spring);
}

#[test]
fn certain_weather_rolls_on_each_new_day() {
    let mut config = EngineConfig::default();
    config.time.seconds_per_day = 2.0;
    config.weather.daily_chance = 1.0;
    config.weather.min_duration_secs = 100.0;
    config.weather.max_duration_secs = 100.0;
    let mut engine = Engine::new(config, SmallRng::seed_from_u64(3)).unwrap();
    let (listener, rx) = ChannelListener::channel();
    engine.subscribe(listener);

    engine.tick(1.0).unwrap();
    assert!(engine.weather().is_none());
    engine.tick(1.0).unwrap();
    let overlay = engine.weather().unwrap();
    assert!((overlay.remaining_seconds - 100.0).abs() < 1e-9);
    assert!(rx
        .try_iter()
        .any(|e| matches!(e, EngineEvent::WeatherChanged { weather: Some(_) })));
}

#[test]
fn negative_delta_is_an_error() {
    let mut engine = Engine::new(calm_config(), SmallRng::seed_from_u64(3)).unwrap();
    assert!(engine.tick(-0.5).is_err());
    assert_eq!(engine.state().ticks, 0);
}

// =============================================================================
// Whole-engine properties
// =============================================================================

/// Drive an engine with random player actions and frame deltas.
fn random_session(seed: u64, steps: usize) -> Engine<SmallRng> {
    const RECIPES: [&str; 7] = [
        "Articulate",
        "Contemplate",
        "Resonance",
        "Rumination",
        "Call",
        "Intone",
        "Murmur",
    ];
    let mut engine = Engine::new(EngineConfig::default(), SmallRng::seed_from_u64(seed)).unwrap();
    let mut driver = SmallRng::seed_from_u64(seed.wrapping_add(1000));
    for _ in 0..steps {
        match driver.random_range(0..6) {
            0 => {
                engine.tick(driver.random_range(0.0..8.0)).unwrap();
            }
            1 => {
                let resource = Resource::ALL[driver.random_range(0..Resource::ALL.len())];
                engine.toggle_token(token(resource, driver.random_range(0..3)));
            }
            2 => {
                engine.craft_selected();
            }
            3 => {
                let name = RECIPES[driver.random_range(0..RECIPES.len())];
                if driver.random_bool(0.5) {
                    engine.cast_buff(name);
                } else {
                    engine.toggle_active(name);
                }
            }
            4 => {
                let kind = UpgradeKind::ALL[driver.random_range(0..UpgradeKind::ALL.len())];
                let _ = engine.purchase_upgrade(kind);
            }
            _ => {
                engine.recruit();
            }
        }
        assert!(engine.state().pools.within_bounds());
        assert!(engine.used_memory_slots() <= engine.memory_slots());
    }
    engine
}

#[test]
fn pools_stay_in_bounds_under_random_play() {
    for seed in 0..8 {
        random_session(seed, 600);
    }
}

#[test]
fn same_seed_same_session() {
    assert_eq!(random_session(5, 400).export(), random_session(5, 400).export());
}

#[test]
fn snapshot_round_trips_through_json() {
    let original = random_session(11, 500);
    let json = original.export().to_json().unwrap();
    let parsed = EngineSnapshot::from_json(&json).unwrap();

    let mut restored = Engine::new(EngineConfig::default(), SmallRng::seed_from_u64(0)).unwrap();
    restored.import(&parsed).unwrap();
    assert_eq!(restored.export(), original.export());
    assert_eq!(restored.skills(), original.skills());
    assert_eq!(restored.recipes(), original.recipes());
}
