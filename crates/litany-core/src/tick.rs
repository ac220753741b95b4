//! Tick cycle: the seven-phase loop that advances the Litany economy.
//!
//! Each call to [`run_tick`] runs these phases, in this order, with nothing
//! skipped:
//!
//! 1. **Time** -- advance the season clock, count the weather overlay down,
//!    and roll new weather once for every day that started.
//! 2. **Intone** -- decay charges and run down the resonance timer.
//! 3. **Regeneration** -- credit the primary pool at the current rate.
//! 4. **Buff effects** -- credit outputs and debit upkeep of running buffs.
//! 5. **Expiry** -- count buffs and cooldowns down and drop finished ones.
//! 6. **Progression** -- re-evaluate recipe unlocks and claim milestones.
//! 7. **Clamp** -- force every pool back into `[0, max]`.
//!
//! Given the same state, delta and RNG stream, a tick is deterministic.

use litany_economy::regen::{apply_regen, compute_regen_rate};
use litany_economy::Amounts;
use litany_types::{EngineEvent, Resource, Season, Weather};
use rand::Rng;
use tracing::{debug, info};

use crate::state::EngineState;

/// Upper bound on weather rolls in a single tick. Only the last roll can
/// survive, so huge deltas need not draw for every day.
pub const MAX_WEATHER_ROLLS_PER_TICK: u64 = 32;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The frame delta was negative, NaN or infinite.
    #[error("invalid tick delta: {dt}")]
    InvalidDelta {
        /// The rejected delta.
        dt: f64,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick number that was executed (1-based).
    pub tick: u64,
    /// Seconds simulated.
    pub dt: f64,
    /// Season at the end of the tick.
    pub season: Season,
    /// Weather at the end of the tick.
    pub weather: Option<Weather>,
    /// Primary regeneration rate used for this tick.
    pub regen_rate: f64,
    /// Primary resource actually credited by regeneration.
    pub regenerated: f64,
    /// Resources credited by running buffs.
    pub buff_output: Amounts,
    /// Whether the season rolled over.
    pub season_changed: bool,
    /// Whether weather started or cleared.
    pub weather_changed: bool,
    /// Buffs that expired.
    pub expired_buffs: Vec<String>,
    /// Recipes unlocked.
    pub unlocked_recipes: Vec<String>,
    /// Milestones claimed.
    pub milestones: Vec<String>,
    /// Memory slots at the end of the tick.
    pub memory_slots: u32,
}

impl TickSummary {
    /// The notifications this tick produces, in delivery order.
    pub fn events(&self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if self.season_changed {
            events.push(EngineEvent::SeasonChanged {
                season: self.season,
            });
        }
        if self.weather_changed {
            events.push(EngineEvent::WeatherChanged {
                weather: self.weather,
            });
        }
        events.extend(
            self.expired_buffs
                .iter()
                .map(|recipe| EngineEvent::BuffExpired {
                    recipe: recipe.clone(),
                }),
        );
        events.extend(
            self.unlocked_recipes
                .iter()
                .map(|recipe| EngineEvent::RecipeUnlocked {
                    recipe: recipe.clone(),
                }),
        );
        events.extend(
            self.milestones
                .iter()
                .map(|milestone| EngineEvent::MemorySlotGranted {
                    milestone: milestone.clone(),
                    slots: self.memory_slots,
                }),
        );
        events.push(EngineEvent::ResourcesChanged);
        events
    }
}

/// Result of the Time phase.
struct TimeResult {
    season_changed: bool,
    weather_changed: bool,
}

/// Execute one complete tick.
///
/// # Errors
///
/// Returns [`TickError::InvalidDelta`] if `dt` is negative or not finite.
/// State is untouched in that case.
pub fn run_tick(
    state: &mut EngineState,
    rng: &mut impl Rng,
    dt: f64,
) -> Result<TickSummary, TickError> {
    if !(dt.is_finite() && dt >= 0.0) {
        return Err(TickError::InvalidDelta { dt });
    }
    let tick = state.ticks.saturating_add(1);

    // --- Phase 1: Time ---
    let time = phase_time(state, rng, dt);

    // --- Phase 2: Intone ---
    state.intone.advance(dt);

    // --- Phase 3: Regeneration ---
    let (regen_rate, regenerated) = phase_regen(state, dt);

    // --- Phase 4: Buff effects ---
    let buff_output = state
        .effects
        .apply_buff_effects(&state.book, &mut state.pools, dt);

    // --- Phase 5: Expiry ---
    let expired_buffs = state.effects.advance(dt);

    // --- Phase 6: Progression ---
    let (unlocked_recipes, milestones) = phase_progression(state);

    // --- Phase 7: Clamp ---
    state.pools.clamp_all();

    state.ticks = tick;
    state.elapsed_seconds += dt;
    state.last_regen_rate = regen_rate;

    debug!(
        tick,
        dt,
        regen_rate,
        regenerated,
        buffs = state.effects.buffs().len(),
        "Tick complete"
    );

    Ok(TickSummary {
        tick,
        dt,
        season: state.clock.season(),
        weather: state.weather.current(),
        regen_rate,
        regenerated,
        buff_output,
        season_changed: time.season_changed,
        weather_changed: time.weather_changed,
        expired_buffs,
        unlocked_recipes,
        milestones,
        memory_slots: state.memory_slots(),
    })
}

/// Phase 1: Time.
///
/// The overlay is counted down before new rolls so a fresh roll is never
/// shortened by the tick that started it.
fn phase_time(state: &mut EngineState, rng: &mut impl Rng, dt: f64) -> TimeResult {
    let advance = state.clock.advance(dt);
    let mut weather_changed = state.weather.advance(dt);

    let season = state.clock.season();
    let rolls = advance.days_rolled.min(MAX_WEATHER_ROLLS_PER_TICK);
    for _ in 0..rolls {
        if state.weather.roll_day(season, rng).is_some() {
            weather_changed = true;
        }
    }

    if advance.season_changed {
        info!(%season, day = state.clock.day(), "Season changed");
    }
    TimeResult {
        season_changed: advance.season_changed,
        weather_changed,
    }
}

/// Phase 3: Regeneration of the primary pool.
fn phase_regen(state: &mut EngineState, dt: f64) -> (f64, f64) {
    let rate = compute_regen_rate(&state.regen, &state.regen_inputs());
    let regenerated = state
        .pools
        .get_mut(Resource::Insight)
        .map_or(0.0, |pool| apply_regen(pool, rate, dt));
    (rate, regenerated)
}

/// Phase 6: Progression.
fn phase_progression(state: &mut EngineState) -> (Vec<String>, Vec<String>) {
    let unlocked = state.book.evaluate_unlocks(&state.pools, &state.skills);
    for recipe in &unlocked {
        info!(%recipe, "Recipe unlocked");
    }
    let milestones = state.effects.claim_milestones(&state.skills);
    for milestone in &milestones {
        info!(%milestone, slots = state.memory_slots(), "Milestone claimed");
    }
    (unlocked, milestones)
}
