//! Stochastic recruitment of followers.
//!
//! Recruiting the `n`-th follower requires a calling power of
//! `growth^(n-1)`; the success chance is `call_power / required`, clamped to
//! `[min_chance, max_chance]`, so the first follower is close to certain and
//! every later one gets exponentially harder but never impossible.
//!
//! A new follower starts with 1 in every attribute and receives a random
//! number of extra points, allocated one at a time. Each point picks an
//! attribute with weight `1 / (v + 1)^2`, where `v` is the points it already
//! received, so allocations stay balanced.

use litany_types::{Attributes, Follower, FollowerId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on attribute points handed to one follower.
pub const MAX_RECRUIT_POINTS: u32 = 64;

/// Tuning for the recruitment lottery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecruitParams {
    /// Difficulty growth per follower.
    #[serde(default = "default_growth")]
    pub growth: f64,
    /// Lowest success chance.
    #[serde(default = "default_min_chance")]
    pub min_chance: f64,
    /// Highest success chance.
    #[serde(default = "default_max_chance")]
    pub max_chance: f64,
    /// Fewest attribute points handed out.
    #[serde(default = "default_min_points")]
    pub min_points: u32,
    /// Most attribute points handed out.
    #[serde(default = "default_max_points")]
    pub max_points: u32,
    /// Calling XP granted per successful recruitment.
    #[serde(default = "default_xp_per_recruit")]
    pub xp_per_recruit: f64,
}

const fn default_growth() -> f64 {
    1.8
}
const fn default_min_chance() -> f64 {
    0.05
}
const fn default_max_chance() -> f64 {
    1.0
}
const fn default_min_points() -> u32 {
    3
}
const fn default_max_points() -> u32 {
    5
}
const fn default_xp_per_recruit() -> f64 {
    10.0
}

impl Default for RecruitParams {
    fn default() -> Self {
        Self {
            growth: default_growth(),
            min_chance: default_min_chance(),
            max_chance: default_max_chance(),
            min_points: default_min_points(),
            max_points: default_max_points(),
            xp_per_recruit: default_xp_per_recruit(),
        }
    }
}

/// Calling power needed to recruit one more follower when `follower_count`
/// already joined.
pub fn required_power(params: &RecruitParams, follower_count: u32) -> f64 {
    let exponent = i32::try_from(follower_count).unwrap_or(i32::MAX);
    params.growth.powi(exponent)
}

/// Success chance of one attempt.
pub fn recruit_chance(params: &RecruitParams, call_power: f64, follower_count: u32) -> f64 {
    let required = required_power(params, follower_count);
    let raw = if required > 0.0 && required.is_finite() {
        call_power.max(0.0) / required
    } else {
        0.0
    };
    let raw = if raw.is_nan() { 0.0 } else { raw };
    let low = unit_or(params.min_chance, default_min_chance());
    let high = unit_or(params.max_chance, default_max_chance()).max(low);
    raw.clamp(low, high)
}

/// `value` if it is a probability, otherwise `fallback`.
fn unit_or(value: f64, fallback: f64) -> f64 {
    if (0.0..=1.0).contains(&value) {
        value
    } else {
        fallback
    }
}

/// Allocate `points` extra points over the four attributes, one at a time.
///
/// Returned values are the *extra* points per attribute, in the order
/// strength, dexterity, endurance, intelligence.
pub fn allocate_points(points: u32, rng: &mut impl Rng) -> [u32; 4] {
    let mut given = [0u32; 4];
    for _ in 0..points {
        let weights = given.map(|v| {
            let denom = f64::from(v) + 1.0;
            1.0 / (denom * denom)
        });
        let total: f64 = weights.iter().sum();
        let mut roll = rng.random::<f64>() * total;
        let mut chosen = weights.len().saturating_sub(1);
        for (index, weight) in weights.iter().enumerate() {
            if roll < *weight {
                chosen = index;
                break;
            }
            roll -= weight;
        }
        if let Some(slot) = given.get_mut(chosen) {
            *slot = slot.saturating_add(1);
        }
    }
    given
}

/// Roll the attributes of a new follower: 1 in each, plus 3 to 5 points.
pub fn roll_attributes(params: &RecruitParams, rng: &mut impl Rng) -> Attributes {
    let high = params.max_points.min(MAX_RECRUIT_POINTS);
    let low = params.min_points.min(high);
    let points = rng.random_range(low..=high);
    let [strength, dexterity, endurance, intelligence] =
        allocate_points(points, rng).map(|extra| extra.saturating_add(1));
    Attributes {
        strength,
        dexterity,
        endurance,
        intelligence,
    }
}

/// Attempt to recruit one follower.
///
/// Makes one uniform draw against [`recruit_chance`]. On success the new
/// follower gets `next_id`.
pub fn attempt_recruit(
    params: &RecruitParams,
    call_power: f64,
    follower_count: u32,
    next_id: FollowerId,
    rng: &mut impl Rng,
) -> Option<Follower> {
    let chance = recruit_chance(params, call_power, follower_count);
    let draw: f64 = rng.random();
    debug!(call_power, follower_count, chance, draw, "Recruitment roll");
    if draw >= chance {
        return None;
    }
    Some(Follower {
        id: next_id,
        attributes: roll_attributes(params, rng),
    })
}
