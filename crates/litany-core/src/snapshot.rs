//! Export and import of the full engine state.
//!
//! A snapshot stores only primary data: pool amounts, skill XP, upgrade
//! levels, unlocked recipe names, timers, the clock position, followers.
//! Everything derivable (skill levels, pool maxima, the season) is
//! recomputed on import, and every pool is clamped afterwards. Bad values
//! are repaired with a `warn!` rather than rejected, so an old save still
//! loads. Unlock conditions are not re-evaluated here; the next tick does
//! that, exactly as it would have without the round trip.

use std::collections::{BTreeMap, BTreeSet};

use litany_economy::{
    EffectScheduler, IntoneCharge, IntoneState, MILESTONES, ResourcePool, SkillSet, UpgradeLedger,
};
use litany_types::{ActiveBuff, Follower, Resource, SkillTag, UpgradeKind, WeatherOverlay};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::clock::{ClockPosition, SeasonClock};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::state::EngineState;
use crate::weather::WeatherSystem;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors raised while reading or writing snapshots.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The snapshot was written by an incompatible format version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the snapshot.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },

    /// JSON encoding or decoding failed.
    #[error("snapshot JSON error: {source}")]
    Json {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },
}

/// Stored state of one pool. The maximum is derived, so it is not stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolState {
    /// Amount held.
    pub current: f64,
    /// Whether the pool has been revealed.
    pub unlocked: bool,
}

/// Serializable image of an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Format version.
    pub version: u32,
    /// Total simulated seconds.
    pub elapsed_seconds: f64,
    /// Ticks run.
    pub ticks: u64,
    /// Pool amounts.
    pub pools: BTreeMap<Resource, PoolState>,
    /// XP per skill.
    pub skills: BTreeMap<SkillTag, f64>,
    /// Upgrade levels.
    pub upgrades: BTreeMap<UpgradeKind, u32>,
    /// Names of unlocked recipes.
    pub unlocked_recipes: Vec<String>,
    /// Running buffs.
    pub buffs: Vec<ActiveBuff>,
    /// Remaining cooldowns.
    pub cooldowns: BTreeMap<String, f64>,
    /// Claimed milestone ids.
    pub milestones: BTreeSet<String>,
    /// Intone charge state.
    pub intone: IntoneState,
    /// Clock position.
    pub clock: ClockPosition,
    /// Running weather overlay.
    pub weather: Option<WeatherOverlay>,
    /// Recruited followers.
    pub followers: Vec<Follower>,
    /// Followers assigned to tasks.
    pub assigned_followers: u32,
}

impl EngineSnapshot {
    /// Capture `state`.
    pub fn capture(state: &EngineState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            elapsed_seconds: state.elapsed_seconds,
            ticks: state.ticks,
            pools: state
                .pools
                .iter()
                .map(|(resource, pool)| {
                    (
                        resource,
                        PoolState {
                            current: pool.current(),
                            unlocked: pool.unlocked(),
                        },
                    )
                })
                .collect(),
            skills: state.skills.xp_map(),
            upgrades: state.upgrades.levels().clone(),
            unlocked_recipes: state.book.unlocked_names(),
            buffs: state.effects.buffs().to_vec(),
            cooldowns: state.effects.cooldowns().clone(),
            milestones: state.effects.claimed_milestones().clone(),
            intone: state.intone.state(),
            clock: state.clock.position(),
            weather: state.weather.overlay(),
            followers: state.followers.clone(),
            assigned_followers: state.assigned_followers,
        }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] if encoding fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse JSON produced by [`EngineSnapshot::to_json`].
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Json`] on malformed input and
    /// [`SnapshotError::UnsupportedVersion`] on a version mismatch.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    fn check_version(&self) -> Result<(), SnapshotError> {
        if self.version == SNAPSHOT_VERSION {
            Ok(())
        } else {
            Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            })
        }
    }

    /// Rebuild engine state under `config`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on a version mismatch or if `config` itself
    /// is invalid. Bad values inside the snapshot are repaired, not refused.
    pub fn restore(&self, config: &EngineConfig) -> Result<EngineState, EngineError> {
        self.check_version()?;
        let mut state = EngineState::new(config)?;

        state.upgrades = UpgradeLedger::from_levels(&self.upgrades);
        for (kind, level) in &self.upgrades {
            let kept = state.upgrades.level(*kind);
            if kept != *level {
                warn!(upgrade = %kind, stored = level, kept, "Upgrade level out of range");
            }
        }
        state
            .upgrades
            .apply_capacities(&mut state.pools, &state.base_maxima);
        restore_pools(&mut state, &self.pools)?;

        for (skill, xp) in &self.skills {
            if !(xp.is_finite() && *xp >= 0.0) {
                warn!(%skill, xp, "Invalid skill XP, resetting to zero");
            }
        }
        state.skills = SkillSet::from_xp_map(&self.skills);

        for name in &self.unlocked_recipes {
            if state.book.unlock(name).is_err() {
                warn!(recipe = %name, "Unknown recipe in snapshot, skipping");
            }
        }

        let milestones = self
            .milestones
            .iter()
            .filter(|id| MILESTONES.iter().any(|m| m.id == id.as_str()))
            .cloned()
            .collect();
        state.effects = EffectScheduler::from_parts(
            config.effects.base_memory_slots,
            self.cooldowns.clone(),
            milestones,
        );
        restore_buffs(&mut state, &self.buffs);

        state.intone = IntoneCharge::with_state(config.intone, self.intone);
        state.clock = SeasonClock::from_position(&config.time, self.clock)?;
        state.weather = WeatherSystem::with_overlay(config.weather.clone(), self.weather);
        restore_followers(&mut state, &self.followers, self.assigned_followers);
        state.ticks = self.ticks;
        let elapsed = self.elapsed_seconds;
        state.elapsed_seconds = if elapsed.is_finite() && elapsed >= 0.0 {
            elapsed
        } else {
            warn!(value = self.elapsed_seconds, "Invalid elapsed time, resetting");
            0.0
        };
        state.pools.clamp_all();
        Ok(state)
    }
}

/// Put stored amounts into pools whose maxima are already derived.
fn restore_pools(
    state: &mut EngineState,
    stored: &BTreeMap<Resource, PoolState>,
) -> Result<(), EngineError> {
    for (resource, saved) in stored {
        let Some(pool) = state.pools.get_mut(*resource) else {
            continue;
        };
        let max = pool.max();
        if !(saved.current.is_finite() && (0.0..=max).contains(&saved.current)) {
            warn!(%resource, current = saved.current, max, "Pool amount out of range, clamping");
        }
        *pool = ResourcePool::with_current(saved.current, max, saved.unlocked)?;
    }
    Ok(())
}

/// Put stored buffs back, shaped by their recipes. Buffs that no longer fit
/// in the memory slots are dropped in stored order.
fn restore_buffs(state: &mut EngineState, stored: &[ActiveBuff]) {
    let palace_level = state.palace_level();
    for buff in stored {
        if !(buff.remaining_seconds.is_finite() && buff.remaining_seconds > 0.0) {
            continue;
        }
        let Some(recipe) = state.book.get(&buff.recipe) else {
            warn!(recipe = %buff.recipe, "Buff for unknown recipe, dropping");
            continue;
        };
        if state.effects.is_active(&buff.recipe) {
            warn!(recipe = %buff.recipe, "Duplicate buff, keeping the first");
            continue;
        }
        if let Err(reason) = state
            .effects
            .restore_buff(recipe, buff.remaining_seconds, palace_level)
        {
            warn!(recipe = %buff.recipe, %reason, "Buff cannot be restored, dropping");
        }
    }
}

/// Put followers back. Later entries reusing an earlier id are dropped, and
/// the assigned count is capped at the number kept.
fn restore_followers(state: &mut EngineState, stored: &[Follower], assigned: u32) {
    let mut seen = BTreeSet::new();
    state.followers = stored
        .iter()
        .filter(|follower| {
            let fresh = seen.insert(follower.id);
            if !fresh {
                warn!(follower = %follower.id, "Duplicate follower id, dropping");
            }
            fresh
        })
        .copied()
        .collect();
    let count = state.follower_count();
    if assigned > count {
        warn!(assigned, followers = count, "Too many assigned followers, capping");
    }
    state.assigned_followers = assigned.min(count);
}
