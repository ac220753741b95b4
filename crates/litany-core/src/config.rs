//! Configuration loading and typed config structures for the Litany engine.
//!
//! Every section and field is optional in YAML; missing values fall back to
//! the defaults below, so an empty document is a valid configuration.
//!
//! ```yaml
//! world:
//!   seed: 42
//! time:
//!   seconds_per_day: 60
//!   days_per_season: 7
//! regen:
//!   r_max: 6.0
//! pools:
//!   insight: { max: 1200, start: 0, unlocked: true }
//! logging:
//!   level: debug
//! ```

use std::path::Path;

use litany_economy::{Amounts, IntoneParams, MAX_RECRUIT_POINTS, RecruitParams, RegenParams};
use litany_types::{Resource, Season};
use serde::{Deserialize, Serialize};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seed and session-level settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Regeneration curve.
    #[serde(default)]
    pub regen: RegenParams,

    /// Day and season cadence.
    #[serde(default)]
    pub time: TimeConfig,

    /// Weather rolls.
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Intone charge machine.
    #[serde(default)]
    pub intone: IntoneParams,

    /// Active effects.
    #[serde(default)]
    pub effects: EffectsConfig,

    /// Recruitment lottery.
    #[serde(default)]
    pub recruitment: RecruitParams,

    /// Pool capacities and starting amounts.
    #[serde(default)]
    pub pools: PoolsConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_owned(),
            })
        };
        if !(self.time.seconds_per_day.is_finite() && self.time.seconds_per_day > 0.0) {
            return invalid("time.seconds_per_day must be positive");
        }
        if self.time.days_per_season == 0 {
            return invalid("time.days_per_season must be at least 1");
        }
        if self.time.seasons.is_empty() {
            return invalid("time.seasons must list at least one season");
        }
        if !(0.0..=1.0).contains(&self.weather.daily_chance) {
            return invalid("weather.daily_chance must be within [0, 1]");
        }
        if !(self.weather.min_duration_secs > 0.0
            && self.weather.min_duration_secs <= self.weather.max_duration_secs
            && self.weather.max_duration_secs.is_finite())
        {
            return invalid("weather durations must satisfy 0 < min <= max");
        }
        let regen = &self.regen;
        if !(positive(regen.r_max) && positive(regen.steepness)) {
            return invalid("regen.r_max and regen.steepness must be positive");
        }
        if !(regen.midpoint.is_finite() && regen.clarity_midpoint.is_finite()) {
            return invalid("regen.midpoint and regen.clarity_midpoint must be finite");
        }
        if !(non_negative(regen.gain) && non_negative(regen.idle_bonus_per_worker)) {
            return invalid("regen.gain and regen.idle_bonus_per_worker must be non-negative");
        }
        let intone = &self.intone;
        if intone.max_charges == 0 {
            return invalid("intone.max_charges must be at least 1");
        }
        if !(positive(intone.decay_interval_secs) && positive(intone.charged_duration_secs)) {
            return invalid("intone timers must be positive");
        }
        if !(non_negative(intone.per_charge_bonus)
            && intone.charged_multiplier.is_finite()
            && intone.charged_multiplier >= 1.0)
        {
            return invalid("intone multipliers must be finite and at least 1");
        }
        let recruitment = &self.recruitment;
        if !positive(recruitment.growth) {
            return invalid("recruitment.growth must be positive");
        }
        if !(non_negative(recruitment.min_chance)
            && recruitment.min_chance <= recruitment.max_chance
            && recruitment.max_chance <= 1.0)
        {
            return invalid("recruitment chances must satisfy 0 <= min <= max <= 1");
        }
        if recruitment.min_points > recruitment.max_points {
            return invalid("recruitment.min_points must not exceed max_points");
        }
        if recruitment.max_points > MAX_RECRUIT_POINTS {
            return invalid("recruitment.max_points is too large");
        }
        if !non_negative(recruitment.xp_per_recruit) {
            return invalid("recruitment.xp_per_recruit must be non-negative");
        }
        for resource in Resource::ALL {
            let spec = self.pools.spec(*resource);
            if !(spec.max.is_finite() && spec.max > 0.0) {
                return invalid("every pool max must be positive");
            }
        }
        Ok(())
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Session-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// RNG seed. `None` seeds from the operating system.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Day and season cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeConfig {
    /// Real seconds per in-game day.
    #[serde(default = "default_seconds_per_day")]
    pub seconds_per_day: f64,

    /// Days in each season.
    #[serde(default = "default_days_per_season")]
    pub days_per_season: u32,

    /// The seasonal cycle, in order.
    #[serde(default = "default_seasons")]
    pub seasons: Vec<Season>,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            seconds_per_day: default_seconds_per_day(),
            days_per_season: default_days_per_season(),
            seasons: default_seasons(),
        }
    }
}

/// Weather rolls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Whether weather events happen at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Probability of a weather event on each new day.
    #[serde(default = "default_daily_chance")]
    pub daily_chance: f64,

    /// Shortest weather event, in seconds.
    #[serde(default = "default_min_weather_secs")]
    pub min_duration_secs: f64,

    /// Longest weather event, in seconds.
    #[serde(default = "default_max_weather_secs")]
    pub max_duration_secs: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_chance: default_daily_chance(),
            min_duration_secs: default_min_weather_secs(),
            max_duration_secs: default_max_weather_secs(),
        }
    }
}

/// Active-effect settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectsConfig {
    /// Memory slots before upgrades and milestones.
    #[serde(default = "default_base_memory_slots")]
    pub base_memory_slots: u32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            base_memory_slots: default_base_memory_slots(),
        }
    }
}

/// Capacity and starting state of one pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolSpec {
    /// Base capacity before vessel upgrades.
    pub max: f64,
    /// Starting amount.
    #[serde(default)]
    pub start: f64,
    /// Whether the pool is visible from the start.
    #[serde(default)]
    pub unlocked: bool,
}

/// One [`PoolSpec`] per resource.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolsConfig {
    /// The primary, regenerating pool.
    #[serde(default = "default_insight_pool")]
    pub insight: PoolSpec,
    /// Sound.
    #[serde(default = "default_sound_pool")]
    pub sound: PoolSpec,
    /// Thought.
    #[serde(default = "default_thought_pool")]
    pub thought: PoolSpec,
    /// Word.
    #[serde(default = "default_word_pool")]
    pub word: PoolSpec,
}

impl PoolsConfig {
    /// The spec for `resource`.
    pub const fn spec(&self, resource: Resource) -> &PoolSpec {
        match resource {
            Resource::Insight => &self.insight,
            Resource::Sound => &self.sound,
            Resource::Thought => &self.thought,
            Resource::Word => &self.word,
        }
    }

    /// Base capacities, before upgrades.
    pub fn base_maxima(&self) -> Amounts {
        Resource::ALL
            .iter()
            .map(|r| (*r, self.spec(*r).max))
            .collect()
    }
}

impl Default for PoolsConfig {
    fn default() -> Self {
        Self {
            insight: default_insight_pool(),
            sound: default_sound_pool(),
            thought: default_thought_pool(),
            word: default_word_pool(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_seconds_per_day() -> f64 {
    60.0
}

const fn default_days_per_season() -> u32 {
    7
}

fn default_seasons() -> Vec<Season> {
    vec![Season::Spring, Season::Summer, Season::Autumn, Season::Winter]
}

const fn default_true() -> bool {
    true
}

const fn default_daily_chance() -> f64 {
    0.35
}

const fn default_min_weather_secs() -> f64 {
    20.0
}

const fn default_max_weather_secs() -> f64 {
    90.0
}

const fn default_base_memory_slots() -> u32 {
    2
}

const fn default_insight_pool() -> PoolSpec {
    PoolSpec {
        max: 1200.0,
        start: 0.0,
        unlocked: true,
    }
}

const fn default_sound_pool() -> PoolSpec {
    PoolSpec {
        max: 20.0,
        start: 0.0,
        unlocked: false,
    }
}

const fn default_thought_pool() -> PoolSpec {
    PoolSpec {
        max: 10.0,
        start: 0.0,
        unlocked: false,
    }
}

const fn default_word_pool() -> PoolSpec {
    PoolSpec {
        max: 5.0,
        start: 0.0,
        unlocked: false,
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.time.seasons.len(), 4);
        assert_eq!(config.effects.base_memory_slots, 2);
        assert!((config.regen.r_max - 6.0).abs() < f64::EPSILON);
        assert!(config.pools.insight.unlocked);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
world:
  seed: 123
regen:
  r_max: 8.0
  midpoint: 900
time:
  seconds_per_day: 30
  days_per_season: 3
  seasons: [winter, spring]
weather:
  enabled: false
  daily_chance: 0.5
intone:
  max_charges: 3
effects:
  base_memory_slots: 4
recruitment:
  growth: 2.0
pools:
  sound: { max: 40, start: 10, unlocked: true }
logging:
  level: debug
  json: true
";
        let config = EngineConfig::parse(yaml);
        assert!(config.is_ok(), "{config:?}");
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.world.seed, Some(123));
        assert!((config.regen.r_max - 8.0).abs() < f64::EPSILON);
        // Unspecified fields within a section keep their defaults.
        assert!((config.regen.steepness - 150.0).abs() < f64::EPSILON);
        assert_eq!(config.time.seasons, vec![Season::Winter, Season::Spring]);
        assert!(!config.weather.enabled);
        assert_eq!(config.intone.max_charges, 3);
        assert_eq!(config.effects.base_memory_slots, 4);
        assert!((config.pools.sound.start - 10.0).abs() < f64::EPSILON);
        assert!((config.pools.insight.max - 1200.0).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = EngineConfig::parse("world:\n  seed: 7\n");
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();
        assert_eq!(config.world.seed, Some(7));
        assert_eq!(config.time.days_per_season, 7);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(EngineConfig::parse("").is_ok());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let result = EngineConfig::parse("time:\n  days_per_season: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));

        let result = EngineConfig::parse("weather:\n  daily_chance: 1.5\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));

        let result = EngineConfig::parse("time:\n  seasons: []\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    fn rejects(yaml: &str) {
        let result = EngineConfig::parse(yaml);
        assert!(
            matches!(result, Err(ConfigError::Invalid { .. })),
            "accepted {yaml:?}: {result:?}"
        );
    }

    #[test]
    fn recruitment_chances_must_be_ordered_probabilities() {
        rejects("recruitment:\n  min_chance: .nan\n");
        rejects("recruitment:\n  max_chance: 1.5\n");
        rejects("recruitment:\n  min_chance: 0.6\n  max_chance: 0.4\n");
        rejects("recruitment:\n  min_chance: -0.1\n");
        assert!(EngineConfig::parse("recruitment:\n  min_chance: 0.2\n  max_chance: 0.2\n").is_ok());
    }

    #[test]
    fn recruitment_growth_must_be_positive() {
        rejects("recruitment:\n  growth: 0\n");
        rejects("recruitment:\n  growth: .inf\n");
    }

    #[test]
    fn recruitment_points_are_capped() {
        rejects("recruitment:\n  max_points: 4000000000\n");
        let at_cap = format!("recruitment:\n  max_points: {MAX_RECRUIT_POINTS}\n");
        assert!(EngineConfig::parse(&at_cap).is_ok());
    }

    #[test]
    fn regen_curve_values_must_be_finite() {
        rejects("regen:\n  gain: .nan\n");
        rejects("regen:\n  gain: .inf\n");
        rejects("regen:\n  midpoint: .nan\n");
        rejects("regen:\n  clarity_midpoint: -.inf\n");
        rejects("regen:\n  steepness: .nan\n");
    }

    #[test]
    fn intone_timers_must_be_positive() {
        rejects("intone:\n  decay_interval_secs: .nan\n");
        rejects("intone:\n  decay_interval_secs: 0\n");
        rejects("intone:\n  charged_duration_secs: .inf\n");
        rejects("intone:\n  charged_multiplier: 0.5\n");
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let result = EngineConfig::parse("world: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn base_maxima_cover_every_resource() {
        let maxima = PoolsConfig::default().base_maxima();
        assert_eq!(maxima.len(), Resource::ALL.len());
    }
}
