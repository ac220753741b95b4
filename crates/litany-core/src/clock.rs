//! Season clock for the Litany engine.
//!
//! The clock is real-time driven: it accumulates elapsed seconds into days
//! and days into seasons. Only two values are stored, the number of whole
//! days elapsed and the seconds into the current day. The season, the day
//! within the season and the season multiplier are all derived from the day
//! counter, never stored independently.
//!
//! A single large delta may roll over many days (and seasons) at once; the
//! caller learns how many through [`ClockAdvance`].

use litany_types::{CalendarView, Season, WeatherOverlay};
use serde::{Deserialize, Serialize};

use crate::config::TimeConfig;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Invalid time configuration (e.g. zero days per season).
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// What one call to [`SeasonClock::advance`] rolled over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockAdvance {
    /// Whole days that started during the advance.
    pub days_rolled: u64,
    /// Whether the season is different from before the advance.
    pub season_changed: bool,
}

/// Stored clock position, for snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClockPosition {
    /// Whole days elapsed since the start.
    pub day: u64,
    /// Seconds into the current day.
    pub day_seconds: f64,
}

/// Real-time day and season counter.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonClock {
    /// Whole days elapsed since the start.
    day: u64,

    /// Seconds into the current day, in `[0, seconds_per_day)`.
    day_seconds: f64,

    /// Real seconds per day (from configuration).
    seconds_per_day: f64,

    /// Days per season (from configuration).
    days_per_season: u32,

    /// Ordered list of seasons that form the cycle.
    seasons: Vec<Season>,
}

impl SeasonClock {
    /// Create a clock at day 0 of the first configured season.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the day length is not
    /// positive, `days_per_season` is 0, or the season list is empty.
    pub fn new(config: &TimeConfig) -> Result<Self, ClockError> {
        Self::from_position(config, ClockPosition::default())
    }

    /// Create a clock at a stored position (state restoration).
    ///
    /// # Errors
    ///
    /// Same conditions as [`SeasonClock::new`].
    pub fn from_position(config: &TimeConfig, position: ClockPosition) -> Result<Self, ClockError> {
        if !(config.seconds_per_day.is_finite() && config.seconds_per_day > 0.0) {
            return Err(ClockError::InvalidConfig {
                reason: "seconds_per_day must be positive".to_owned(),
            });
        }
        if config.days_per_season == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "days_per_season must be at least 1".to_owned(),
            });
        }
        if config.seasons.is_empty() {
            return Err(ClockError::InvalidConfig {
                reason: "at least one season must be configured".to_owned(),
            });
        }
        let day_seconds = if position.day_seconds.is_finite() {
            position.day_seconds.clamp(0.0, config.seconds_per_day)
        } else {
            0.0
        };
        let mut clock = Self {
            day: position.day,
            day_seconds: 0.0,
            seconds_per_day: config.seconds_per_day,
            days_per_season: config.days_per_season,
            seasons: config.seasons.clone(),
        };
        // A stored fraction equal to a full day rolls over like any other.
        clock.advance(day_seconds);
        Ok(clock)
    }

    /// Advance by `dt` seconds. Non-positive or non-finite deltas are
    /// ignored.
    pub fn advance(&mut self, dt: f64) -> ClockAdvance {
        if !(dt.is_finite() && dt > 0.0) {
            return ClockAdvance::default();
        }
        let season_before = self.season_index();
        self.day_seconds += dt;
        let mut days_rolled = 0;
        if self.day_seconds >= self.seconds_per_day {
            let whole = (self.day_seconds / self.seconds_per_day).floor();
            self.day_seconds = (-whole)
                .mul_add(self.seconds_per_day, self.day_seconds)
                .max(0.0);
            days_rolled = whole_days(whole);
            self.day = self.day.saturating_add(days_rolled);
        }
        ClockAdvance {
            days_rolled,
            season_changed: self.season_index() != season_before,
        }
    }

    /// Whole days elapsed since the start.
    pub const fn day(&self) -> u64 {
        self.day
    }

    /// Seconds into the current day.
    pub const fn day_seconds(&self) -> f64 {
        self.day_seconds
    }

    /// Seconds until the next day starts.
    pub fn seconds_until_next_day(&self) -> f64 {
        (self.seconds_per_day - self.day_seconds).max(0.0)
    }

    /// The stored position.
    pub const fn position(&self) -> ClockPosition {
        ClockPosition {
            day: self.day,
            day_seconds: self.day_seconds,
        }
    }

    /// Zero-based index of the current season in the configured cycle.
    ///
    /// The index is `(day / days_per_season) % season_count`.
    pub fn season_index(&self) -> u32 {
        let season_count = u64::try_from(self.seasons.len()).unwrap_or(1).max(1);
        let raw = self
            .day
            .checked_div(u64::from(self.days_per_season))
            .unwrap_or(0);
        let index = raw.checked_rem(season_count).unwrap_or(0);
        u32::try_from(index).unwrap_or(0)
    }

    /// Zero-based day within the current season.
    pub fn day_in_season(&self) -> u32 {
        let within = self
            .day
            .checked_rem(u64::from(self.days_per_season))
            .unwrap_or(0);
        u32::try_from(within).unwrap_or(0)
    }

    /// The current season.
    pub fn season(&self) -> Season {
        usize::try_from(self.season_index())
            .ok()
            .and_then(|i| self.seasons.get(i))
            .or_else(|| self.seasons.first())
            .copied()
            .unwrap_or(Season::Summer)
    }

    /// Regeneration multiplier of the current season.
    pub fn multiplier(&self) -> f64 {
        self.season().regen_multiplier()
    }

    /// The configured season cycle.
    pub fn seasons(&self) -> &[Season] {
        &self.seasons
    }

    /// Read-only view combined with the current weather.
    pub fn view(&self, weather: Option<WeatherOverlay>) -> CalendarView {
        CalendarView {
            season: self.season(),
            season_index: self.season_index(),
            day_in_season: self.day_in_season(),
            multiplier: self.multiplier(),
            weather,
        }
    }
}

/// Convert a non-negative whole number of days to `u64`, saturating.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_days(days: f64) -> u64 {
    if days.is_finite() && days > 0.0 {
        days.min(f64::from(u32::MAX)) as u64
    } else {
        0
    }
}
