//! Transient weather events.
//!
//! Weather is rolled once at the start of every new day. With probability
//! `daily_chance` a weather kind is drawn from a season-weighted table and
//! lasts a uniform random number of seconds in `[min, max]`. A new roll
//! replaces any overlay still running. The overlay's multiplier scales
//! primary regeneration while it lasts.
//!
//! | Weather  | Spring | Summer | Autumn | Winter |
//! |----------|--------|--------|--------|--------|
//! | Rain     | 50     | 20     | 35     | 10     |
//! | Storm    | 15     | 20     | 25     | 15     |
//! | Drought  | 10     | 45     | 10     |  0     |
//! | Snow     |  0     |  0     | 10     | 55     |
//! | Aurora   |  5     |  5     |  5     | 20     |

use litany_types::{Season, Weather, WeatherOverlay};
use rand::Rng;
use tracing::debug;

use crate::config::WeatherConfig;

/// Seasonal weather weights.
#[derive(Debug, Clone)]
pub struct SeasonWeights {
    entries: Vec<(Weather, u32)>,
}

impl SeasonWeights {
    /// The weather weights for `season`.
    pub fn for_season(season: Season) -> Self {
        let entries = match season {
            Season::Spring => vec![
                (Weather::Rain, 50),
                (Weather::Storm, 15),
                (Weather::Drought, 10),
                (Weather::Snow, 0),
                (Weather::Aurora, 5),
            ],
            Season::Summer => vec![
                (Weather::Rain, 20),
                (Weather::Storm, 20),
                (Weather::Drought, 45),
                (Weather::Snow, 0),
                (Weather::Aurora, 5),
            ],
            Season::Autumn => vec![
                (Weather::Rain, 35),
                (Weather::Storm, 25),
                (Weather::Drought, 10),
                (Weather::Snow, 10),
                (Weather::Aurora, 5),
            ],
            Season::Winter => vec![
                (Weather::Rain, 10),
                (Weather::Storm, 15),
                (Weather::Drought, 0),
                (Weather::Snow, 55),
                (Weather::Aurora, 20),
            ],
        };
        Self { entries }
    }

    /// Pick the weather whose cumulative weight first exceeds `roll`.
    fn select(&self, roll: u32) -> Option<Weather> {
        let mut cumulative: u32 = 0;
        for &(weather, weight) in &self.entries {
            cumulative = cumulative.saturating_add(weight);
            if roll < cumulative {
                return Some(weather);
            }
        }
        None
    }

    /// Sum of all weights.
    fn total_weight(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |acc, (_, w)| acc.saturating_add(*w))
    }

    /// Draw a weather kind.
    pub fn draw(&self, rng: &mut impl Rng) -> Option<Weather> {
        let total = self.total_weight();
        if total == 0 {
            return None;
        }
        self.select(rng.random_range(0..total))
    }
}

/// The weather roller and the current overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSystem {
    config: WeatherConfig,
    overlay: Option<WeatherOverlay>,
}

impl WeatherSystem {
    /// Clear skies.
    pub const fn new(config: WeatherConfig) -> Self {
        Self {
            config,
            overlay: None,
        }
    }

    /// Restore a stored overlay. Expired overlays are dropped.
    pub fn with_overlay(config: WeatherConfig, overlay: Option<WeatherOverlay>) -> Self {
        let overlay = overlay.filter(|o| o.remaining_seconds.is_finite() && o.remaining_seconds > 0.0);
        Self { config, overlay }
    }

    /// The running overlay, if any.
    pub const fn overlay(&self) -> Option<WeatherOverlay> {
        self.overlay
    }

    /// The current weather kind, if any.
    pub fn current(&self) -> Option<Weather> {
        self.overlay.map(|o| o.kind)
    }

    /// Regeneration multiplier, when an overlay is active.
    pub fn multiplier(&self) -> Option<f64> {
        self.overlay.map(|o| o.multiplier)
    }

    /// Count the overlay down by `dt`. Returns `true` if it cleared.
    pub fn advance(&mut self, dt: f64) -> bool {
        let Some(overlay) = self.overlay.as_mut() else {
            return false;
        };
        overlay.remaining_seconds -= dt;
        if overlay.remaining_seconds > 0.0 {
            return false;
        }
        debug!(weather = %overlay.kind, "Weather cleared");
        self.overlay = None;
        true
    }

    /// Roll the weather for a new day in `season`.
    ///
    /// Returns the weather started by this roll, if any.
    pub fn roll_day(&mut self, season: Season, rng: &mut impl Rng) -> Option<Weather> {
        if !self.config.enabled {
            return None;
        }
        let draw: f64 = rng.random();
        if draw >= self.config.daily_chance {
            return None;
        }
        let kind = SeasonWeights::for_season(season).draw(rng)?;
        let (low, high) = (self.config.min_duration_secs, self.config.max_duration_secs);
        let duration = if high > low {
            rng.random_range(low..=high)
        } else {
            low
        };
        self.overlay = Some(WeatherOverlay {
            kind,
            multiplier: kind.regen_multiplier(),
            remaining_seconds: duration,
        });
        debug!(weather = %kind, duration, "Weather started");
        Some(kind)
    }
}
