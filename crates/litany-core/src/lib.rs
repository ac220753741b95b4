//! Tick driver and engine facade for the Litany incremental game.
//!
//! This crate wires the pure economy from `litany-economy` to time: a
//! real-time season clock, transient weather, the seven-phase tick, YAML
//! configuration, change notifications and snapshot export/import.
//!
//! # Modules
//!
//! - [`clock`] -- Day and season counter driven by elapsed seconds
//! - [`config`] -- YAML configuration ([`EngineConfig`])
//! - [`engine`] -- The [`Engine`] facade that owns all state
//! - [`error`] -- Top-level [`EngineError`]
//! - [`events`] -- Listener trait and the channel and tracing listeners
//! - [`snapshot`] -- Serializable [`EngineSnapshot`]
//! - [`state`] -- The plain [`EngineState`] record
//! - [`tick`] -- The tick cycle ([`run_tick`])
//! - [`weather`] -- Season-weighted weather rolls

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod weather;

pub use clock::{ClockAdvance, ClockError, ClockPosition, SeasonClock};
pub use config::{ConfigError, EngineConfig};
pub use engine::Engine;
pub use error::EngineError;
pub use events::{ChannelListener, EngineListener, TracingListener};
pub use snapshot::{EngineSnapshot, PoolState, SNAPSHOT_VERSION, SnapshotError};
pub use state::EngineState;
pub use tick::{TickError, TickSummary, run_tick};
pub use weather::WeatherSystem;
