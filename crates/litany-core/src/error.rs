//! Top-level error type for the engine facade.

use litany_economy::EconomyError;

use crate::clock::ClockError;
use crate::config::ConfigError;
use crate::snapshot::SnapshotError;
use crate::tick::TickError;

/// Errors that can stop the engine from being built or driven.
///
/// Gameplay refusals are never errors; they come back as
/// [`Rejection`](litany_types::Rejection) values.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// The season clock rejected its configuration.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// Economy data broke an invariant.
    #[error("economy error: {source}")]
    Economy {
        /// The underlying economy error.
        #[from]
        source: EconomyError,
    },

    /// A tick could not run.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },

    /// A snapshot could not be exported or imported.
    #[error("snapshot error: {source}")]
    Snapshot {
        /// The underlying snapshot error.
        #[from]
        source: SnapshotError,
    },
}
