//! Error types for the dispatch and composition core
//!
//! All errors that can surface from engine startup, dispatched work and
//! layout configuration.

use thiserror::Error;

/// Main toolkit error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UiError {
    /// The engine thread never became ready within the retry budget
    #[error("presentation engine failed to start after {attempts} attempts")]
    StartupExhausted { attempts: u32 },

    /// The engine thread could not be spawned at all
    #[error("failed to spawn presentation engine thread: {0}")]
    EngineSpawn(String),

    /// Work executed on the engine thread panicked or returned an error
    #[error("dispatched work failed: {0}")]
    DispatchedWorkFailure(String),

    /// The engine queue closed before the work could complete
    #[error("presentation engine is no longer accepting work")]
    EngineStopped,

    /// A grid or layout was asked to use zero columns
    #[error("invalid column count: {0} (must be at least 1)")]
    InvalidColumns(usize),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, UiError>;
