//! Error types for the cascade engine

use thiserror::Error;

/// Engine errors
///
/// Configuration problems are reported at construction or reconfiguration,
/// bet problems before any randomness is drawn. Nothing in the spin path
/// itself can fail once those checks pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid bet amount: {0}")]
    InvalidBet(f64),

    #[error("Bet {bet} is below the minimum of {min}")]
    BetTooLow { bet: f64, min: f64 },

    #[error("Bet {bet} is above the maximum of {max}")]
    BetTooHigh { bet: f64, max: f64 },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
