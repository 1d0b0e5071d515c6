// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulation Suite ("The Ward") - Error Types

/// Rejected configuration or control input.
///
/// Raised at construction and at the control-update boundary; a rejected
/// value never reaches the step function.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("grid size must be at least 1")]
    ZeroGridSize,

    #[error("{name} must be a finite, non-negative number (got {value})")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("{name} must be greater than zero days (got {value})")]
    InvalidPeriod { name: &'static str, value: f64 },

    #[error("mortality rate must lie in [0, 1] (got {0})")]
    InvalidMortality(f64),

    #[error("{name} must lie in [0, 100] (got {value})")]
    PercentOutOfRange { name: &'static str, value: f64 },

    #[error("history length must be at least 1")]
    ZeroHistoryLength,

    #[error("unknown policy id: {0}")]
    UnknownPolicy(String),

    #[error("unknown cadence id: {0}")]
    UnknownCadence(String),

    #[error("malformed configuration: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Malformed(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
