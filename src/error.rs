// src/error.rs
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpotterError>;

/// Errors raised while building analyzers, sessions and exports.
///
/// Per-frame analysis never returns one of these; every degraded frame has a
/// defined fallback result instead.
#[derive(Debug, Error)]
pub enum SpotterError {
    #[error("exercise '{name}' not registered (available: [{available}])")]
    UnknownExercise { name: String, available: String },

    #[error("no feedback rule with key '{0}'")]
    UnknownRule(String),

    #[error("{exercise} configuration is missing required key '{key}'")]
    MissingThreshold { exercise: String, key: &'static str },

    #[error("{exercise} thresholds are inconsistent: {reason}")]
    InvalidThresholds { exercise: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown keypoint name '{0}'")]
    UnknownKeypoint(String),

    #[error("invalid pose frame: expected {expected} keypoints, got {actual}")]
    InvalidFrame { expected: usize, actual: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
