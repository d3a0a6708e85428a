//! Error types for the matching engine.
//!
//! Extraction, normalization and scoring never fail for any input string.
//! Errors only come from invalid configuration (caught at construction) and
//! from the file helpers used by the CLI.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("threshold must lie in [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("scoring weights must be non-negative and sum to 1.0, got {sum}")]
    InvalidWeights { sum: f64 },

    #[error("distinct-color score {score} must be below the default threshold {threshold}")]
    InvalidColorPenalty { score: f64, threshold: f64 },

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MatchError>;

/// Reject thresholds outside [0, 1] (NaN included) instead of clamping them.
pub fn validate_threshold(threshold: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(MatchError::InvalidThreshold(threshold))
    }
}
