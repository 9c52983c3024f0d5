//! Error types for loading and validating field data.

use thiserror::Error;

/// Problems with externally supplied glyph or configuration data.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to decode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("glyph '{glyph}' has malformed flow data: {reason}")]
    InvalidFlow { glyph: char, reason: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
