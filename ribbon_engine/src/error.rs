//! Error taxonomy for ribbon construction and engine setup.
//!
//! None of these halt the frame loop: path construction failures mean "no
//! ribbon this attempt", configuration failures surface at load time.

use pole_field::{ConfigError, PoleId, TraceFailure};
use thiserror::Error;

use crate::constellation::LetterId;

#[derive(Debug, Error)]
pub enum RibbonError {
    /// A field line left the bounds or ran out of iterations.
    #[error("field line trace failed: {0}")]
    Trace(#[from] TraceFailure),

    /// The letter has no outline poles to enter through.
    #[error("letter {letter} has no outline poles")]
    EmptyGlyph { letter: LetterId },

    /// No pole is below its hit-count ceiling.
    #[error("no poles available under the current hit-count ceiling")]
    Starvation,

    /// Construction produced fewer than two vertices or zero length.
    #[error("ribbon path is degenerate")]
    DegeneratePath,

    #[error("pole {0} is not part of the current constellation")]
    UnknownPole(PoleId),

    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to start scheduler thread: {0}")]
    Thread(#[from] std::io::Error),
}

impl RibbonError {
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        RibbonError::Configuration(ConfigError::Invalid(msg.into()))
    }

    /// Whether retrying on a later frame can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RibbonError::Trace(_) | RibbonError::Starvation)
    }
}

pub type Result<T> = std::result::Result<T, RibbonError>;
