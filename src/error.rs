// =============================================================================
// Engine error taxonomy
// =============================================================================

use thiserror::Error;

/// Typed failures raised by the sentiment engine.
///
/// None of these are ever converted into a default NEUTRAL result; callers
/// decide how to present them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Window shorter than required, a required field (volume) absent, or no
    /// usable signals left after collection.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Validation failed and cleaning could not repair the series.
    #[error("invalid data: {}", problems.join("; "))]
    InvalidData { problems: Vec<String> },

    /// Unexpected failure during regime classification or scoring.
    #[error("analysis failed: {0}")]
    Analysis(String),

    /// Configuration rejected by validation.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    pub fn insufficient(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    pub fn invalid(problems: Vec<String>) -> Self {
        Self::InvalidData { problems }
    }

    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::Analysis(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
