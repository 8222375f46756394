use thiserror::Error;

/// Failures at the edges of the engine.
///
/// The computations themselves never fail: missing or malformed numbers are
/// zero. Only JSON text, configuration and the external collaborators can
/// produce an error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid engine config: {0}")]
    Config(String),

    #[error("{source_name} failed: {message}")]
    Source {
        source_name: &'static str,
        message: String,
    },

    #[error("invalid date range: {start} is after {end}")]
    InvalidRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}

impl EngineError {
    pub fn collaborator(source_name: &'static str, message: impl Into<String>) -> Self {
        Self::Source {
            source_name,
            message: message.into(),
        }
    }
}
