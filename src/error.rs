use thiserror::Error;

/// Failures of the scoring core.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A model or metadata artifact is missing or malformed. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A vector the scaler or classifier cannot accept. Fatal for the request.
    #[error("input shape error: {0}")]
    InputShape(String),
}

impl EngineError {
    pub fn configuration(message: impl Into<String>) -> Self {
        EngineError::Configuration(message.into())
    }

    pub fn input_shape(message: impl Into<String>) -> Self {
        EngineError::InputShape(message.into())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
