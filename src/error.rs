//! Error types shared by the data pipeline, the trainer and persistence.

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors raised by dataset construction, configuration and model persistence
#[derive(Error, Debug)]
pub enum ForecastError {
    /// A size, fraction or shape argument is outside its valid range
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding a model or configuration failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ForecastError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ForecastError::InvalidArgument(msg.into())
    }

    /// True for errors caused by the caller's arguments rather than the environment
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ForecastError::InvalidArgument(_))
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(error: serde_json::Error) -> Self {
        ForecastError::Serialization(error.to_string())
    }
}

impl From<bincode::Error> for ForecastError {
    fn from(error: bincode::Error) -> Self {
        ForecastError::Serialization(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_display() {
        let err = ForecastError::invalid("batch_size must be positive");
        assert!(err.is_invalid_argument());
        assert_eq!(err.to_string(), "invalid argument: batch_size must be positive");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<Vec<f64>>("[1.0,").unwrap_err();
        let err: ForecastError = parse_err.into();
        assert!(matches!(err, ForecastError::Serialization(_)));
        assert!(!err.is_invalid_argument());
    }
}
