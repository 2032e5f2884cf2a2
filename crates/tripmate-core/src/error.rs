use thiserror::Error;

/// Top-level error type for TripMate.
///
/// Subsystem crates define their own error types and implement
/// `From<TripmateError>` so that the `?` operator works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TripmateError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for TripmateError {
    fn from(err: toml::de::Error) -> Self {
        TripmateError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TripmateError {
    fn from(err: toml::ser::Error) -> Self {
        TripmateError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TripmateError {
    fn from(err: serde_json::Error) -> Self {
        TripmateError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for TripMate operations.
pub type Result<T> = std::result::Result<T, TripmateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TripmateError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TripmateError = io_err.into();
        assert!(matches!(err, TripmateError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let err: TripmateError = toml_err.into();
        assert!(matches!(err, TripmateError::Config(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: TripmateError = json_err.into();
        assert!(matches!(err, TripmateError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error:"));
    }
}
