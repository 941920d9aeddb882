use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubwatchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] ureq::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Fetch failed: {0}")]
    FetchError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid search: {0}")]
    ValidationError(String),
}

impl SubwatchError {
    /// Get an actionable hint for how to resolve this error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            SubwatchError::HttpError(_) | SubwatchError::FetchError(_) => Some(
                "Check your internet connection, or try a single page first:\n  subwatch --test --url \"<url>\""
            ),
            SubwatchError::TomlError(_) | SubwatchError::ConfigError(_) => Some(
                "Fix or delete the config file; a default one is recreated on the next start"
            ),
            SubwatchError::ValidationError(_) => Some(
                "Prices must be non-negative and --min must not exceed --max"
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SubwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_has_hint() {
        let err = SubwatchError::ValidationError("min > max".into());
        assert!(err.to_string().contains("min > max"));
        assert!(err.hint().is_some());
    }

    #[test]
    fn test_io_error_has_no_hint() {
        let err = SubwatchError::from(std::io::Error::other("boom"));
        assert!(err.hint().is_none());
    }
}
