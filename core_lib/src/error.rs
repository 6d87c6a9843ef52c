//! Application error types and handling

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Startup and configuration failures. A probe failing is never one of these;
/// see [`crate::probes::ProbeFailure`].
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required configuration '{key}' for {role} nodes")]
    MissingConfig { key: &'static str, role: String },

    #[error("Unknown node type: '{0}' (expected worker, master or storage)")]
    UnknownRole(String),

    #[error("Probe setup error: {0}")]
    Probe(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Configuration problems abort the run before any probe executes.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AppError::Config(_) | AppError::MissingConfig { .. } | AppError::UnknownRole(_)
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Probe(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_message() {
        let err = AppError::MissingConfig {
            key: "router.ips",
            role: "master".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required configuration 'router.ips' for master nodes"
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: AppError = config::ConfigError::Message("bad file".to_string()).into();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("bad file"));
    }

    #[test]
    fn test_io_error_is_not_configuration() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(!err.is_configuration());
    }
}
