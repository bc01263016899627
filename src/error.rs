// src/error.rs
// Standardized error types for the harness

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the nixfuzz library
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("NIXOS_CONFIG_DIR environment variable is not set")]
    BaseDirUnset,

    #[error("base configuration directory does not exist: {}", .0.display())]
    BaseDirMissing(PathBuf),

    #[error("missing required files in {}: {}", .dir.display(), .missing.join(", "))]
    MissingBaseFiles { dir: PathBuf, missing: Vec<String> },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid environment state: {0}")]
    InvalidState(String),

    #[error("no test environment is active")]
    NoEnvironment,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Convenience type alias for Result using HarnessError
pub type Result<T> = std::result::Result<T, HarnessError>;

impl HarnessError {
    /// Startup conditions that make every test in a session unwinnable.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            HarnessError::BaseDirUnset
                | HarnessError::BaseDirMissing(_)
                | HarnessError::MissingBaseFiles { .. }
        )
    }
}

impl From<String> for HarnessError {
    fn from(s: String) -> Self {
        HarnessError::InvalidInput(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // Display
    // ============================================================================

    #[test]
    fn test_missing_base_files_lists_names() {
        let err = HarnessError::MissingBaseFiles {
            dir: PathBuf::from("/etc/nixos"),
            missing: vec!["flake.lock".to_string(), "modules/".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("/etc/nixos"));
        assert!(msg.contains("flake.lock, modules/"));
    }

    #[test]
    fn test_base_dir_missing_display() {
        let err = HarnessError::BaseDirMissing(PathBuf::from("/nope"));
        assert!(err.to_string().contains("/nope"));
    }

    // ============================================================================
    // Fatality
    // ============================================================================

    #[test]
    fn test_startup_errors_are_session_fatal() {
        assert!(HarnessError::BaseDirUnset.is_session_fatal());
        assert!(HarnessError::BaseDirMissing(PathBuf::from("/x")).is_session_fatal());
        assert!(
            HarnessError::MissingBaseFiles {
                dir: PathBuf::from("/x"),
                missing: vec![]
            }
            .is_session_fatal()
        );
    }

    #[test]
    fn test_runtime_errors_are_not_session_fatal() {
        assert!(!HarnessError::NoEnvironment.is_session_fatal());
        assert!(!HarnessError::InvalidState("x".into()).is_session_fatal());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!HarnessError::from(io).is_session_fatal());
    }

    #[test]
    fn test_from_string() {
        let err: HarnessError = "bad axis".to_string().into();
        assert!(matches!(err, HarnessError::InvalidInput(_)));
        assert!(err.to_string().contains("bad axis"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= nope").unwrap_err();
        let err: HarnessError = toml_err.into();
        assert!(matches!(err, HarnessError::Toml(_)));
    }
}
