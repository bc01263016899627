// src/config/file.rs
// File-based configuration from nixfuzz.toml or ~/.nixfuzz/config.toml

use crate::manager::TestStrategy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Local config file name, looked up in the working directory
pub const LOCAL_CONFIG: &str = "nixfuzz.toml";

/// Top-level config structure
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct NixfuzzConfig {
    #[serde(default)]
    pub harness: HarnessFileConfig,
}

/// `[harness]` section. Every key is optional.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HarnessFileConfig {
    pub timeout_secs: Option<u64>,
    pub strategy: Option<TestStrategy>,
    pub random_tests: Option<usize>,
    pub nix_command: Option<String>,
    pub nix_args: Option<Vec<String>>,
    pub flake_host: Option<String>,
    pub work_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl NixfuzzConfig {
    /// Load from `explicit`, else `./nixfuzz.toml`, else the home config.
    /// A missing or unparsable file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let Some(path) = Self::config_path(explicit) else {
            debug!("No config file found, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }

    fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.is_file() {
            return Some(local);
        }
        let home = Self::home_config_path();
        home.is_file().then_some(home)
    }

    /// `~/.nixfuzz/config.toml`
    pub fn home_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".nixfuzz")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[harness]
timeout_secs = 120
strategy = "full"
nix_args = ["--extra-experimental-features", "nix-command flakes"]
seed = 7
"#;
        let config: NixfuzzConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.harness.timeout_secs, Some(120));
        assert_eq!(config.harness.strategy, Some(TestStrategy::Full));
        assert_eq!(config.harness.nix_args.unwrap().len(), 2);
        assert_eq!(config.harness.seed, Some(7));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: NixfuzzConfig = toml::from_str("").unwrap();
        assert_eq!(config, NixfuzzConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<NixfuzzConfig>("[harness]\ntimeout = 3\n").is_err());
    }

    #[test]
    fn test_unparsable_file_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[harness\n").unwrap();
        assert_eq!(NixfuzzConfig::load(Some(&path)), NixfuzzConfig::default());
    }

    #[test]
    fn test_explicit_path_loaded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cfg.toml");
        std::fs::write(&path, "[harness]\nrandom_tests = 3\n").unwrap();
        assert_eq!(NixfuzzConfig::load(Some(&path)).harness.random_tests, Some(3));
    }
}
