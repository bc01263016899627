// src/config/mod.rs
// Harness settings: defaults < config file < environment < CLI

pub mod env;
pub mod file;

pub use env::{ConfigValidation, EnvConfig};
pub use file::NixfuzzConfig;

use crate::environment::{EnvironmentManager, verify_base_dir};
use crate::error::{HarnessError, Result};
use crate::generator::{ConfigGenerator, catalog};
use crate::manager::TestStrategy;
use crate::nix::{Builder, NixTool, Validator};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RANDOM_TESTS: usize = 20;

/// Fully resolved settings for one session
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessSettings {
    pub base_dir: Option<PathBuf>,
    /// Bound for each evaluate and build call
    pub timeout_secs: u64,
    pub strategy: TestStrategy,
    pub random_tests: usize,
    pub nix_command: String,
    pub nix_args: Vec<String>,
    pub flake_host: String,
    pub work_dir: PathBuf,
    pub log_dir: PathBuf,
    pub seed: Option<u64>,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            base_dir: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            strategy: TestStrategy::default(),
            random_tests: DEFAULT_RANDOM_TESTS,
            nix_command: "nix".to_string(),
            nix_args: Vec::new(),
            flake_host: catalog::DEFAULT_HOST.to_string(),
            work_dir: std::env::temp_dir().join("nixfuzz"),
            log_dir: PathBuf::from("logs").join("nixfuzz"),
            seed: None,
        }
    }
}

impl HarnessSettings {
    /// Layer the config file and then the environment over the defaults
    pub fn resolve(file: &NixfuzzConfig, env: &EnvConfig) -> Self {
        let mut s = Self::default();
        let h = &file.harness;

        if let Some(v) = h.timeout_secs {
            s.timeout_secs = v;
        }
        if let Some(v) = h.strategy {
            s.strategy = v;
        }
        if let Some(v) = h.random_tests {
            s.random_tests = v;
        }
        if let Some(v) = &h.nix_command {
            s.nix_command = v.clone();
        }
        if let Some(v) = &h.nix_args {
            s.nix_args = v.clone();
        }
        if let Some(v) = &h.flake_host {
            s.flake_host = v.clone();
        }
        if let Some(v) = &h.work_dir {
            s.work_dir = v.clone();
        }
        if let Some(v) = &h.log_dir {
            s.log_dir = v.clone();
        }
        s.seed = h.seed;

        s.base_dir = env.base_dir.clone();
        if let Some(v) = env.timeout_secs {
            s.timeout_secs = v;
        }
        if let Some(v) = &env.nix_command {
            s.nix_command = v.clone();
        }
        if let Some(v) = &env.nix_args {
            s.nix_args = v.clone();
        }
        if let Some(v) = &env.flake_host {
            s.flake_host = v.clone();
        }
        if let Some(v) = &env.work_dir {
            s.work_dir = v.clone();
        }
        if let Some(v) = &env.log_dir {
            s.log_dir = v.clone();
        }
        s
    }

    /// Load the file and process environment and resolve them
    pub fn load(config_path: Option<&Path>) -> Self {
        Self::resolve(&NixfuzzConfig::load(config_path), &EnvConfig::load())
    }

    /// Normalize values and report problems. Errors are session-fatal.
    pub fn validate(&mut self) -> ConfigValidation {
        let mut validation = ConfigValidation::new();

        if self.timeout_secs == 0 {
            validation.add_warning("Timeout of 0s is not usable; clamped to 1s.");
            self.timeout_secs = 1;
        }
        if self.nix_command.trim().is_empty() {
            validation.add_error("The nix command is empty. Set NIXFUZZ_NIX_COMMAND or nix_command.");
        }
        if self.flake_host.trim().is_empty() {
            validation.add_error("The flake host is empty. Set NIXFUZZ_FLAKE_HOST or flake_host.");
        }
        if let Err(e) = self.require_base_dir() {
            validation.add_error(e.to_string());
        }

        validation
    }

    /// The base directory, verified to hold every required file
    pub fn require_base_dir(&self) -> Result<&Path> {
        let dir = self.base_dir.as_deref().ok_or(HarnessError::BaseDirUnset)?;
        verify_base_dir(dir)?;
        Ok(dir)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn nix_tool(&self) -> NixTool {
        NixTool::new(self.nix_command.clone(), self.nix_args.clone(), self.timeout())
    }

    pub fn validator(&self) -> Validator {
        Validator::new(self.nix_tool())
    }

    pub fn builder(&self) -> Builder {
        Builder::new(self.nix_tool(), self.flake_host.clone())
    }

    pub fn environment_manager(&self) -> Result<EnvironmentManager> {
        let base = self.require_base_dir()?;
        Ok(EnvironmentManager::new(base, &self.work_dir))
    }

    /// Generator whose base config names the configured host
    pub fn generator(&self) -> ConfigGenerator {
        ConfigGenerator::with_base(catalog::base_config().with("hostName", self.flake_host.as_str()))
    }
}
