// src/config/env.rs
// Environment-based configuration - every env var the harness reads

use std::path::PathBuf;
use tracing::{debug, warn};

/// Base configuration directory (required)
pub const BASE_DIR_VAR: &str = "NIXOS_CONFIG_DIR";

/// Values taken from the environment. `None` means not set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    /// NIXOS_CONFIG_DIR
    pub base_dir: Option<PathBuf>,
    /// NIXFUZZ_TIMEOUT_SECS
    pub timeout_secs: Option<u64>,
    /// NIXFUZZ_NIX_COMMAND
    pub nix_command: Option<String>,
    /// NIXFUZZ_NIX_ARGS, whitespace separated
    pub nix_args: Option<Vec<String>>,
    /// NIXFUZZ_FLAKE_HOST
    pub flake_host: Option<String>,
    /// NIXFUZZ_WORK_DIR
    pub work_dir: Option<PathBuf>,
    /// NIXFUZZ_LOG_DIR
    pub log_dir: Option<PathBuf>,
}

impl EnvConfig {
    /// Load from the process environment (call once at startup)
    pub fn load() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let timeout_secs = read("NIXFUZZ_TIMEOUT_SECS").and_then(|v| match v.trim().parse() {
            Ok(secs) => Some(secs),
            Err(_) => {
                warn!(value = %v, "Invalid NIXFUZZ_TIMEOUT_SECS, ignoring");
                None
            }
        });

        let config = Self {
            base_dir: read(BASE_DIR_VAR).map(PathBuf::from),
            timeout_secs,
            nix_command: read("NIXFUZZ_NIX_COMMAND"),
            nix_args: read("NIXFUZZ_NIX_ARGS")
                .map(|v| v.split_whitespace().map(str::to_string).collect()),
            flake_host: read("NIXFUZZ_FLAKE_HOST"),
            work_dir: read("NIXFUZZ_WORK_DIR").map(PathBuf::from),
            log_dir: read("NIXFUZZ_LOG_DIR").map(PathBuf::from),
        };
        debug!(base_dir = ?config.base_dir, "Environment configuration loaded");
        config
    }
}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ConfigValidation {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConfigValidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Format as a human-readable report
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        if !self.errors.is_empty() {
            lines.push("Errors:".to_string());
            for err in &self.errors {
                lines.push(format!("  - {}", err));
            }
        }

        if !self.warnings.is_empty() {
            lines.push("Warnings:".to_string());
            for warn in &self.warnings {
                lines.push(format!("  - {}", warn));
            }
        }

        if lines.is_empty() {
            "Configuration OK".to_string()
        } else {
            lines.join("\n")
        }
    }
}
