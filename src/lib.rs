// src/lib.rs
// nixfuzz - fuzz-validation harness for generated NixOS configurations

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod classifier;
pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod generator;
pub mod harness;
pub mod manager;
pub mod nix;
pub mod session;

#[cfg(test)]
mod test_support;

pub use classifier::{ClassifiedError, ErrorClassifier, ErrorKind, Severity};
pub use environment::{EnvironmentManager, TestEnvironment};
pub use error::{HarnessError, Result};
pub use generator::{ConfigGenerator, ConfigurationVariant, GeneratedConfig};
pub use manager::{ConfigManager, StepOutcome, TestStrategy};
pub use session::{SessionContext, SessionReporter, SessionSummary};
