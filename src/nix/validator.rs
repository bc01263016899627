// src/nix/validator.rs
// Evaluates a staged workspace with `nix eval`

use super::{NixTool, ValidationResult};
use crate::environment::TestEnvironment;
use tracing::{error, info};

/// Expression evaluated inside the workspace
pub const EVAL_EXPR: &str = "import ./flake.nix";

/// Runs the evaluate subcommand against a workspace.
#[derive(Debug, Clone)]
pub struct Validator {
    tool: NixTool,
    current_test: Option<String>,
}

impl Validator {
    pub fn new(tool: NixTool) -> Self {
        Self {
            tool,
            current_test: None,
        }
    }

    pub fn set_current_test(&mut self, name: &str) {
        self.current_test = Some(name.to_string());
    }

    pub fn current_test(&self) -> Option<&str> {
        self.current_test.as_deref()
    }

    pub fn args() -> [&'static str; 5] {
        ["eval", "--impure", "--expr", EVAL_EXPR, "--show-trace"]
    }

    /// Evaluate the workspace. Tool failures and timeouts come back as
    /// `success = false` with the diagnostic text; this never errors.
    pub async fn validate(&self, env: &TestEnvironment) -> ValidationResult {
        let test = self.current_test().unwrap_or("unknown_test");
        info!(test, env = %env.id(), "Validating configuration");

        let mut result = self.tool.run(&Self::args(), env.path(), &[]).await;
        if result.success {
            info!(test, elapsed_ms = result.duration.as_millis() as u64, "Configuration validation successful");
            result.diagnostic_text.clear();
        } else {
            error!(test, timed_out = result.timed_out, "Validation failed");
        }
        result
    }
}
