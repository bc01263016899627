// src/nix/builder.rs
// Dry-run builds of a staged workspace's system toplevel

use super::{BuildResult, NixTool};
use crate::environment::TestEnvironment;
use tracing::{error, info};

/// Runs the build subcommand against a workspace.
#[derive(Debug, Clone)]
pub struct Builder {
    tool: NixTool,
    host: String,
    current_test: Option<String>,
}

impl Builder {
    pub fn new(tool: NixTool, host: impl Into<String>) -> Self {
        Self {
            tool,
            host: host.into(),
            current_test: None,
        }
    }

    pub fn set_current_test(&mut self, name: &str) {
        self.current_test = Some(name.to_string());
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Build output selector for a workspace
    pub fn target(&self, env: &TestEnvironment) -> String {
        format!(
            "path:{}#nixosConfigurations.{}.config.system.build.toplevel",
            env.path().display(),
            self.host
        )
    }

    /// Dry-run build of the workspace. Never errors; see `Validator::validate`.
    pub async fn build(&self, env: &TestEnvironment) -> BuildResult {
        let test = self.current_test.as_deref().unwrap_or("unknown_test");
        let target = self.target(env);
        info!(test, target = %target, "Building configuration");

        let args = [
            "build",
            target.as_str(),
            "--no-link",
            "--dry-run",
            "--impure",
            "--accept-flake-config",
        ];
        let result = self
            .tool
            .run(&args, env.path(), &[("NO_UPDATE_LOCK_FILE", "1")])
            .await;

        if result.success {
            info!(test, elapsed_ms = result.duration.as_millis() as u64, "Configuration build successful");
        } else {
            error!(test, timed_out = result.timed_out, "Build failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fake_tool, fixture};

    #[test]
    fn test_target_names_host_toplevel() {
        let fx = fixture();
        let env = fx.envs.create().unwrap();
        let builder = Builder::new(fake_tool("exit 0"), "testhost");
        let target = builder.target(&env);
        assert!(target.starts_with("path:"));
        assert!(target.ends_with("#nixosConfigurations.testhost.config.system.build.toplevel"));
    }

    #[tokio::test]
    async fn test_build_is_dry_run_without_lock_updates() {
        let fx = fixture();
        let env = fx.envs.create().unwrap();
        let builder = Builder::new(fake_tool("echo \"$@ lock=$NO_UPDATE_LOCK_FILE\" >&2; exit 1"), "testhost");
        let result = builder.build(&env).await;
        assert!(!result.success);
        let text = &result.diagnostic_text;
        assert!(text.starts_with("build path:"));
        assert!(text.contains("--dry-run"));
        assert!(text.contains("--no-link"));
        assert!(text.contains("--accept-flake-config"));
        assert!(text.contains("lock=1"));
    }

    #[tokio::test]
    async fn test_build_success() {
        let fx = fixture();
        let env = fx.envs.create().unwrap();
        let mut builder = Builder::new(fake_tool("exit 0"), "testhost");
        builder.set_current_test("gaming_profile");
        assert!(builder.build(&env).await.success);
    }
}
