// src/nix/mod.rs
// Invocation of the external nix tool with bounded runtime

pub mod builder;
pub mod validator;

pub use builder::Builder;
pub use validator::Validator;

use std::path::Path;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Maximum captured output size (64KB)
const MAX_OUTPUT_SIZE: usize = 64 * 1024;

/// Default bound for a single evaluate or build call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Outcome of one tool call. Never an error: failures live in the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub success: bool,
    pub diagnostic_text: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub duration: Duration,
}

pub type ValidationResult = ToolResult;
pub type BuildResult = ToolResult;

impl ToolResult {
    /// Trivially successful result for skipped steps
    pub fn skipped() -> Self {
        Self {
            success: true,
            diagnostic_text: String::new(),
            exit_code: None,
            timed_out: false,
            duration: Duration::ZERO,
        }
    }

    fn failure(diagnostic_text: String, duration: Duration) -> Self {
        Self {
            success: false,
            diagnostic_text,
            exit_code: None,
            timed_out: false,
            duration,
        }
    }
}

/// How to reach the tool: a program plus prefix arguments placed before the
/// subcommand (e.g. `--extra-experimental-features "nix-command flakes"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NixTool {
    pub program: String,
    pub prefix_args: Vec<String>,
    pub timeout: Duration,
}

impl Default for NixTool {
    fn default() -> Self {
        Self {
            program: "nix".to_string(),
            prefix_args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl NixTool {
    pub fn new(program: impl Into<String>, prefix_args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            prefix_args,
            timeout,
        }
    }

    /// Human-readable command line for logs
    pub fn describe(&self, args: &[&str]) -> String {
        let mut parts = vec![self.program.as_str()];
        parts.extend(self.prefix_args.iter().map(String::as_str));
        parts.extend(args.iter().copied());
        parts.join(" ")
    }

    /// Run the tool in `cwd`, bounded by the configured timeout.
    ///
    /// The working directory is passed to the child; the harness process
    /// never changes its own. The child is spawned with `kill_on_drop`, so
    /// when the timeout drops the pending future tokio kills the process.
    pub async fn run(&self, args: &[&str], cwd: &Path, envs: &[(&str, &str)]) -> ToolResult {
        let start = Instant::now();
        let command_line = self.describe(args);
        debug!(command = %command_line, cwd = %cwd.display(), "Running tool");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix_args)
            .args(args)
            .current_dir(cwd)
            .kill_on_drop(true);
        for (key, value) in envs {
            cmd.env(key, value);
        }

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(command = %command_line, error = %e, "Failed to run tool");
                return ToolResult::failure(
                    format!("error: failed to run `{}`: {}", command_line, e),
                    start.elapsed(),
                );
            }
            Err(_) => {
                warn!(command = %command_line, timeout_secs = self.timeout.as_secs(), "Tool timed out");
                return ToolResult {
                    timed_out: true,
                    ..ToolResult::failure(
                        format!(
                            "error: `{}` timed out after {}s and was terminated",
                            command_line,
                            self.timeout.as_secs()
                        ),
                        start.elapsed(),
                    )
                };
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let success = output.status.success();
        let duration = start.elapsed();

        debug!(
            command = %command_line,
            exit_code = ?output.status.code(),
            elapsed_ms = duration.as_millis() as u64,
            "Tool finished"
        );

        let diagnostic_text = if stderr.trim().is_empty() { stdout } else { stderr };
        ToolResult {
            success,
            diagnostic_text: truncate_single(&diagnostic_text, MAX_OUTPUT_SIZE),
            exit_code: output.status.code(),
            timed_out: false,
            duration,
        }
    }
}

/// Truncate keeping head and tail, where nix puts the interesting parts.
/// Both budgets are in bytes, cut at char boundaries.
fn truncate_single(s: &str, max_size: usize) -> String {
    if s.len() <= max_size {
        return s.to_string();
    }

    // Keep first ~75% and last ~20%
    let mut head_end = (max_size * 3) / 4;
    while !s.is_char_boundary(head_end) {
        head_end -= 1;
    }
    let mut tail_start = s.len() - max_size / 5;
    while !s.is_char_boundary(tail_start) {
        tail_start += 1;
    }

    let omitted = tail_start - head_end;
    format!("{}\n\n... [{} bytes omitted] ...\n\n{}", &s[..head_end], omitted, &s[tail_start..])
}
