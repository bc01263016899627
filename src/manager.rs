// src/manager.rs
// Orchestrates stage -> validate -> build for the current test

use crate::classifier::{ClassifiedError, ErrorClassifier, extract};
use crate::environment::{EnvState, EnvironmentManager, TestEnvironment};
use crate::error::{HarnessError, Result};
use crate::generator::GeneratedConfig;
use crate::nix::{Builder, ToolResult, Validator};
use crate::session::{AppliedConfig, SessionContext, report};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Whether the builder runs after a successful validation
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TestStrategy {
    #[default]
    ValidateOnly,
    Full,
}

/// Result of one pipeline step as seen by the test layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Passed,
    /// Step not applicable under the active strategy
    Skipped,
    Failed { message: String },
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, StepOutcome::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            StepOutcome::Failed { message } => Some(message),
            _ => None,
        }
    }
}

pub struct ConfigManager {
    context: Arc<SessionContext>,
    envs: EnvironmentManager,
    validator: Validator,
    builder: Builder,
    classifier: ErrorClassifier,
    strategy: TestStrategy,
    log_dir: Option<PathBuf>,
    current_test: Option<String>,
    env: Option<TestEnvironment>,
}

impl ConfigManager {
    pub fn new(
        context: Arc<SessionContext>,
        envs: EnvironmentManager,
        validator: Validator,
        builder: Builder,
        strategy: TestStrategy,
    ) -> Self {
        Self {
            context,
            envs,
            validator,
            builder,
            classifier: ErrorClassifier::new(),
            strategy,
            log_dir: None,
            current_test: None,
            env: None,
        }
    }

    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Write per-test error artifacts to `dir`
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn strategy(&self) -> TestStrategy {
        self.strategy
    }

    pub fn environments(&self) -> &EnvironmentManager {
        &self.envs
    }

    pub fn current_test(&self) -> Option<&str> {
        self.current_test.as_deref()
    }

    pub fn environment(&self) -> Option<&TestEnvironment> {
        self.env.as_ref()
    }

    /// Attribute everything that follows to `name`
    pub fn set_current_test(&mut self, name: &str) {
        debug!(test = name, "Current test set");
        self.current_test = Some(name.to_string());
        self.validator.set_current_test(name);
        self.builder.set_current_test(name);
    }

    fn test_name(&self) -> &str {
        self.current_test.as_deref().unwrap_or("unknown_test")
    }

    /// Create a fresh workspace, releasing any previous one.
    pub fn open_environment(&mut self) -> Result<&TestEnvironment> {
        self.close_environment()?;
        let env = self.envs.create()?;
        Ok(&*self.env.insert(env))
    }

    /// Destroy the active workspace, if any.
    pub fn close_environment(&mut self) -> Result<()> {
        match self.env.take() {
            Some(env) => self.envs.destroy(env),
            None => Ok(()),
        }
    }

    /// Stage `config` into the active workspace and remember what was applied.
    pub fn apply_config(&mut self, config: &GeneratedConfig, test_name: Option<&str>) -> Result<()> {
        if let Some(name) = test_name {
            self.set_current_test(name);
        }
        let test = self.test_name().to_string();
        let env = self.env.as_mut().ok_or(HarnessError::NoEnvironment)?;
        self.envs.stage(env, config)?;

        self.context.record_applied(AppliedConfig {
            test_name: test,
            variant: config.source().clone(),
            config_text: config.text().to_string(),
        });
        Ok(())
    }

    /// Evaluate the staged configuration.
    pub async fn validate_config(&mut self) -> StepOutcome {
        let Some(env) = self.env.as_ref() else {
            return self.fail_without_tool(HarnessError::NoEnvironment.to_string());
        };
        if env.state() != EnvState::Staged {
            let message = format!("cannot validate a workspace in state {}", env.state());
            return self.fail_without_tool(message);
        }

        let result = self.validator.validate(env).await;
        self.settle(result, |env| env.mark_validated())
    }

    /// Build the validated configuration; a no-op under validate-only.
    pub async fn build_config(&mut self) -> StepOutcome {
        if self.strategy == TestStrategy::ValidateOnly {
            return StepOutcome::Skipped;
        }
        let Some(env) = self.env.as_ref() else {
            return self.fail_without_tool(HarnessError::NoEnvironment.to_string());
        };
        if env.state() != EnvState::Validated {
            return self.fail_without_tool("configuration must be validated before building".to_string());
        }

        let result = self.builder.build(env).await;
        self.settle(result, |env| env.mark_built())
    }

    fn settle(
        &mut self,
        result: ToolResult,
        advance: impl FnOnce(&mut TestEnvironment) -> Result<()>,
    ) -> StepOutcome {
        if result.success {
            if let Some(env) = self.env.as_mut() {
                if let Err(e) = advance(env) {
                    return StepOutcome::Failed { message: e.to_string() };
                }
            }
            return StepOutcome::Passed;
        }
        let text = match self.env.as_ref() {
            Some(env) => extract::mask_workspace(&result.diagnostic_text, env.path()),
            None => result.diagnostic_text.clone(),
        };
        let error = self.classifier.classify(&text, self.test_name());
        self.report_failure(vec![error], &result.diagnostic_text)
    }

    fn fail_without_tool(&mut self, message: String) -> StepOutcome {
        warn!(test = self.test_name(), %message, "Step not runnable");
        StepOutcome::Failed { message }
    }

    fn report_failure(&mut self, errors: Vec<ClassifiedError>, diagnostic_text: &str) -> StepOutcome {
        let test = self.test_name().to_string();
        for error in &errors {
            self.context.record_error(error.clone());
        }

        if let Some(dir) = &self.log_dir {
            let applied = self.context.applied_for(&test);
            if let Err(e) =
                report::write_test_artifacts(dir, &test, applied.as_ref(), &errors, diagnostic_text)
            {
                warn!(test = %test, error = %e, "Failed to write error artifacts");
            }
        }

        let message = errors
            .iter()
            .map(ClassifiedError::render)
            .collect::<Vec<_>>()
            .join("\n");
        StepOutcome::Failed { message }
    }

    /// Errors recorded so far for the current test
    pub fn current_errors(&self) -> Vec<ClassifiedError> {
        self.context.errors_for(self.test_name())
    }
}
