// src/cli/run.rs
// `nixfuzz run`: one full test session

use super::RunArgs;
use crate::config::HarnessSettings;
use crate::harness::{HarnessRunner, SuiteOptions, build_suite};
use crate::manager::ConfigManager;
use crate::session::{SessionContext, SessionReporter};
use anyhow::{Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;
use tracing::{info, warn};

/// Fold CLI flags over the resolved settings
fn apply_args(settings: &mut HarnessSettings, args: &RunArgs) {
    if let Some(strategy) = args.test_strategy {
        settings.strategy = strategy;
    }
    if let Some(n) = args.random_tests {
        settings.random_tests = n;
    }
    if let Some(seed) = args.seed {
        settings.seed = Some(seed);
    }
    if let Some(secs) = args.timeout {
        settings.timeout_secs = secs;
    }
}

/// Run a session. Returns whether every test passed.
pub async fn run_session(config: Option<&Path>, args: RunArgs) -> Result<bool> {
    let mut settings = HarnessSettings::load(config);
    apply_args(&mut settings, &args);

    let validation = settings.validate();
    for warning in &validation.warnings {
        warn!("{}", warning);
    }
    if !validation.is_valid() {
        bail!("Cannot start test session:\n{}", validation.report());
    }

    let envs = settings.environment_manager()?;
    let context = SessionContext::new();
    let manager = ConfigManager::new(
        context.clone(),
        envs,
        settings.validator(),
        settings.builder(),
        settings.strategy,
    )
    .with_log_dir(&settings.log_dir);
    let reporter = SessionReporter::new(context).with_log_dir(&settings.log_dir);

    let generator = settings.generator();
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let options = SuiteOptions {
        groups: args.groups.clone(),
        random_tests: settings.random_tests,
        matrix_axes: args.matrix.clone(),
        max_combinations: args.max_combinations,
    };
    let cases = build_suite(&generator, &options, &mut rng);
    info!(
        cases = cases.len(),
        strategy = %settings.strategy,
        timeout_secs = settings.timeout_secs,
        seed = ?settings.seed,
        "Test suite assembled"
    );

    let mut runner = HarnessRunner::new(generator, manager, reporter).show_progress(args.show_progress);
    let summary = runner.run(&cases).await?;

    println!("{}", summary.report);
    Ok(summary.is_success())
}
