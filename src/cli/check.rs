// src/cli/check.rs
// `nixfuzz check`: validate settings and the base configuration directory

use crate::config::HarnessSettings;
use anyhow::Result;
use std::path::Path;

/// Print the settings and validation report. Returns whether they are usable.
pub fn run_check(config: Option<&Path>) -> Result<bool> {
    let mut settings = HarnessSettings::load(config);
    let validation = settings.validate();

    println!("nixfuzz configuration");
    println!("=====================");
    match &settings.base_dir {
        Some(dir) => println!("Base dir:     {}", dir.display()),
        None => println!("Base dir:     (NIXOS_CONFIG_DIR not set)"),
    }
    println!("Tool:         {}", settings.nix_tool().describe(&[]));
    println!("Timeout:      {}s", settings.timeout_secs);
    println!("Strategy:     {}", settings.strategy);
    println!("Random tests: {}", settings.random_tests);
    println!("Flake host:   {}", settings.flake_host);
    println!("Work dir:     {}", settings.work_dir.display());
    println!("Log dir:      {}", settings.log_dir.display());
    println!();
    println!("{}", validation.report());

    Ok(validation.is_valid())
}
