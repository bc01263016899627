// src/cli/variants.rs
// `nixfuzz variants`: enumerate valid combinations

use crate::generator::{ConfigGenerator, OptionAxis};
use anyhow::Result;
use std::io::Write;

pub fn run_variants(axes: &[OptionAxis], max_combinations: Option<usize>) -> Result<()> {
    let variants = ConfigGenerator::new().generate_variants(axes, max_combinations);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for variant in &variants {
        writeln!(out, "{}", serde_json::to_string(variant)?)?;
    }
    Ok(())
}
