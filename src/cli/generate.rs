// src/cli/generate.rs
// `nixfuzz generate`: render one variant

use crate::config::HarnessSettings;
use crate::generator::{ConfigValue, ConfigurationVariant};
use anyhow::{Context, Result, anyhow, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;

fn split_pair(raw: &str) -> Result<(&str, &str)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in '{}'", raw);
    }
    Ok((key, value))
}

/// Build the variant described by `--set` and `--override` pairs
pub fn variant_from_pairs(
    base: ConfigurationVariant,
    set: &[String],
    overrides: &[String],
) -> Result<ConfigurationVariant> {
    let mut variant = base;
    for raw in set {
        let (key, value) = split_pair(raw)?;
        variant.insert(key, ConfigValue::parse_literal(value));
    }
    for raw in overrides {
        let (flag, value) = split_pair(raw)?;
        let enabled: bool = value
            .trim()
            .parse()
            .with_context(|| format!("override '{}' must be true or false", flag))?;
        variant.set_override(flag, ConfigValue::Bool(enabled));
    }
    Ok(variant)
}

pub fn run_generate(
    config: Option<&Path>,
    set: &[String],
    overrides: &[String],
    random: bool,
    seed: Option<u64>,
) -> Result<()> {
    let settings = HarnessSettings::load(config);
    let generator = settings.generator();

    let base = if random {
        match seed {
            Some(seed) => generator.generate_random_variant_with(&mut StdRng::seed_from_u64(seed)),
            None => generator.generate_random_variant(),
        }
    } else {
        ConfigurationVariant::new()
    };
    let variant = variant_from_pairs(base, set, overrides)?;

    let generated = generator.generate_config(&variant);
    eprintln!("# variant: {}", serde_json::to_string(generated.source())?);
    print!("{}", generated.text());
    Ok(())
}
