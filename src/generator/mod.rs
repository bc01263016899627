// src/generator/mod.rs
// Candidate configuration generation: combinations, merging, rendering

pub mod catalog;
pub mod constraints;
pub mod format;
pub mod value;

pub use catalog::{OVERRIDE_FLAGS, OptionAxis};
pub use value::{ConfigValue, ConfigurationVariant, OVERRIDES_KEY};

use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use tracing::debug;

/// Serialized configuration plus the variant it came from. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedConfig {
    text: String,
    source: ConfigurationVariant,
    resolved: ConfigurationVariant,
}

impl GeneratedConfig {
    /// Rendered Nix text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Variant as the caller supplied it
    pub fn source(&self) -> &ConfigurationVariant {
        &self.source
    }

    /// Variant after all defaults were merged in
    pub fn resolved(&self) -> &ConfigurationVariant {
        &self.resolved
    }
}

/// Produces configuration variants and their rendered form.
#[derive(Debug, Clone)]
pub struct ConfigGenerator {
    base: ConfigurationVariant,
}

impl Default for ConfigGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigGenerator {
    pub fn new() -> Self {
        Self {
            base: catalog::base_config(),
        }
    }

    /// Replace the base defaults (e.g. a different host name).
    pub fn with_base(base: ConfigurationVariant) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &ConfigurationVariant {
        &self.base
    }

    /// Valid combinations over `axes`, in Cartesian-product order, truncated
    /// to the first `max_combinations`. An empty axis list uses the defaults.
    pub fn generate_variants(
        &self,
        axes: &[OptionAxis],
        max_combinations: Option<usize>,
    ) -> Vec<ConfigurationVariant> {
        let default_axes;
        let axes = if axes.is_empty() {
            default_axes = OptionAxis::default_axes();
            &default_axes[..]
        } else {
            axes
        };

        let mut variants = constraints::enumerate_valid(axes, max_combinations);
        for variant in &mut variants {
            if variant.is_set("desktop") {
                variant.insert("mainUser", catalog::MAIN_USER);
            }
        }
        debug!(axes = axes.len(), count = variants.len(), "Generated variants");
        variants
    }

    /// Merge defaults under `variant` and render it.
    pub fn generate_config(&self, variant: &ConfigurationVariant) -> GeneratedConfig {
        let resolved = self.resolve(variant);
        let renderable: BTreeMap<String, ConfigValue> = resolved
            .iter()
            .filter(|(_, v)| !v.is_unset())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        GeneratedConfig {
            text: format::render_config(&renderable),
            source: variant.clone(),
            resolved,
        }
    }

    /// Apply precedence: base < profile < desktop < caller fields, with the
    /// caller's `overrides` merged key-by-key into the inherited flags.
    pub fn resolve(&self, variant: &ConfigurationVariant) -> ConfigurationVariant {
        let mut result = self.base.clone();
        let mut flags: BTreeMap<String, ConfigValue> =
            result.overrides().cloned().unwrap_or_default();

        if let Some(profile) = variant.get_str("systemType").and_then(catalog::profile_defaults) {
            if let Some(profile_flags) = profile.overrides() {
                flags.extend(profile_flags.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            result.update(&profile);
        }

        let desktop = if variant.contains_key("desktop") {
            variant.get_str("desktop")
        } else {
            result.get_str("desktop")
        };
        if let Some(defaults) = desktop.and_then(catalog::desktop_defaults) {
            result.update(&defaults);
        }

        for (key, value) in variant.iter() {
            if key != OVERRIDES_KEY {
                result.insert(key.clone(), value.clone());
            }
        }

        if let Some(caller_flags) = variant.overrides() {
            flags.extend(caller_flags.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if flags.is_empty() {
            result.remove(OVERRIDES_KEY);
        } else {
            result.insert(OVERRIDES_KEY, ConfigValue::Map(flags));
        }

        // Defaults can pair a caller value with one the caller never chose
        if let Some(rule) = constraints::first_violation(&result) {
            debug!(rule, "Resolved configuration violates a constraint");
        }
        result
    }

    /// One random value per catalog axis plus 3-6 toggled override flags.
    pub fn generate_random_variant(&self) -> ConfigurationVariant {
        self.generate_random_variant_with(&mut rand::rng())
    }

    /// Same as `generate_random_variant` with a caller-supplied RNG, so a
    /// seeded run is reproducible. Axis values are drawn from the values the
    /// constraints still allow, so the result is always a valid combination.
    pub fn generate_random_variant_with<R: Rng + ?Sized>(&self, rng: &mut R) -> ConfigurationVariant {
        let mut variant = ConfigurationVariant::new();
        for axis in OptionAxis::iter() {
            let allowed = constraints::allowed_values(axis, &variant);
            let value = allowed.choose(rng).cloned().unwrap_or(ConfigValue::Null);
            variant.insert(axis.key(), value);
        }
        if variant.is_set("desktop") {
            variant.insert("mainUser", catalog::MAIN_USER);
        }

        let count = rng.random_range(3..=6);
        for flag in OVERRIDE_FLAGS.choose_multiple(rng, count) {
            variant.set_override(*flag, ConfigValue::Bool(rng.random_bool(0.5)));
        }
        variant
    }
}
