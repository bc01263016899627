// tests/generator_properties_test.rs
// Properties of generated variants and rendered configurations
//
// Tests:
// 1. Rendering is deterministic
// 2. Enumerated and random variants never violate constraints
// 3. Profile defaults lose to caller overrides
// 4. The scenarios for headless and gaming variants

use nixfuzz::generator::constraints;
use nixfuzz::generator::{ConfigValue, OVERRIDE_FLAGS, OptionAxis};
use nixfuzz::{ConfigGenerator, ConfigurationVariant};
use rand::SeedableRng;
use rand::rngs::StdRng;
use strum::IntoEnumIterator;

// ============================================================================
// TEST SETUP
// ============================================================================

fn assert_constraints_hold(v: &ConfigurationVariant) {
    if v.get_str("systemType") == Some("headless") {
        assert!(!v.is_set("desktop"), "headless with desktop: {:?}", v);
        assert!(!v.is_set("displayManager"), "headless with display manager: {:?}", v);
    }
    if v.get_str("desktop") == Some("gnome") {
        let dm = v.get_str("displayManager");
        assert!(dm.is_none() || dm == Some("gdm"), "gnome with {:?}", dm);
    }
}

// ============================================================================
// PROPERTIES
// ============================================================================

#[test]
fn test_rendering_is_deterministic() {
    let generator = ConfigGenerator::new();
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..25 {
        let variant = generator.generate_random_variant_with(&mut rng);
        let a = generator.generate_config(&variant);
        let b = generator.generate_config(&variant.clone());
        assert_eq!(a.text(), b.text());
    }
}

#[test]
fn test_enumerated_variants_satisfy_constraints() {
    let generator = ConfigGenerator::new();
    let axes = [
        OptionAxis::SystemType,
        OptionAxis::Desktop,
        OptionAxis::DisplayManager,
        OptionAxis::Session,
    ];
    let variants = generator.generate_variants(&axes, None);
    assert!(!variants.is_empty());
    for v in &variants {
        assert_constraints_hold(v);
        assert!(constraints::is_valid_combination(v));
    }
    assert_eq!(variants.len(), constraints::filter_product(&axes).len());
}

#[test]
fn test_max_combinations_truncates_in_order() {
    let generator = ConfigGenerator::new();
    let axes = [OptionAxis::SystemType, OptionAxis::Desktop];
    let all = generator.generate_variants(&axes, None);
    let first = generator.generate_variants(&axes, Some(3));
    assert_eq!(first.len(), 3);
    assert_eq!(&all[..3], &first[..]);
}

#[test]
fn test_random_variants_satisfy_constraints() {
    let generator = ConfigGenerator::new();
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..200 {
        let v = generator.generate_random_variant_with(&mut rng);
        assert_constraints_hold(&v);
        for axis in OptionAxis::iter() {
            assert!(v.contains_key(axis.key()));
        }
        let flags = v.overrides().expect("random variants carry flags");
        assert!((3..=6).contains(&flags.len()));
        assert!(flags.keys().all(|k| OVERRIDE_FLAGS.contains(&k.as_str())));
    }
}

#[test]
fn test_caller_overrides_beat_profile_defaults() {
    let generator = ConfigGenerator::new();
    let variant = ConfigurationVariant::new()
        .with("systemType", "gaming")
        .with_override("enableDiscord", false);
    let resolved = generator.resolve(&variant);
    let flags = resolved.overrides().expect("gaming profile sets flags");
    assert_eq!(flags.get("enableDiscord"), Some(&ConfigValue::Bool(false)));
    assert_eq!(flags.get("enableSteam"), Some(&ConfigValue::Bool(true)));
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_headless_omits_desktop_keys() {
    let generator = ConfigGenerator::new();
    let variant = ConfigurationVariant::new()
        .with("systemType", "headless")
        .with("desktop", ConfigValue::Null);
    let text = generator.generate_config(&variant).text().to_string();
    assert!(!text.contains("desktop ="));
    assert!(!text.contains("displayManager ="));
    assert!(!text.contains("session ="));
    assert!(text.contains("systemType = \"headless\";"));
}

#[test]
fn test_gaming_profile_merges_flags() {
    let generator = ConfigGenerator::new();
    let variant = ConfigurationVariant::new()
        .with("systemType", "gaming")
        .with_override("enableSteam", true);
    let config = generator.generate_config(&variant);
    let flags = config.resolved().overrides().expect("flags present");
    for flag in ["enableSteam", "enableGameMode", "enableDiscord"] {
        assert_eq!(flags.get(flag), Some(&ConfigValue::Bool(true)), "{}", flag);
    }
    assert!(config.text().contains("enableGameMode = true;"));
}
