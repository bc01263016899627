// src/generator/constraints.rs
// Known-invalid option pairings and constraint-directed enumeration

use super::catalog::OptionAxis;
use super::value::{ConfigValue, ConfigurationVariant};

/// A rule describing a combination that can never evaluate.
///
/// `violated` must treat missing keys as "not yet decided": a partial
/// assignment is only rejected once the keys the rule inspects are present.
/// Violations are monotone, so pruning a partial assignment is sound.
pub struct Constraint {
    pub name: &'static str,
    pub violated: fn(&ConfigurationVariant) -> bool,
}

fn is_headless(v: &ConfigurationVariant) -> bool {
    v.get_str("systemType") == Some("headless")
}

/// Ordered constraint table
pub static CONSTRAINTS: &[Constraint] = &[
    Constraint {
        name: "headless-without-desktop",
        violated: |v| is_headless(v) && (v.is_set("desktop") || v.is_set("displayManager")),
    },
    Constraint {
        name: "headless-without-session",
        violated: |v| is_headless(v) && v.is_set("session"),
    },
    Constraint {
        name: "gnome-requires-gdm",
        violated: |v| {
            v.get_str("desktop") == Some("gnome")
                && v.get_str("displayManager").is_some_and(|dm| dm != "gdm")
        },
    },
];

/// First constraint the variant violates, if any
pub fn first_violation(variant: &ConfigurationVariant) -> Option<&'static str> {
    CONSTRAINTS
        .iter()
        .find(|c| (c.violated)(variant))
        .map(|c| c.name)
}

pub fn is_valid_combination(variant: &ConfigurationVariant) -> bool {
    first_violation(variant).is_none()
}

/// Values of `axis` that keep `partial` valid.
pub fn allowed_values(axis: OptionAxis, partial: &ConfigurationVariant) -> Vec<ConfigValue> {
    let mut probe = partial.clone();
    axis.values()
        .into_iter()
        .filter(|value| {
            probe.insert(axis.key(), value.clone());
            is_valid_combination(&probe)
        })
        .collect()
}

/// Enumerate valid combinations depth-first, in Cartesian-product order.
///
/// Produces exactly `product(axes).filter(is_valid_combination)` without
/// materializing rejected combinations. Stops after `limit` results.
pub fn enumerate_valid(axes: &[OptionAxis], limit: Option<usize>) -> Vec<ConfigurationVariant> {
    let mut out = Vec::new();
    if limit == Some(0) {
        return out;
    }
    let mut partial = ConfigurationVariant::new();
    descend(axes, &mut partial, limit, &mut out);
    out
}

fn descend(
    axes: &[OptionAxis],
    partial: &mut ConfigurationVariant,
    limit: Option<usize>,
    out: &mut Vec<ConfigurationVariant>,
) -> bool {
    let Some((axis, rest)) = axes.split_first() else {
        out.push(partial.clone());
        return limit.is_some_and(|n| out.len() >= n);
    };

    for value in allowed_values(*axis, partial) {
        partial.insert(axis.key(), value);
        if descend(rest, partial, limit, out) {
            return true;
        }
    }
    partial.remove(axis.key());
    false
}

/// Plain generate-then-reject over the full product. Kept as the reference
/// the pruned enumeration is checked against.
pub fn filter_product(axes: &[OptionAxis]) -> Vec<ConfigurationVariant> {
    let mut combos = vec![ConfigurationVariant::new()];
    for axis in axes {
        let values = axis.values();
        combos = combos
            .into_iter()
            .flat_map(|base| {
                values.iter().map(move |value| {
                    let mut next = base.clone();
                    next.insert(axis.key(), value.clone());
                    next
                })
            })
            .collect();
    }
    combos.into_iter().filter(is_valid_combination).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(pairs: &[(&str, Option<&str>)]) -> ConfigurationVariant {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), ConfigValue::from(*v)))
            .collect()
    }

    // ============================================================================
    // Individual rules
    // ============================================================================

    #[test]
    fn test_headless_with_desktop_rejected() {
        let v = variant(&[("systemType", Some("headless")), ("desktop", Some("plasma"))]);
        assert_eq!(first_violation(&v), Some("headless-without-desktop"));
    }

    #[test]
    fn test_headless_with_null_desktop_accepted() {
        let v = variant(&[("systemType", Some("headless")), ("desktop", None), ("displayManager", None)]);
        assert!(is_valid_combination(&v));
    }

    #[test]
    fn test_headless_empty_string_counts_as_unset() {
        let v = variant(&[("systemType", Some("headless")), ("desktop", Some(""))]);
        assert!(is_valid_combination(&v));
    }

    #[test]
    fn test_gnome_with_sddm_rejected() {
        let v = variant(&[("desktop", Some("gnome")), ("displayManager", Some("sddm"))]);
        assert_eq!(first_violation(&v), Some("gnome-requires-gdm"));
    }

    #[test]
    fn test_gnome_with_gdm_or_unset_accepted() {
        assert!(is_valid_combination(&variant(&[("desktop", Some("gnome")), ("displayManager", Some("gdm"))])));
        assert!(is_valid_combination(&variant(&[("desktop", Some("gnome")), ("displayManager", None)])));
    }

    // ============================================================================
    // Enumeration
    // ============================================================================

    #[test]
    fn test_enumeration_matches_filtered_product() {
        let axes = [
            OptionAxis::SystemType,
            OptionAxis::Desktop,
            OptionAxis::DisplayManager,
            OptionAxis::Audio,
        ];
        assert_eq!(enumerate_valid(&axes, None), filter_product(&axes));
    }

    #[test]
    fn test_enumeration_limit_takes_prefix() {
        let axes = [OptionAxis::SystemType, OptionAxis::Desktop, OptionAxis::DisplayManager];
        let all = enumerate_valid(&axes, None);
        let first_five = enumerate_valid(&axes, Some(5));
        assert_eq!(first_five, all[..5].to_vec());
        assert!(enumerate_valid(&axes, Some(0)).is_empty());
    }

    #[test]
    fn test_enumerated_variants_are_sound() {
        let axes = [OptionAxis::SystemType, OptionAxis::Desktop, OptionAxis::DisplayManager, OptionAxis::Session];
        for v in enumerate_valid(&axes, None) {
            if v.get_str("systemType") == Some("headless") {
                assert!(!v.is_set("desktop") && !v.is_set("displayManager") && !v.is_set("session"));
            }
            if v.get_str("desktop") == Some("gnome") {
                assert!(matches!(v.get_str("displayManager"), None | Some("gdm")));
            }
        }
    }

    #[test]
    fn test_allowed_values_after_headless() {
        let partial = variant(&[("systemType", Some("headless"))]);
        assert_eq!(allowed_values(OptionAxis::Desktop, &partial), vec![ConfigValue::Null]);
    }
}
