//! Property-based tests for the damage simulator
//!
//! Tests invariants:
//! - Every series has one entry per strike
//! - Cumulative totals are non-decreasing and end at the sum of strikes
//! - Damage is never negative
//! - Histogram counts add up to the recorded damage values
//! - Assigned ids are unique and keep configuration order

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

use crate::core::weapon_analysis::{assign_ids, simulate_damage, WeaponConfig, HISTOGRAM_BINS};

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

/// A damage effector with a gaussian that can dip below zero
fn arb_effector() -> impl Strategy<Value = Value> {
    (-5.0f64..20.0, 0.0f64..8.0, 0.0f64..=1.0, prop::option::of("[a-c]{1,2}")).prop_map(
        |(mean, std_dev, probability, name)| {
            let mut effector = json!({
                "effector_type": "damage",
                "damage_subtype": "physical",
                "base_damage": mean,
                "execution_probability": probability,
                "distribution_parameters": {"type": "gaussian", "params": {"mean": mean, "std_dev": std_dev}}
            });
            if let Some(name) = name {
                effector["effector_name"] = json!(name);
            }
            effector
        },
    )
}

fn arb_weapon() -> impl Strategy<Value = WeaponConfig> {
    (
        prop::collection::vec(arb_effector(), 0..4),
        prop::collection::vec((0.0f64..=1.0, prop::collection::vec(arb_effector(), 1..3)), 0..3),
    )
        .prop_map(|(effectors, styles)| {
            let styles: Vec<Value> = styles
                .into_iter()
                .map(|(probability, effectors)| {
                    json!({"execution_probability": probability, "effectors": effectors})
                })
                .collect();
            serde_json::from_value(json!({"effectors": effectors, "effect_styles": styles}))
                .expect("generated weapon must deserialize")
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_series_lengths_match(weapon in arb_weapon(), strikes in 1i64..200, seed in any::<u64>()) {
        let analysis = simulate_damage(&weapon, strikes, &mut StdRng::seed_from_u64(seed)).unwrap();
        let n = strikes as usize;

        prop_assert_eq!(analysis.strikes.len(), n);
        prop_assert_eq!(analysis.damage_per_strike.len(), n);
        prop_assert_eq!(analysis.cumulative_damage.len(), n);
        prop_assert_eq!(analysis.effector_breakdown.len(), weapon.effectors.len());
        prop_assert_eq!(analysis.style_breakdown.len(), weapon.effect_styles.len());
        for series in analysis.effector_breakdown.values().chain(analysis.style_breakdown.values()) {
            prop_assert_eq!(series.len(), n);
        }
        prop_assert_eq!(analysis.histogram.len(), HISTOGRAM_BINS);
    }

    #[test]
    fn prop_cumulative_is_monotone(weapon in arb_weapon(), strikes in 1i64..200, seed in any::<u64>()) {
        let analysis = simulate_damage(&weapon, strikes, &mut StdRng::seed_from_u64(seed)).unwrap();

        prop_assert!(analysis.damage_per_strike.iter().all(|d| *d >= 0.0));
        prop_assert!(analysis.damage_values.iter().all(|d| *d >= 0.0));
        prop_assert!(analysis.cumulative_damage.windows(2).all(|w| w[1] >= w[0]));

        let total: f64 = analysis.damage_per_strike.iter().sum();
        let last = *analysis.cumulative_damage.last().unwrap();
        prop_assert!((last - total).abs() < 1e-6 * total.max(1.0));
        prop_assert!((analysis.mean_damage_per_strike - total / strikes as f64).abs() < 1e-9 * total.max(1.0));
    }

    #[test]
    fn prop_histogram_counts_every_value(weapon in arb_weapon(), strikes in 1i64..200, seed in any::<u64>()) {
        let analysis = simulate_damage(&weapon, strikes, &mut StdRng::seed_from_u64(seed)).unwrap();

        let counted: usize = analysis.histogram.iter().map(|b| b.count).sum();
        prop_assert_eq!(counted, analysis.damage_values.len());
        if !analysis.damage_values.is_empty() {
            prop_assert!(analysis.min_damage <= analysis.max_damage);
        }
    }

    #[test]
    fn prop_assigned_ids_unique(names in prop::collection::vec(prop::option::of("[a-b]{0,2}"), 0..12)) {
        let ids = assign_ids(names.iter().map(|n| n.as_deref()), "effector");
        prop_assert_eq!(ids.len(), names.len());

        let unique: std::collections::HashSet<&String> = ids.iter().collect();
        prop_assert_eq!(unique.len(), ids.len());

        for (name, id) in names.iter().zip(&ids) {
            if let Some(name) = name.as_deref().filter(|n| !n.is_empty()) {
                prop_assert!(id.starts_with(name));
            }
        }
    }
}
