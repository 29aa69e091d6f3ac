//! Weapon damage simulator
//!
//! Monte Carlo over a weapon's effectors and effect styles. Each strike
//! rolls every effector's execution probability, samples the damage
//! distribution of those that fire, and records the result per effector,
//! per style and in total.

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::distributions::Distribution;
use super::effectors::{lenient_f64, EffectorConfig};

/// Upper bound on strikes per simulation request.
pub const MAX_STRIKES: usize = 10_000;

/// Number of equal-width histogram bins.
pub const HISTOGRAM_BINS: usize = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("num_strikes must be between 1 and {max}, got {got}")]
    InvalidStrikeCount { max: usize, got: i64 },
}

fn default_probability() -> f64 {
    1.0
}

/// A style attached to a weapon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeaponStyle {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_probability", deserialize_with = "lenient_f64")]
    pub execution_probability: f64,
    #[serde(default)]
    pub effector: Option<EffectorConfig>,
    #[serde(default)]
    pub effectors: Option<Vec<EffectorConfig>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WeaponStyle {
    /// `effectors` wins when both forms are present.
    pub fn effector_list(&self) -> Vec<&EffectorConfig> {
        match (&self.effectors, &self.effector) {
            (Some(list), _) => list.iter().collect(),
            (None, Some(one)) => vec![one],
            (None, None) => Vec::new(),
        }
    }
}

/// Loose weapon design document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeaponConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub effectors: Vec<EffectorConfig>,
    #[serde(default)]
    pub effect_styles: Vec<WeaponStyle>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Simulation output, serialized as-is by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageAnalysis {
    pub strikes: Vec<usize>,
    pub cumulative_damage: Vec<f64>,
    pub damage_values: Vec<f64>,
    pub damage_per_strike: Vec<f64>,
    pub effector_breakdown: IndexMap<String, Vec<f64>>,
    pub effector_cumulative: IndexMap<String, Vec<f64>>,
    pub style_breakdown: IndexMap<String, Vec<f64>>,
    pub style_cumulative: IndexMap<String, Vec<f64>>,
    pub min_damage: f64,
    pub max_damage: f64,
    pub mean_damage_per_strike: f64,
    pub histogram: Vec<HistogramBin>,
}

/// An effector ready to roll: probability plus its damage distribution, if
/// it deals any.
struct Prepared {
    probability: f64,
    damage: Option<Distribution>,
}

fn prepare(effector: &EffectorConfig, id: &str) -> Prepared {
    let damage = if effector.is_damage() {
        match effector.distribution() {
            Some(Ok(dist)) => Some(dist),
            Some(Err(e)) => {
                tracing::warn!(effector = %id, error = %e, "Failed to parse damage distribution; effector contributes 0");
                None
            }
            None => None,
        }
    } else {
        None
    };
    Prepared {
        probability: effector.execution_probability,
        damage,
    }
}

/// Roll one effector. Returns `Some(damage)` when it fired and sampled a
/// distribution, `None` otherwise.
fn strike<R: Rng + ?Sized>(effector: &Prepared, rng: &mut R) -> Option<f64> {
    if rng.gen::<f64>() >= effector.probability {
        return None;
    }
    effector
        .damage
        .as_ref()
        .map(|dist| dist.sample(rng).max(0.0))
}

/// Stable ids in configuration order. Missing names fall back to
/// `{prefix}_{idx}`; repeats get an `_{idx}` suffix.
pub fn assign_ids<'a>(names: impl IntoIterator<Item = Option<&'a str>>, prefix: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let base = match name.filter(|n| !n.is_empty()) {
                Some(n) => n.to_string(),
                None => format!("{prefix}_{idx}"),
            };
            let mut id = base.clone();
            while seen.contains(&id) {
                id = format!("{id}_{idx}");
            }
            seen.insert(id.clone());
            id
        })
        .collect()
}

fn prefix_sum(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

/// Equal-width bins over `[0, max]`, or `[0, 1]` when there is no positive
/// maximum.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    let upper = if max > 0.0 { max } else { 1.0 };
    let width = upper / bins as f64;

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = ((v / width).floor() as usize).min(bins.saturating_sub(1));
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: i as f64 * width,
            end: (i + 1) as f64 * width,
            count,
        })
        .collect()
}

pub fn validate_strike_count(num_strikes: i64) -> Result<usize, SimulationError> {
    if num_strikes < 1 || num_strikes > MAX_STRIKES as i64 {
        return Err(SimulationError::InvalidStrikeCount {
            max: MAX_STRIKES,
            got: num_strikes,
        });
    }
    Ok(num_strikes as usize)
}

/// Simulate `num_strikes` strikes of `config`.
pub fn simulate_damage<R: Rng + ?Sized>(
    config: &WeaponConfig,
    num_strikes: i64,
    rng: &mut R,
) -> Result<DamageAnalysis, SimulationError> {
    let n = validate_strike_count(num_strikes)?;

    let effector_ids = assign_ids(
        config.effectors.iter().map(|e| e.effector_name.as_deref()),
        "effector",
    );
    let style_ids = assign_ids(
        config.effect_styles.iter().map(|s| s.name.as_deref()),
        "style",
    );

    let effectors: Vec<Prepared> = config
        .effectors
        .iter()
        .zip(&effector_ids)
        .map(|(e, id)| prepare(e, id))
        .collect();
    let styles: Vec<(f64, Vec<Prepared>)> = config
        .effect_styles
        .iter()
        .zip(&style_ids)
        .map(|(style, id)| {
            let inner = style
                .effector_list()
                .into_iter()
                .map(|e| prepare(e, id))
                .collect();
            (style.execution_probability, inner)
        })
        .collect();

    let mut effector_series = vec![Vec::with_capacity(n); effectors.len()];
    let mut style_series = vec![Vec::with_capacity(n); styles.len()];
    let mut damage_per_strike = Vec::with_capacity(n);
    let mut damage_values = Vec::new();

    for _ in 0..n {
        let mut total = 0.0;

        for (effector, series) in effectors.iter().zip(effector_series.iter_mut()) {
            let damage = strike(effector, rng);
            if let Some(d) = damage {
                damage_values.push(d);
            }
            let d = damage.unwrap_or(0.0);
            series.push(d);
            total += d;
        }

        for ((probability, inner), series) in styles.iter().zip(style_series.iter_mut()) {
            let mut style_damage = 0.0;
            if rng.gen::<f64>() < *probability {
                for effector in inner {
                    if let Some(d) = strike(effector, rng) {
                        damage_values.push(d);
                        style_damage += d;
                    }
                }
            }
            series.push(style_damage);
            total += style_damage;
        }

        damage_per_strike.push(total);
    }

    let cumulative_damage = prefix_sum(&damage_per_strike);
    let effector_cumulative = effector_ids
        .iter()
        .cloned()
        .zip(effector_series.iter().map(|s| prefix_sum(s)))
        .collect();
    let style_cumulative = style_ids
        .iter()
        .cloned()
        .zip(style_series.iter().map(|s| prefix_sum(s)))
        .collect();

    let (min_damage, max_damage) = if damage_values.is_empty() {
        (0.0, 0.0)
    } else {
        damage_values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    };
    let mean_damage_per_strike = damage_per_strike.iter().sum::<f64>() / n as f64;
    let histogram = histogram(&damage_values, HISTOGRAM_BINS);

    Ok(DamageAnalysis {
        strikes: (1..=n).collect(),
        cumulative_damage,
        damage_values,
        damage_per_strike,
        effector_breakdown: effector_ids.into_iter().zip(effector_series).collect(),
        effector_cumulative,
        style_breakdown: style_ids.into_iter().zip(style_series).collect(),
        style_cumulative,
        min_damage,
        max_damage,
        mean_damage_per_strike,
        histogram,
    })
}

fn expected_effector_damage(effector: &EffectorConfig) -> f64 {
    if !effector.is_damage() {
        return 0.0;
    }
    match effector.distribution() {
        Some(Ok(dist)) => effector.execution_probability * dist.expected_value().max(0.0),
        _ => 0.0,
    }
}

/// Analytic expectation of damage per strike.
pub fn expected_damage_per_strike(config: &WeaponConfig) -> f64 {
    let direct: f64 = config.effectors.iter().map(expected_effector_damage).sum();
    let styled: f64 = config
        .effect_styles
        .iter()
        .map(|style| {
            let inner: f64 = style
                .effector_list()
                .into_iter()
                .map(expected_effector_damage)
                .sum();
            style.execution_probability * inner
        })
        .sum();
    direct + styled
}
