//! Probability distributions for effect magnitudes
//!
//! Designers describe magnitudes as a named family plus loose parameters
//! (`DistributionParameters`). [`Distribution::from_parameters`] validates
//! that wire form into a typed family that can be sampled.

pub mod dice;

use rand::Rng;
use rand_distr::{Distribution as _, Normal};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use dice::{DiceError, DiceNotation, DiceRoller, RollResult};

/// Accepted distribution family names.
pub const DISTRIBUTION_TYPES: &[&str] = &["uniform", "gaussian", "skewnorm", "bimodal", "die_roll"];

pub fn is_valid_type(name: &str) -> bool {
    DISTRIBUTION_TYPES.contains(&name)
}

#[derive(Debug, Error, PartialEq)]
pub enum DistributionError {
    #[error("Unknown distribution type: {0}")]
    UnknownType(String),

    #[error("Parameter '{name}' must be numeric, got {value}")]
    NonNumeric { name: String, value: String },

    #[error("Parameter '{0}' must be non-negative")]
    NegativeStdDev(&'static str),

    #[error("Uniform min ({min}) must not exceed max ({max})")]
    InvertedRange { min: f64, max: f64 },

    #[error("Uniform range from {min} to {max} is too wide to sample")]
    RangeOverflow { min: f64, max: f64 },

    #[error("Bimodal weight must be between 0 and 1, got {0}")]
    WeightOutOfRange(f64),

    #[error(transparent)]
    Dice(#[from] DiceError),
}

pub type DistributionResult<T> = Result<T, DistributionError>;

/// Wire form: `{"type": "gaussian", "params": {"mean": 10, "std_dev": 2}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionParameters {
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

fn default_type() -> String {
    "uniform".to_string()
}

impl DistributionParameters {
    pub fn new(kind: impl Into<String>, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            kind: kind.into(),
            params,
        }
    }
}

/// A validated distribution family.
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    Uniform { min: f64, max: f64 },
    Gaussian { mean: f64, std_dev: f64 },
    SkewNormal { mean: f64, std_dev: f64, skew: f64 },
    Bimodal { mean1: f64, std1: f64, mean2: f64, std2: f64, weight: f64 },
    DieRoll(DiceNotation),
}

impl Distribution {
    /// Validate loose parameters into a typed family, filling defaults for
    /// anything missing.
    pub fn from_parameters(parameters: &DistributionParameters) -> DistributionResult<Self> {
        let params = &parameters.params;
        match parameters.kind.as_str() {
            "uniform" => {
                let min = number_or(params, &["min_val", "min"], 0.0)?;
                let max = number_or(params, &["max_val", "max"], 1.0)?;
                if min > max {
                    return Err(DistributionError::InvertedRange { min, max });
                }
                if !(max - min).is_finite() {
                    return Err(DistributionError::RangeOverflow { min, max });
                }
                Ok(Distribution::Uniform { min, max })
            }
            "gaussian" => {
                let mean = number_or(params, &["mean"], 0.0)?;
                let std_dev = non_negative(params, "std_dev")?;
                Ok(Distribution::Gaussian { mean, std_dev })
            }
            "skewnorm" => {
                let mean = number_or(params, &["mean"], 0.0)?;
                let std_dev = non_negative(params, "std_dev")?;
                let skew = number_or(params, &["skew"], 0.0)?;
                Ok(Distribution::SkewNormal { mean, std_dev, skew })
            }
            "bimodal" => {
                let mean1 = number_or(params, &["mean1"], 0.0)?;
                let std1 = non_negative(params, "std1")?;
                let mean2 = number_or(params, &["mean2"], 0.0)?;
                let std2 = non_negative(params, "std2")?;
                let weight = number_or(params, &["weight"], 0.5)?;
                if !(0.0..=1.0).contains(&weight) {
                    return Err(DistributionError::WeightOutOfRange(weight));
                }
                Ok(Distribution::Bimodal {
                    mean1,
                    std1,
                    mean2,
                    std2,
                    weight,
                })
            }
            "die_roll" => {
                let notation = match params.get("notation") {
                    None | Some(Value::Null) => "1d6".to_string(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                };
                Ok(Distribution::DieRoll(DiceNotation::parse(&notation)?))
            }
            other => Err(DistributionError::UnknownType(other.to_string())),
        }
    }

    /// Draw one magnitude.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Distribution::Uniform { min, max } => {
                if min == max {
                    *min
                } else if (max - min).is_finite() {
                    rng.gen_range(*min..=*max)
                } else {
                    let t: f64 = rng.gen();
                    min * (1.0 - t) + max * t
                }
            }
            Distribution::Gaussian { mean, std_dev } => normal(*mean, *std_dev, rng),
            Distribution::SkewNormal { mean, std_dev, skew } => {
                let x = normal(*mean, *std_dev, rng);
                if *skew == 0.0 {
                    x
                } else {
                    let factor = 1.0 + skew * (x - mean).abs() / (std_dev + 1.0);
                    mean + (x - mean) * factor
                }
            }
            Distribution::Bimodal {
                mean1,
                std1,
                mean2,
                std2,
                weight,
            } => {
                if rng.gen::<f64>() < *weight {
                    normal(*mean1, *std1, rng)
                } else {
                    normal(*mean2, *std2, rng)
                }
            }
            Distribution::DieRoll(notation) => {
                DiceRoller::new().roll_with_rng(notation, rng).total as f64
            }
        }
    }

    /// Closed-form mean. Skew-normal reports its location parameter.
    pub fn expected_value(&self) -> f64 {
        match self {
            Distribution::Uniform { min, max } => (min + max) / 2.0,
            Distribution::Gaussian { mean, .. } => *mean,
            Distribution::SkewNormal { mean, .. } => *mean,
            Distribution::Bimodal {
                mean1,
                mean2,
                weight,
                ..
            } => weight * mean1 + (1.0 - weight) * mean2,
            Distribution::DieRoll(notation) => notation.average(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Distribution::Uniform { .. } => "uniform",
            Distribution::Gaussian { .. } => "gaussian",
            Distribution::SkewNormal { .. } => "skewnorm",
            Distribution::Bimodal { .. } => "bimodal",
            Distribution::DieRoll(_) => "die_roll",
        }
    }
}

impl TryFrom<&DistributionParameters> for Distribution {
    type Error = DistributionError;

    fn try_from(value: &DistributionParameters) -> Result<Self, Self::Error> {
        Distribution::from_parameters(value)
    }
}

fn normal<R: Rng + ?Sized>(mean: f64, std_dev: f64, rng: &mut R) -> f64 {
    if std_dev == 0.0 {
        return mean;
    }
    match Normal::new(mean, std_dev) {
        Ok(dist) => dist.sample(rng),
        // Only reachable for non-finite std_dev, which validation rejects.
        Err(_) => mean,
    }
}

fn non_negative(params: &Map<String, Value>, key: &'static str) -> DistributionResult<f64> {
    let value = number_or(params, &[key], 1.0)?;
    if value < 0.0 {
        return Err(DistributionError::NegativeStdDev(key));
    }
    Ok(value)
}

/// First present key wins. Numbers and numeric strings are accepted.
fn number_or(params: &Map<String, Value>, keys: &[&str], default: f64) -> DistributionResult<f64> {
    let Some((key, value)) = keys
        .iter()
        .find_map(|k| params.get(*k).filter(|v| !v.is_null()).map(|v| (*k, v)))
    else {
        return Ok(default);
    };

    let non_numeric = || DistributionError::NonNumeric {
        name: key.to_string(),
        value: value.to_string(),
    };

    let number = match value {
        Value::Number(n) => n.as_f64().ok_or_else(non_numeric)?,
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| non_numeric())?,
        _ => return Err(non_numeric()),
    };
    if !number.is_finite() {
        return Err(non_numeric());
    }
    Ok(number)
}
