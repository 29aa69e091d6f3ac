//! Effector configuration
//!
//! An effector is the atomic unit of an effect: a damage packet, a
//! restoration tick, a buff or debuff, or a custom process. The browser
//! forms send the loose [`EffectorConfig`]; [`EffectorConfig::validate`]
//! reports everything wrong with it in one pass.

use std::fmt;
use std::str::FromStr;

use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use super::distributions::{Distribution, DistributionParameters};

/// Elements accepted for elemental damage.
pub const ELEMENTS: &[&str] = &[
    "fire", "water", "earth", "air", "ice", "lightning", "poison", "holy", "shadow", "arcane",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectorType {
    Damage,
    Regenerative,
    Buff,
    Debuff,
    Process,
}

impl EffectorType {
    pub fn all() -> &'static [EffectorType] {
        &[
            EffectorType::Damage,
            EffectorType::Regenerative,
            EffectorType::Buff,
            EffectorType::Debuff,
            EffectorType::Process,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectorType::Damage => "damage",
            EffectorType::Regenerative => "regenerative",
            EffectorType::Buff => "buff",
            EffectorType::Debuff => "debuff",
            EffectorType::Process => "process",
        }
    }
}

impl fmt::Display for EffectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EffectorType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Invalid effector_type: {s}"))
    }
}

fn default_probability() -> f64 {
    1.0
}

/// Loose effector document as authored in the designer.
///
/// `effector_type` stays a string so that an unknown type is reported by
/// validation instead of failing deserialization. Unknown keys survive in
/// `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectorConfig {
    #[serde(default)]
    pub effector_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effector_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_attributes: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub base_damage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub base_restoration: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub base_buff: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub base_debuff: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64", skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stackable: Option<bool>,
    /// An empty object means no distribution.
    #[serde(default, deserialize_with = "non_empty_distribution", skip_serializing_if = "Option::is_none")]
    pub distribution_parameters: Option<DistributionParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_effectors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_effectors: Option<Vec<String>>,
    #[serde(default = "default_probability", deserialize_with = "lenient_f64")]
    pub execution_probability: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Form fields arrive as numbers or numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn into_f64<E: de::Error>(self) -> Result<f64, E> {
        match self {
            NumberOrText::Number(n) => Ok(n),
            NumberOrText::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| E::custom(format!("expected a number, got \"{s}\""))),
        }
    }
}

pub(crate) fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    NumberOrText::deserialize(deserializer)?.into_f64()
}

pub(crate) fn lenient_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Option::<NumberOrText>::deserialize(deserializer)?
        .map(NumberOrText::into_f64)
        .transpose()
}

fn non_empty_distribution<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DistributionParameters>, D::Error> {
    match Option::<Map<String, Value>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(map) if map.is_empty() => Ok(None),
        Some(map) => serde_json::from_value(Value::Object(map))
            .map(Some)
            .map_err(de::Error::custom),
    }
}

impl EffectorConfig {
    pub fn kind(&self) -> Option<EffectorType> {
        self.effector_type.parse().ok()
    }

    pub fn is_damage(&self) -> bool {
        self.kind() == Some(EffectorType::Damage)
    }

    /// Parsed distribution, if one is configured.
    pub fn distribution(&self) -> Option<Result<Distribution, super::distributions::DistributionError>> {
        self.distribution_parameters
            .as_ref()
            .map(Distribution::from_parameters)
    }

    /// Every problem with this effector, empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        match self.kind() {
            None => errors.push(format!("Invalid effector_type: {}", self.effector_type)),
            Some(EffectorType::Damage) => {
                let subtype = self.damage_subtype.as_deref().filter(|s| !s.is_empty());
                if subtype.is_none() {
                    errors.push("damage_subtype is required for damage effectors".to_string());
                }
                if subtype == Some("elemental") {
                    match self.element_type.as_deref().filter(|s| !s.is_empty()) {
                        None => errors.push("element_type is required for elemental damage".to_string()),
                        Some(element) if !ELEMENTS.contains(&element) => {
                            errors.push(format!("Invalid element_type: {element}"))
                        }
                        Some(_) => {}
                    }
                }
                if self.base_damage.is_none() {
                    errors.push("base_damage is required for damage effectors".to_string());
                }
            }
            Some(EffectorType::Regenerative) => {
                if self.attribute_type.as_deref().map_or(true, str::is_empty) {
                    errors.push("attribute_type is required for regenerative effectors".to_string());
                }
                if self.base_restoration.is_none() {
                    errors.push("base_restoration is required for regenerative effectors".to_string());
                }
            }
            Some(kind @ (EffectorType::Buff | EffectorType::Debuff)) => {
                if self.affected_attributes.as_ref().map_or(true, Vec::is_empty) {
                    errors.push("affected_attributes is required for buff/debuff effectors".to_string());
                }
                if kind == EffectorType::Buff && self.base_buff.is_none() {
                    errors.push("base_buff is required for buff effectors".to_string());
                }
                if kind == EffectorType::Debuff && self.base_debuff.is_none() {
                    errors.push("base_debuff is required for debuff effectors".to_string());
                }
            }
            Some(EffectorType::Process) => {
                if self.process_config.is_none() {
                    errors.push("process_config is required for process effectors".to_string());
                }
            }
        }

        if let Some(Err(e)) = self.distribution() {
            errors.push(format!("Invalid distribution_parameters: {e}"));
        }

        if !(0.0..=1.0).contains(&self.execution_probability) {
            errors.push("execution_probability must be between 0.0 and 1.0".to_string());
        }

        errors
    }
}

/// A built-in starter effector offered by the designer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectorTemplate {
    pub effector_type: EffectorType,
    pub effector_name: String,
    pub config: Value,
}

fn gaussian(mean: f64, std_dev: f64) -> Value {
    json!({"type": "gaussian", "params": {"mean": mean, "std_dev": std_dev}})
}

/// Starter templates, optionally limited to one type.
pub fn templates(filter: Option<EffectorType>) -> Vec<EffectorTemplate> {
    let all = [
        (
            EffectorType::Damage,
            "physical_damage",
            json!({
                "damage_subtype": "physical",
                "base_damage": 10.0,
                "distribution_parameters": gaussian(10.0, 2.0),
            }),
        ),
        (
            EffectorType::Damage,
            "elemental_damage",
            json!({
                "damage_subtype": "elemental",
                "element_type": "fire",
                "base_damage": 10.0,
                "distribution_parameters": gaussian(10.0, 2.0),
            }),
        ),
        (
            EffectorType::Regenerative,
            "health_restoration",
            json!({
                "attribute_type": "health",
                "base_restoration": 10.0,
                "distribution_parameters": gaussian(10.0, 2.0),
            }),
        ),
        (
            EffectorType::Buff,
            "strength_buff",
            json!({
                "affected_attributes": ["str"],
                "base_buff": 5.0,
                "duration": 60.0,
                "stackable": false,
                "distribution_parameters": gaussian(5.0, 1.0),
            }),
        ),
        (
            EffectorType::Debuff,
            "weakness_debuff",
            json!({
                "affected_attributes": ["str"],
                "base_debuff": 5.0,
                "duration": 60.0,
                "stackable": false,
                "distribution_parameters": gaussian(5.0, 1.0),
            }),
        ),
        (
            EffectorType::Process,
            "custom_process",
            json!({
                "process_config": {},
                "input_effectors": [],
                "output_effectors": [],
            }),
        ),
    ];

    all.into_iter()
        .filter(|(kind, _, _)| filter.map_or(true, |f| f == *kind))
        .map(|(effector_type, name, config)| EffectorTemplate {
            effector_type,
            effector_name: name.to_string(),
            config,
        })
        .collect()
}
