//! Effect styles
//!
//! A style bundles one or more effectors under a named behavior (a sword
//! "Slash", a "Fireball") with its own execution probability and free-form
//! attributes such as range, area or cost.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::effectors::{lenient_f64, EffectorConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleType {
    Physical,
    Spell,
    Buff,
    Debuff,
    Regen,
    Process,
}

impl StyleType {
    pub fn all() -> &'static [StyleType] {
        &[
            StyleType::Physical,
            StyleType::Spell,
            StyleType::Buff,
            StyleType::Debuff,
            StyleType::Regen,
            StyleType::Process,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleType::Physical => "Physical",
            StyleType::Spell => "Spell",
            StyleType::Buff => "Buff",
            StyleType::Debuff => "Debuff",
            StyleType::Regen => "Regen",
            StyleType::Process => "Process",
        }
    }
}

impl fmt::Display for StyleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StyleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StyleType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = StyleType::all().iter().map(StyleType::as_str).collect();
                format!("Invalid style_type: {s}. Must be one of {names:?}")
            })
    }
}

/// Stored effector payload: a single effector (older documents) or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectorSet {
    Many(Vec<EffectorConfig>),
    Single(Box<EffectorConfig>),
}

impl EffectorSet {
    pub fn iter(&self) -> impl Iterator<Item = &EffectorConfig> {
        let slice: &[EffectorConfig] = match self {
            EffectorSet::Many(list) => list,
            EffectorSet::Single(one) => std::slice::from_ref(one.as_ref()),
        };
        slice.iter()
    }
}

fn default_probability() -> f64 {
    1.0
}

/// Create/update payload for the style library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectStyleConfig {
    pub name: String,
    pub style_type: String,
    pub subtype: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub process_verb: Option<String>,
    #[serde(default = "default_probability", deserialize_with = "lenient_f64")]
    pub execution_probability: f64,
    /// Single effector, kept for older clients.
    #[serde(default)]
    pub effector: Option<EffectorConfig>,
    #[serde(default)]
    pub effectors: Option<Vec<EffectorConfig>>,
    #[serde(default)]
    pub style_attributes: Option<Value>,
}

/// A style payload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedStyle {
    pub name: String,
    pub style_type: StyleType,
    pub subtype: String,
    pub description: String,
    pub process_verb: String,
    pub execution_probability: f64,
    pub effector_config: EffectorSet,
    pub style_attributes: Option<Value>,
}

impl EffectStyleConfig {
    /// `effectors` wins over `effector` when both are sent.
    pub fn effector_set(&self) -> Option<EffectorSet> {
        if let Some(list) = &self.effectors {
            Some(EffectorSet::Many(list.clone()))
        } else {
            self.effector
                .as_ref()
                .map(|one| EffectorSet::Single(Box::new(one.clone())))
        }
    }

    /// Validate for storage. `existing` is the stored effector payload on
    /// update; it is kept when the request carries none.
    pub fn validate(&self, existing: Option<&EffectorSet>) -> Result<ValidatedStyle, String> {
        let style_type: StyleType = self.style_type.parse()?;

        if !(0.0..=1.0).contains(&self.execution_probability) {
            return Err("execution_probability must be between 0.0 and 1.0".to_string());
        }

        let effector_config = match (self.effector_set(), existing) {
            (Some(set), _) => set,
            (None, Some(stored)) => stored.clone(),
            (None, None) => {
                return Err("Either 'effector' or 'effectors' must be provided".to_string())
            }
        };

        if style_type == StyleType::Physical {
            let offending = effector_config
                .iter()
                .filter(|e| e.is_damage())
                .find(|e| e.damage_subtype.as_deref() != Some("physical"));
            if let Some(effector) = offending {
                return Err(format!(
                    "Physical styles only accept physical damage effectors, got '{}'",
                    effector.damage_subtype.as_deref().unwrap_or("none")
                ));
            }
        }

        let process_verb = self
            .process_verb
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.subtype.clone());

        Ok(ValidatedStyle {
            name: self.name.clone(),
            style_type,
            subtype: self.subtype.clone(),
            description: self.description.clone().unwrap_or_default(),
            process_verb,
            execution_probability: self.execution_probability,
            effector_config,
            style_attributes: self.style_attributes.clone(),
        })
    }
}

/// One style type's branch in the library tree.
#[derive(Debug, Clone, Serialize)]
pub struct StyleBranch<T> {
    pub pre_designed: Vec<T>,
    /// Inline styles that were never saved to the library. Always empty
    /// server-side.
    pub custom: Vec<T>,
}

impl<T> Default for StyleBranch<T> {
    fn default() -> Self {
        Self {
            pre_designed: Vec::new(),
            custom: Vec::new(),
        }
    }
}

/// Group saved styles by type. Every style type is present as a key, in
/// declaration order. Entries with an unrecognized type are dropped.
pub fn style_tree<T>(styles: impl IntoIterator<Item = (String, T)>) -> IndexMap<&'static str, StyleBranch<T>> {
    let mut tree: IndexMap<&'static str, StyleBranch<T>> = StyleType::all()
        .iter()
        .map(|t| (t.as_str(), StyleBranch::default()))
        .collect();

    for (style_type, style) in styles {
        if let Some(branch) = tree.get_mut(style_type.as_str()) {
            branch.pre_designed.push(style);
        }
    }
    tree
}
