//! Core Entity Records
//!
//! Database records for user accounts, design config metadata, approved
//! production configs, the effect style library and collaboration notes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Designer,
    Player,
    Viewer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Designer => "designer",
            UserRole::Player => "player",
            UserRole::Viewer => "viewer",
        }
    }

    /// Roles a visitor may pick when registering themselves
    pub fn is_self_service(&self) -> bool {
        matches!(self, UserRole::Player | UserRole::Viewer)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "designer" => Ok(UserRole::Designer),
            "player" => Ok(UserRole::Player),
            "viewer" => Ok(UserRole::Viewer),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

/// User database record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub role: String,
    pub is_active: bool,
    pub user_color: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl UserRecord {
    /// Unknown stored roles are treated as the least privileged.
    pub fn role(&self) -> UserRole {
        self.role.parse().unwrap_or(UserRole::Viewer)
    }
}

/// Insert payload for a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub role: UserRole,
    pub is_active: bool,
}

/// Partial update applied by admins
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub email: Option<String>,
}

// ============================================================================
// Design Configs
// ============================================================================

/// Content kinds tracked in the `configs` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    Item,
    Skill,
    Character,
}

impl ConfigType {
    pub fn all() -> &'static [ConfigType] {
        &[ConfigType::Item, ConfigType::Skill, ConfigType::Character]
    }

    /// Store kind, also the column value
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigType::Item => "item",
            ConfigType::Skill => "skill",
            ConfigType::Character => "character",
        }
    }

    /// Route segment: `items`, `skills`, `characters`
    pub fn plural(&self) -> &'static str {
        match self {
            ConfigType::Item => "items",
            ConfigType::Skill => "skills",
            ConfigType::Character => "characters",
        }
    }

    pub fn from_plural(segment: &str) -> Option<Self> {
        ConfigType::all().iter().copied().find(|t| t.plural() == segment)
    }

    /// "Item", "Skill", "Character" for messages
    pub fn title(&self) -> &'static str {
        match self {
            ConfigType::Item => "Item",
            ConfigType::Skill => "Skill",
            ConfigType::Character => "Character",
        }
    }
}

impl fmt::Display for ConfigType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Design config metadata record. The content lives in the design store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DesignConfigRecord {
    pub id: i64,
    pub name: String,
    pub config_type: String,
    pub owner_id: i64,
    pub github_path: Option<String>,
    pub github_sha: Option<String>,
    pub description: Option<String>,
    /// Comma-separated
    pub tags: Option<String>,
    pub is_approved: bool,
    pub approved_at: Option<String>,
    pub approved_by_id: Option<i64>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDesignConfig {
    pub name: String,
    pub config_type: ConfigType,
    pub owner_id: i64,
    pub github_path: String,
    pub github_sha: String,
    pub description: Option<String>,
    pub tags: Option<String>,
}

// ============================================================================
// Approved Configs
// ============================================================================

/// Production snapshot of an approved design config
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApprovedConfigRecord {
    pub id: i64,
    pub name: String,
    pub config_type: String,
    /// JSON text
    pub config_content: String,
    pub source_config_id: Option<i64>,
    pub github_path: Option<String>,
    pub github_sha: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub approved_by_id: Option<i64>,
    pub approved_at: String,
    pub updated_at: Option<String>,
}

impl ApprovedConfigRecord {
    pub fn content(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.config_content)
    }
}

// ============================================================================
// Effect Styles
// ============================================================================

/// Effect style library record. JSON columns are stored as text.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EffectStyleRecord {
    pub id: i64,
    pub name: String,
    pub style_type: String,
    pub subtype: String,
    pub description: Option<String>,
    pub process_verb: Option<String>,
    pub execution_probability: f64,
    pub effector_config: String,
    pub style_attributes: Option<String>,
    pub created_by_id: Option<i64>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl EffectStyleRecord {
    pub fn effector_config_json(&self) -> Value {
        serde_json::from_str(&self.effector_config).unwrap_or(Value::Null)
    }

    pub fn style_attributes_json(&self) -> Option<Value> {
        self.style_attributes
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
    }
}

/// Insert/update payload for a library style
#[derive(Debug, Clone)]
pub struct EffectStyleInput {
    pub name: String,
    pub style_type: String,
    pub subtype: String,
    pub description: String,
    pub process_verb: String,
    pub execution_probability: f64,
    pub effector_config: Value,
    /// `None` leaves the stored attributes untouched on update
    pub style_attributes: Option<Value>,
}

// ============================================================================
// Collaboration Notes
// ============================================================================

/// Designer types that own a shared note
pub const DESIGNER_TYPES: &[&str] = &[
    "weapons",
    "skills",
    "spells",
    "wearables",
    "consumables",
    "characters",
    "zones",
    "general",
    "quick_notes",
];

/// Note joined with the usernames of its creator and last editor
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NoteRecord {
    pub id: i64,
    pub designer_type: String,
    pub content: String,
    pub created_by_id: Option<i64>,
    pub updated_by_id: Option<i64>,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub created_by_username: Option<String>,
    pub updated_by_username: Option<String>,
}
