//! Design store
//!
//! Design documents live as YAML files in a version-controlled repository,
//! one directory per content kind: `{base_path}/{kind}s/{name}.yaml`.
//! [`ConfigStore`] is the seam; [`GitHubStorage`] talks to the GitHub
//! contents API and [`MemoryStore`] backs tests and offline development.

mod error;
pub mod github;
pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use error::{StorageError, StorageResult};
pub use github::GitHubStorage;
pub use memory::MemoryStore;

/// Keep ASCII alphanumerics, `-` and `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Repository path of a design document.
pub fn config_path(base_path: &str, kind: &str, name: &str) -> String {
    format!("{}/{}.yaml", kind_dir(base_path, kind), sanitize_name(name))
}

pub(crate) fn kind_dir(base_path: &str, kind: &str) -> String {
    let base = base_path.trim_end_matches('/');
    if base.is_empty() {
        format!("{kind}s")
    } else {
        format!("{base}/{kind}s")
    }
}

/// File name to config name: drops a `.yaml` or `.yml` suffix.
pub(crate) fn config_name(file_name: &str) -> String {
    file_name
        .strip_suffix(".yaml")
        .or_else(|| file_name.strip_suffix(".yml"))
        .unwrap_or(file_name)
        .to_string()
}

/// Block-style YAML in the document's own key order.
pub(crate) fn to_yaml(content: &Value) -> StorageResult<String> {
    Ok(serde_yaml::to_string(content)?)
}

/// An empty document reads as `{}`.
pub(crate) fn from_yaml(text: &str) -> StorageResult<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    match serde_yaml::from_str::<Value>(text)? {
        Value::Null => Ok(Value::Object(Map::new())),
        other => Ok(other),
    }
}

pub(crate) fn default_message(existing: bool, kind: &str, name: &str) -> String {
    if existing {
        format!("Update {kind}: {name}")
    } else {
        format!("Create {kind}: {name}")
    }
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Repository path for `(kind, name)`.
    fn file_path(&self, kind: &str, name: &str) -> String;

    /// Create or update a design document. Returns the commit sha.
    async fn save_config(
        &self,
        kind: &str,
        name: &str,
        content: &Value,
        message: Option<&str>,
    ) -> StorageResult<String>;

    /// Create or update an arbitrary file at a repository path.
    async fn save_file(&self, path: &str, bytes: &[u8], message: Option<&str>) -> StorageResult<String>;

    async fn load_config(&self, kind: &str, name: &str) -> StorageResult<Value>;

    async fn delete_config(&self, kind: &str, name: &str) -> StorageResult<()>;

    /// Names of every document of `kind`. Empty when the directory is absent.
    async fn list_configs(&self, kind: &str) -> StorageResult<Vec<String>>;
}
