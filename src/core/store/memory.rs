//! In-process store with the same path and message semantics as the GitHub
//! backend. Nothing survives a restart.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    config_name, config_path, default_message, from_yaml, kind_dir, to_yaml, ConfigStore,
    StorageError, StorageResult,
};

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub bytes: Vec<u8>,
    pub sha: String,
}

/// A recorded write, for inspection in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub sha: String,
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    base_path: String,
    files: RwLock<BTreeMap<String, StoredFile>>,
    commits: RwLock<Vec<Commit>>,
    counter: AtomicU64,
}

impl MemoryStore {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Default::default()
        }
    }

    fn next_sha(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{n:040x}")
    }

    async fn write(&self, path: &str, bytes: Vec<u8>, message: String) -> String {
        let blob_sha = self.next_sha();
        let commit_sha = self.next_sha();
        self.files.write().await.insert(
            path.to_string(),
            StoredFile {
                bytes,
                sha: blob_sha,
            },
        );
        self.commits.write().await.push(Commit {
            sha: commit_sha.clone(),
            path: path.to_string(),
            message,
        });
        commit_sha
    }

    pub async fn get_file(&self, path: &str) -> Option<StoredFile> {
        self.files.read().await.get(path).cloned()
    }

    pub async fn commits(&self) -> Vec<Commit> {
        self.commits.read().await.clone()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn file_path(&self, kind: &str, name: &str) -> String {
        config_path(&self.base_path, kind, name)
    }

    async fn save_config(
        &self,
        kind: &str,
        name: &str,
        content: &Value,
        message: Option<&str>,
    ) -> StorageResult<String> {
        let path = self.file_path(kind, name);
        let yaml = to_yaml(content)?;
        let existing = self.files.read().await.contains_key(&path);
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| default_message(existing, kind, name));
        Ok(self.write(&path, yaml.into_bytes(), message).await)
    }

    async fn save_file(&self, path: &str, bytes: &[u8], message: Option<&str>) -> StorageResult<String> {
        let existing = self.files.read().await.contains_key(path);
        let message = message.map(str::to_string).unwrap_or_else(|| {
            if existing {
                format!("Update file: {path}")
            } else {
                format!("Create file: {path}")
            }
        });
        Ok(self.write(path, bytes.to_vec(), message).await)
    }

    async fn load_config(&self, kind: &str, name: &str) -> StorageResult<Value> {
        let path = self.file_path(kind, name);
        let file = self
            .get_file(&path)
            .await
            .ok_or_else(|| StorageError::NotFound(path.clone()))?;
        let text = String::from_utf8(file.bytes)
            .map_err(|e| StorageError::Decode(format!("{path}: {e}")))?;
        from_yaml(&text)
    }

    async fn delete_config(&self, kind: &str, name: &str) -> StorageResult<()> {
        let path = self.file_path(kind, name);
        match self.files.write().await.remove(&path) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(path)),
        }
    }

    async fn list_configs(&self, kind: &str) -> StorageResult<Vec<String>> {
        let prefix = format!("{}/", kind_dir(&self.base_path, kind));
        let files = self.files.read().await;
        Ok(files
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(config_name)
            .collect())
    }
}
