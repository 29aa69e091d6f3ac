//! GitHub contents API backend

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    config_name, config_path, default_message, from_yaml, kind_dir, to_yaml, ConfigStore,
    StorageError, StorageResult,
};
use crate::config::GitHubConfig;

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// A file entry as returned by `GET /repos/{repo}/contents/{path}`.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    commit: CommitRef,
}

pub struct GitHubStorage {
    client: Client,
    token: String,
    api_base: String,
    repo: String,
    branch: String,
    base_path: String,
}

impl GitHubStorage {
    pub fn new(token: impl Into<String>, config: &GitHubConfig) -> StorageResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("raveling-designer/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            token: token.into(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            base_path: config.base_path.clone(),
        })
    }

    /// `None` when no token is configured.
    pub fn from_config(config: &GitHubConfig) -> StorageResult<Option<Self>> {
        match config.token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => Self::new(token, config).map(Some),
            None => Ok(None),
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!("{}/repos/{}/contents/{}", self.api_base, self.repo, path)
    }

    /// Map 404 to `NotFound` and other failures to `Api`.
    async fn check(response: Response, path: &str) -> StorageResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(path.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        Err(StorageError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_contents(&self, path: &str) -> StorageResult<Value> {
        let response = self
            .client
            .get(self.contents_url(path))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await?;
        let response = Self::check(response, path).await?;
        Ok(response.json().await?)
    }

    async fn get_file(&self, path: &str) -> StorageResult<ContentEntry> {
        match self.get_contents(path).await? {
            value @ Value::Object(_) => Ok(serde_json::from_value(value)?),
            _ => Err(StorageError::Decode(format!("{path} is a directory"))),
        }
    }

    /// Blob sha of an existing file, `None` when absent.
    async fn existing_sha(&self, path: &str) -> StorageResult<Option<String>> {
        match self.get_file(path).await {
            Ok(entry) => Ok(Some(entry.sha)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn put(&self, path: &str, bytes: &[u8], message: &str, sha: Option<String>) -> StorageResult<String> {
        let mut body = json!({
            "message": message,
            "content": BASE64.encode(bytes),
            "branch": self.branch,
        });
        if let Some(sha) = sha {
            body["sha"] = Value::String(sha);
        }

        let response = self
            .client
            .put(self.contents_url(path))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;
        let written: WriteResponse = Self::check(response, path).await?.json().await?;
        Ok(written.commit.sha)
    }
}

fn decode_content(entry: &ContentEntry) -> StorageResult<String> {
    let encoded: String = entry
        .content
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| StorageError::Decode(format!("{}: {}", entry.name, e)))?;
    String::from_utf8(bytes).map_err(|e| StorageError::Decode(format!("{}: {}", entry.name, e)))
}

#[async_trait]
impl ConfigStore for GitHubStorage {
    fn backend(&self) -> &'static str {
        "github"
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
        let sha = self.existing_sha(&path).await?;
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| default_message(sha.is_some(), kind, name));

        let commit = self.put(&path, yaml.as_bytes(), &message, sha).await?;
        tracing::info!(path = %path, commit = %commit, "Saved config to GitHub");
        Ok(commit)
    }

    async fn save_file(&self, path: &str, bytes: &[u8], message: Option<&str>) -> StorageResult<String> {
        let sha = self.existing_sha(path).await?;
        let message = message.map(str::to_string).unwrap_or_else(|| {
            if sha.is_some() {
                format!("Update file: {path}")
            } else {
                format!("Create file: {path}")
            }
        });
        self.put(path, bytes, &message, sha).await
    }

    async fn load_config(&self, kind: &str, name: &str) -> StorageResult<Value> {
        let path = self.file_path(kind, name);
        let entry = self.get_file(&path).await?;
        from_yaml(&decode_content(&entry)?)
    }

    async fn delete_config(&self, kind: &str, name: &str) -> StorageResult<()> {
        let path = self.file_path(kind, name);
        let entry = self.get_file(&path).await?;

        let body = json!({
            "message": format!("Delete {kind}: {name}"),
            "sha": entry.sha,
            "branch": self.branch,
        });
        let response = self
            .client
            .delete(self.contents_url(&path))
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&body)
            .send()
            .await?;
        Self::check(response, &path).await?;
        tracing::info!(path = %path, "Deleted config from GitHub");
        Ok(())
    }

    async fn list_configs(&self, kind: &str) -> StorageResult<Vec<String>> {
        let dir = kind_dir(&self.base_path, kind);
        let listing = match self.get_contents(&dir).await {
            Ok(listing) => listing,
            Err(StorageError::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let entries: Vec<ContentEntry> = match listing {
            Value::Array(_) => serde_json::from_value(listing)?,
            single => vec![serde_json::from_value(single)?],
        };
        Ok(entries
            .into_iter()
            .filter(|e| e.kind == "file")
            .map(|e| config_name(&e.name))
            .collect())
    }
}
