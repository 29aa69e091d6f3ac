//! Approved config operations
//!
//! Approved rows are only written by [`ApprovedConfigOps::approve_config`];
//! re-approving the same `(name, config_type)` overwrites the snapshot.

use serde_json::Value;

use super::models::{ApprovedConfigRecord, ConfigType, DesignConfigRecord};
use super::{now, Database};

pub trait ApprovedConfigOps {
    fn approve_config(&self, source: &DesignConfigRecord, content: &Value, approver_id: i64) -> impl std::future::Future<Output = Result<ApprovedConfigRecord, sqlx::Error>> + Send;
    fn list_approved_configs(&self, config_type: ConfigType, skip: i64, limit: i64) -> impl std::future::Future<Output = Result<Vec<ApprovedConfigRecord>, sqlx::Error>> + Send;
    fn get_approved_config(&self, config_type: ConfigType, name: &str) -> impl std::future::Future<Output = Result<Option<ApprovedConfigRecord>, sqlx::Error>> + Send;
}

impl ApprovedConfigOps for Database {
    /// Upsert the snapshot and flag the source config, in one transaction.
    async fn approve_config(&self, source: &DesignConfigRecord, content: &Value, approver_id: i64) -> Result<ApprovedConfigRecord, sqlx::Error> {
        let content_json = serde_json::to_string(content)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let timestamp = now();

        let mut tx = self.pool().begin().await?;

        let approved = sqlx::query_as::<_, ApprovedConfigRecord>(
            r#"
            INSERT INTO approved_configs (name, config_type, config_content, source_config_id,
                github_path, github_sha, description, tags, approved_by_id, approved_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)
            ON CONFLICT(name, config_type) DO UPDATE SET
                config_content = excluded.config_content,
                source_config_id = excluded.source_config_id,
                github_path = excluded.github_path,
                github_sha = excluded.github_sha,
                description = excluded.description,
                tags = excluded.tags,
                approved_by_id = excluded.approved_by_id,
                updated_at = excluded.approved_at
            RETURNING *
            "#,
        )
        .bind(&source.name)
        .bind(&source.config_type)
        .bind(&content_json)
        .bind(source.id)
        .bind(&source.github_path)
        .bind(&source.github_sha)
        .bind(&source.description)
        .bind(&source.tags)
        .bind(approver_id)
        .bind(&timestamp)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE configs SET is_approved = 1, approved_at = ?, approved_by_id = ? WHERE id = ?",
        )
        .bind(&timestamp)
        .bind(approver_id)
        .bind(source.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(approved)
    }

    async fn list_approved_configs(&self, config_type: ConfigType, skip: i64, limit: i64) -> Result<Vec<ApprovedConfigRecord>, sqlx::Error> {
        sqlx::query_as::<_, ApprovedConfigRecord>(
            "SELECT * FROM approved_configs WHERE config_type = ? ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(config_type.as_str())
        .bind(limit)
        .bind(skip)
        .fetch_all(self.pool())
        .await
    }

    async fn get_approved_config(&self, config_type: ConfigType, name: &str) -> Result<Option<ApprovedConfigRecord>, sqlx::Error> {
        sqlx::query_as::<_, ApprovedConfigRecord>(
            "SELECT * FROM approved_configs WHERE config_type = ? AND name = ?",
        )
        .bind(config_type.as_str())
        .bind(name)
        .fetch_optional(self.pool())
        .await
    }
}
