//! Design config metadata operations
//!
//! Lookups used by the content APIs are scoped to an owner. Approval looks
//! configs up by id and type only.

use super::models::{ConfigType, DesignConfigRecord, NewDesignConfig};
use super::{now, Database};

/// Extension trait for design config metadata
pub trait DesignConfigOps {
    fn create_design_config(&self, config: &NewDesignConfig) -> impl std::future::Future<Output = Result<DesignConfigRecord, sqlx::Error>> + Send;
    fn get_owned_config(&self, id: i64, config_type: ConfigType, owner_id: i64) -> impl std::future::Future<Output = Result<Option<DesignConfigRecord>, sqlx::Error>> + Send;
    fn get_config_by_type(&self, id: i64, config_type: ConfigType) -> impl std::future::Future<Output = Result<Option<DesignConfigRecord>, sqlx::Error>> + Send;
    fn find_owned_config_by_name(&self, name: &str, config_type: ConfigType, owner_id: i64) -> impl std::future::Future<Output = Result<Option<DesignConfigRecord>, sqlx::Error>> + Send;
    fn list_owned_configs(&self, config_type: ConfigType, owner_id: i64, skip: i64, limit: i64) -> impl std::future::Future<Output = Result<Vec<DesignConfigRecord>, sqlx::Error>> + Send;
    fn update_design_config(&self, config: &DesignConfigRecord) -> impl std::future::Future<Output = Result<DesignConfigRecord, sqlx::Error>> + Send;
    fn delete_design_config(&self, id: i64) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;
}

impl DesignConfigOps for Database {
    async fn create_design_config(&self, config: &NewDesignConfig) -> Result<DesignConfigRecord, sqlx::Error> {
        sqlx::query_as::<_, DesignConfigRecord>(
            r#"
            INSERT INTO configs (name, config_type, owner_id, github_path, github_sha,
                description, tags, is_approved, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&config.name)
        .bind(config.config_type.as_str())
        .bind(config.owner_id)
        .bind(&config.github_path)
        .bind(&config.github_sha)
        .bind(&config.description)
        .bind(&config.tags)
        .bind(now())
        .bind(now())
        .fetch_one(self.pool())
        .await
    }

    async fn get_owned_config(&self, id: i64, config_type: ConfigType, owner_id: i64) -> Result<Option<DesignConfigRecord>, sqlx::Error> {
        sqlx::query_as::<_, DesignConfigRecord>(
            "SELECT * FROM configs WHERE id = ? AND config_type = ? AND owner_id = ?",
        )
        .bind(id)
        .bind(config_type.as_str())
        .bind(owner_id)
        .fetch_optional(self.pool())
        .await
    }

    async fn get_config_by_type(&self, id: i64, config_type: ConfigType) -> Result<Option<DesignConfigRecord>, sqlx::Error> {
        sqlx::query_as::<_, DesignConfigRecord>(
            "SELECT * FROM configs WHERE id = ? AND config_type = ?",
        )
        .bind(id)
        .bind(config_type.as_str())
        .fetch_optional(self.pool())
        .await
    }

    async fn find_owned_config_by_name(&self, name: &str, config_type: ConfigType, owner_id: i64) -> Result<Option<DesignConfigRecord>, sqlx::Error> {
        sqlx::query_as::<_, DesignConfigRecord>(
            "SELECT * FROM configs WHERE name = ? AND config_type = ? AND owner_id = ?",
        )
        .bind(name)
        .bind(config_type.as_str())
        .bind(owner_id)
        .fetch_optional(self.pool())
        .await
    }

    async fn list_owned_configs(&self, config_type: ConfigType, owner_id: i64, skip: i64, limit: i64) -> Result<Vec<DesignConfigRecord>, sqlx::Error> {
        sqlx::query_as::<_, DesignConfigRecord>(
            r#"
            SELECT * FROM configs
            WHERE config_type = ? AND owner_id = ?
            ORDER BY id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(config_type.as_str())
        .bind(owner_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(self.pool())
        .await
    }

    /// Writes the editable metadata: name, storage location, description, tags.
    async fn update_design_config(&self, config: &DesignConfigRecord) -> Result<DesignConfigRecord, sqlx::Error> {
        sqlx::query_as::<_, DesignConfigRecord>(
            r#"
            UPDATE configs
            SET name = ?, github_path = ?, github_sha = ?, description = ?, tags = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&config.name)
        .bind(&config.github_path)
        .bind(&config.github_sha)
        .bind(&config.description)
        .bind(&config.tags)
        .bind(now())
        .bind(config.id)
        .fetch_one(self.pool())
        .await
    }

    async fn delete_design_config(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM configs WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}
