//! Effect style library operations

use super::models::{EffectStyleInput, EffectStyleRecord};
use super::{now, Database};

fn json_text(value: &serde_json::Value) -> Result<String, sqlx::Error> {
    serde_json::to_string(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Extension trait for the effect style library
pub trait EffectStyleOps {
    fn create_effect_style(&self, style: &EffectStyleInput, created_by_id: i64) -> impl std::future::Future<Output = Result<EffectStyleRecord, sqlx::Error>> + Send;
    fn get_effect_style(&self, id: i64) -> impl std::future::Future<Output = Result<Option<EffectStyleRecord>, sqlx::Error>> + Send;
    fn update_effect_style(&self, id: i64, style: &EffectStyleInput) -> impl std::future::Future<Output = Result<Option<EffectStyleRecord>, sqlx::Error>> + Send;
    fn delete_effect_style(&self, id: i64) -> impl std::future::Future<Output = Result<bool, sqlx::Error>> + Send;
    fn list_effect_styles(&self, style_type: Option<&str>) -> impl std::future::Future<Output = Result<Vec<EffectStyleRecord>, sqlx::Error>> + Send;
}

impl EffectStyleOps for Database {
    async fn create_effect_style(&self, style: &EffectStyleInput, created_by_id: i64) -> Result<EffectStyleRecord, sqlx::Error> {
        let effector_config = json_text(&style.effector_config)?;
        let style_attributes = style.style_attributes.as_ref().map(json_text).transpose()?;

        sqlx::query_as::<_, EffectStyleRecord>(
            r#"
            INSERT INTO effect_styles (name, style_type, subtype, description, process_verb,
                execution_probability, effector_config, style_attributes, created_by_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&style.name)
        .bind(&style.style_type)
        .bind(&style.subtype)
        .bind(&style.description)
        .bind(&style.process_verb)
        .bind(style.execution_probability)
        .bind(effector_config)
        .bind(style_attributes)
        .bind(created_by_id)
        .bind(now())
        .fetch_one(self.pool())
        .await
    }

    async fn get_effect_style(&self, id: i64) -> Result<Option<EffectStyleRecord>, sqlx::Error> {
        sqlx::query_as::<_, EffectStyleRecord>("SELECT * FROM effect_styles WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
    }

    async fn update_effect_style(&self, id: i64, style: &EffectStyleInput) -> Result<Option<EffectStyleRecord>, sqlx::Error> {
        let effector_config = json_text(&style.effector_config)?;
        let style_attributes = style.style_attributes.as_ref().map(json_text).transpose()?;

        sqlx::query_as::<_, EffectStyleRecord>(
            r#"
            UPDATE effect_styles
            SET name = ?, style_type = ?, subtype = ?, description = ?, process_verb = ?,
                execution_probability = ?, effector_config = ?,
                style_attributes = COALESCE(?, style_attributes),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&style.name)
        .bind(&style.style_type)
        .bind(&style.subtype)
        .bind(&style.description)
        .bind(&style.process_verb)
        .bind(style.execution_probability)
        .bind(effector_config)
        .bind(style_attributes)
        .bind(now())
        .bind(id)
        .fetch_optional(self.pool())
        .await
    }

    async fn delete_effect_style(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM effect_styles WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_effect_styles(&self, style_type: Option<&str>) -> Result<Vec<EffectStyleRecord>, sqlx::Error> {
        match style_type {
            Some(style_type) => {
                sqlx::query_as::<_, EffectStyleRecord>(
                    "SELECT * FROM effect_styles WHERE style_type = ? ORDER BY name",
                )
                .bind(style_type)
                .fetch_all(self.pool())
                .await
            }
            None => {
                sqlx::query_as::<_, EffectStyleRecord>(
                    "SELECT * FROM effect_styles ORDER BY style_type, name",
                )
                .fetch_all(self.pool())
                .await
            }
        }
    }
}
