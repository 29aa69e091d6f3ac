//! Collaboration note operations
//!
//! One note per designer type. Reads join the creator and last editor.

use super::models::NoteRecord;
use super::{now, Database};

const NOTE_SELECT: &str = r#"
    SELECT n.id, n.designer_type, n.content, n.created_by_id, n.updated_by_id,
           n.created_at, n.updated_at,
           c.username AS created_by_username,
           u.username AS updated_by_username
    FROM collaboration_notes n
    LEFT JOIN users c ON c.id = n.created_by_id
    LEFT JOIN users u ON u.id = n.updated_by_id
    WHERE n.designer_type = ?
"#;

pub trait NoteOps {
    fn get_note(&self, designer_type: &str) -> impl std::future::Future<Output = Result<Option<NoteRecord>, sqlx::Error>> + Send;
    fn upsert_note(&self, designer_type: &str, content: &str, user_id: i64) -> impl std::future::Future<Output = Result<NoteRecord, sqlx::Error>> + Send;
}

impl NoteOps for Database {
    async fn get_note(&self, designer_type: &str) -> Result<Option<NoteRecord>, sqlx::Error> {
        sqlx::query_as::<_, NoteRecord>(NOTE_SELECT)
            .bind(designer_type)
            .fetch_optional(self.pool())
            .await
    }

    /// Creator is kept from the first write; the last writer becomes `updated_by`.
    async fn upsert_note(&self, designer_type: &str, content: &str, user_id: i64) -> Result<NoteRecord, sqlx::Error> {
        let timestamp = now();
        sqlx::query(
            r#"
            INSERT INTO collaboration_notes (designer_type, content, created_by_id, updated_by_id,
                created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(designer_type) DO UPDATE SET
                content = excluded.content,
                updated_by_id = excluded.updated_by_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(designer_type)
        .bind(content)
        .bind(user_id)
        .bind(user_id)
        .bind(&timestamp)
        .bind(&timestamp)
        .execute(self.pool())
        .await?;

        sqlx::query_as::<_, NoteRecord>(NOTE_SELECT)
            .bind(designer_type)
            .fetch_one(self.pool())
            .await
    }
}
