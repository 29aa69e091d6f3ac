//! User database operations

use super::models::{NewUser, UserRecord, UserRole, UserUpdate};
use super::{now, Database};

/// Extension trait for user account operations
pub trait UserOps {
    fn create_user(&self, user: &NewUser) -> impl std::future::Future<Output = Result<UserRecord, sqlx::Error>> + Send;
    fn get_user(&self, id: i64) -> impl std::future::Future<Output = Result<Option<UserRecord>, sqlx::Error>> + Send;
    fn get_user_by_username(&self, username: &str) -> impl std::future::Future<Output = Result<Option<UserRecord>, sqlx::Error>> + Send;
    fn get_user_by_email(&self, email: &str) -> impl std::future::Future<Output = Result<Option<UserRecord>, sqlx::Error>> + Send;
    fn list_users(&self, skip: i64, limit: i64) -> impl std::future::Future<Output = Result<Vec<UserRecord>, sqlx::Error>> + Send;
    fn update_user(&self, id: i64, update: &UserUpdate) -> impl std::future::Future<Output = Result<Option<UserRecord>, sqlx::Error>> + Send;
    fn set_user_color(&self, id: i64, color: &str) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;
    fn delete_user(&self, id: i64) -> impl std::future::Future<Output = Result<bool, sqlx::Error>> + Send;
    fn count_users_with_role(&self, role: UserRole) -> impl std::future::Future<Output = Result<i64, sqlx::Error>> + Send;
}

impl UserOps for Database {
    async fn create_user(&self, user: &NewUser) -> Result<UserRecord, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (username, email, hashed_password, role, is_active, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(now())
        .fetch_one(self.pool())
        .await
    }

    async fn get_user(&self, id: i64) -> Result<Option<UserRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.pool())
            .await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool())
            .await
    }

    async fn list_users(&self, skip: i64, limit: i64) -> Result<Vec<UserRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT * FROM users ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(self.pool())
        .await
    }

    async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<Option<UserRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET role = COALESCE(?, role),
                is_active = COALESCE(?, is_active),
                email = COALESCE(?, email),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(update.role.map(|r| r.as_str()))
        .bind(update.is_active)
        .bind(&update.email)
        .bind(now())
        .bind(id)
        .fetch_optional(self.pool())
        .await
    }

    async fn set_user_color(&self, id: i64, color: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET user_color = ?, updated_at = ? WHERE id = ?")
            .bind(color)
            .bind(now())
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn delete_user(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_users_with_role(&self, role: UserRole) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role.as_str())
            .fetch_one(self.pool())
            .await
    }
}
