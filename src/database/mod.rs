//! SQLite Database Module
//!
//! Metadata for design configs, the approved production table, the effect
//! style library, collaboration notes and user accounts. Design content
//! itself lives in the design store.

mod approved;
mod configs;
mod effect_styles;
mod migrations;
mod models;
mod notes;
mod users;

pub use approved::ApprovedConfigOps;
pub use configs::DesignConfigOps;
pub use effect_styles::EffectStyleOps;
pub use migrations::run_migrations;
pub use models::*;
pub use notes::NoteOps;
pub use users::UserOps;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DATABASE_FILE: &str = "raveling.db";

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (creating if needed) `raveling.db` under `data_dir`
    pub async fn new(data_dir: &Path) -> Result<Self, sqlx::Error> {
        let db_path = data_dir.join(DATABASE_FILE);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let mut db = Self::connect(&format!("sqlite:{}?mode=rwc", db_path.display())).await?;
        db.path = Some(db_path);
        Ok(db)
    }

    /// Open a database from a sqlite URL and run migrations
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .connect_with(options)
            .await?;

        migrations::run_migrations(&pool).await?;

        Ok(Self { pool, path: None })
    }

    /// Get the underlying pool for direct queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Database file path, when opened from a data directory
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

/// RFC3339 timestamp used for every `*_at` column.
pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
