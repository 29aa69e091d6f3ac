//! Database Migrations
//!
//! Handles schema creation and versioned migrations.

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::{info, warn};

/// Current database schema version
pub const SCHEMA_VERSION: i32 = 4;

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current_version = get_current_version(pool).await?;

    info!(current_version, target_version = SCHEMA_VERSION, "Checking database migrations");

    if current_version < SCHEMA_VERSION {
        info!("Running database migrations from v{} to v{}", current_version, SCHEMA_VERSION);

        for version in (current_version + 1)..=SCHEMA_VERSION {
            run_migration(pool, version).await?;
        }

        info!("Database migrations completed successfully");
    }

    Ok(())
}

/// Get the current schema version
pub async fn get_current_version(pool: &SqlitePool) -> Result<i32, sqlx::Error> {
    let result = sqlx::query("SELECT MAX(version) as version FROM _migrations")
        .fetch_optional(pool)
        .await?;

    Ok(result
        .and_then(|row| row.try_get::<i32, _>("version").ok())
        .unwrap_or(0))
}

/// Apply one migration and record it, atomically
async fn run_migration(pool: &SqlitePool, version: i32) -> Result<(), sqlx::Error> {
    let (name, sql) = match version {
        1 => ("initial_schema", MIGRATION_V1),
        2 => ("user_color", MIGRATION_V2),
        3 => ("effect_styles", MIGRATION_V3),
        4 => ("collaboration_notes", MIGRATION_V4),
        _ => {
            warn!("Unknown migration version: {}", version);
            return Ok(());
        }
    };

    info!("Applying migration v{}: {}", version, name);

    let mut tx = pool.begin().await?;
    for statement in sql.split(';').filter(|s| !s.trim().is_empty()) {
        sqlx::query(statement.trim()).execute(&mut *tx).await?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(version)
        .bind(name)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(())
}

/// Migration v1: users, design config metadata, approved configs
const MIGRATION_V1: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    hashed_password TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'player',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT
);

CREATE TABLE IF NOT EXISTS configs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    config_type TEXT NOT NULL,
    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    github_path TEXT,
    github_sha TEXT,
    description TEXT,
    tags TEXT,
    is_approved INTEGER NOT NULL DEFAULT 0,
    approved_at TEXT,
    approved_by_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_configs_owner_type ON configs(owner_id, config_type);
CREATE INDEX IF NOT EXISTS idx_configs_approved ON configs(is_approved);

CREATE TABLE IF NOT EXISTS approved_configs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    config_type TEXT NOT NULL,
    config_content TEXT NOT NULL,
    source_config_id INTEGER REFERENCES configs(id) ON DELETE SET NULL,
    github_path TEXT,
    github_sha TEXT,
    description TEXT,
    tags TEXT,
    approved_by_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    approved_at TEXT NOT NULL,
    updated_at TEXT,
    UNIQUE(name, config_type)
);

CREATE INDEX IF NOT EXISTS idx_approved_type ON approved_configs(config_type)
"#;

/// Migration v2: per-user highlight color for the collaboration panel
const MIGRATION_V2: &str = r#"
ALTER TABLE users ADD COLUMN user_color TEXT
"#;

/// Migration v3: effect style library
const MIGRATION_V3: &str = r#"
CREATE TABLE IF NOT EXISTS effect_styles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    style_type TEXT NOT NULL,
    subtype TEXT NOT NULL,
    description TEXT,
    process_verb TEXT,
    execution_probability REAL NOT NULL DEFAULT 1.0,
    effector_config TEXT NOT NULL,
    style_attributes TEXT,
    created_by_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_effect_styles_type ON effect_styles(style_type)
"#;

/// Migration v4: shared notes, one per designer type
const MIGRATION_V4: &str = r#"
CREATE TABLE IF NOT EXISTS collaboration_notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    designer_type TEXT NOT NULL UNIQUE,
    content TEXT NOT NULL DEFAULT '',
    created_by_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    updated_by_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT
)
"#;
