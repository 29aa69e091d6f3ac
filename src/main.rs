//! Raveling designer backend
//!
//! `raveling serve` (the default) runs the HTTP API. `raveling create-admin`
//! bootstraps an admin account directly in the database.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use raveling::api::{self, AppState};
use raveling::config::AppConfig;
use raveling::core::logging;
use raveling::core::security::hash_password;
use raveling::core::store::{ConfigStore, GitHubStorage, MemoryStore};
use raveling::database::{Database, NewUser, UserOps, UserRole};

#[derive(Parser)]
#[command(name = "raveling")]
#[command(about = "Raveling MUD designer and approval backend", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve,

    /// Create an admin user
    CreateAdmin(CreateAdmin),
}

#[derive(Args)]
struct CreateAdmin {
    #[arg(long)]
    username: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    password: String,

    /// Replace an existing user with the same username
    #[arg(long)]
    delete_existing: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;
    let _log_guard = logging::init(&config.logging);
    tracing::info!("Raveling v{} starting", raveling::VERSION);
    tracing::info!(file = %AppConfig::config_path().display(), "Configuration resolved");

    if config.database.url.is_none() {
        std::fs::create_dir_all(&config.database.data_dir).with_context(|| {
            format!("Failed to create {}", config.database.data_dir.display())
        })?;
    }
    let db = Database::connect(&config.database_url())
        .await
        .context("Failed to open database")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(db, config).await,
        Command::CreateAdmin(args) => create_admin(&db, args).await,
    }
}

fn build_store(config: &AppConfig) -> Result<Arc<dyn ConfigStore>> {
    match GitHubStorage::from_config(&config.github).context("Failed to build GitHub client")? {
        Some(github) => {
            tracing::info!(repo = %config.github.repo, branch = %config.github.branch, "Using GitHub design store");
            Ok(Arc::new(github))
        }
        None => {
            tracing::warn!("No GitHub token configured; design documents are kept in memory only");
            Ok(Arc::new(MemoryStore::new(config.github.base_path.clone())))
        }
    }
}

async fn serve(db: Database, config: AppConfig) -> Result<()> {
    let store = build_store(&config)?;
    let state = AppState::new(db, store, config);
    api::serve(state).await.context("Server error")
}

async fn create_admin(db: &Database, args: CreateAdmin) -> Result<()> {
    if let Some(existing) = db.get_user_by_username(&args.username).await? {
        if !args.delete_existing {
            bail!(
                "User '{}' already exists. Use --delete-existing to replace it.",
                args.username
            );
        }
        db.delete_user(existing.id).await?;
        tracing::warn!(username = %args.username, "Deleted existing user");
    }

    if db.get_user_by_email(&args.email).await?.is_some() {
        bail!("Email '{}' is already registered", args.email);
    }

    let admin = db
        .create_user(&NewUser {
            username: args.username,
            email: args.email,
            hashed_password: hash_password(&args.password)?,
            role: UserRole::Admin,
            is_active: true,
        })
        .await?;

    println!("Admin user created: {} <{}>", admin.username, admin.email);
    Ok(())
}
