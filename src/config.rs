use std::net::SocketAddr;
use std::path::PathBuf;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub github: GitHubConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the API binds to.
    pub bind: SocketAddr,
    /// Origins allowed to call the API with credentials.
    pub cors_origins: Vec<String>,
}

/// Token signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. Also guards the one-time admin bootstrap endpoint.
    pub secret_key: String,
    /// Lifetime of issued access tokens.
    pub access_token_expire_minutes: i64,
}

/// Relational metadata store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full sqlite URL. Takes precedence over `data_dir` when set.
    pub url: Option<String>,
    /// Directory holding `raveling.db`.
    pub data_dir: PathBuf,
}

/// Design store (GitHub repository) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Personal access token. Without one the server runs on an in-memory store.
    pub token: Option<String>,
    /// Repository in `owner/repo` form.
    pub repo: String,
    pub branch: String,
    /// Directory inside the repository that holds the `{kind}s/` folders.
    pub base_path: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    pub log_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            cors_origins: vec![
                "https://raveling.devocosm.com".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: "change-this-secret-key-in-production".to_string(),
            access_token_expire_minutes: 30,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            repo: "devoprops/raveling".to_string(),
            branch: "main".to_string(),
            base_path: "src/configs".to_string(),
            api_base: "https://api.github.com".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl AppConfig {
    /// Environment prefix for overrides, e.g. `RAVELING_GITHUB__TOKEN`.
    pub const ENV_PREFIX: &'static str = "RAVELING_";

    /// Load configuration from defaults, `raveling.toml` and the environment.
    ///
    /// A `.env` file in the working directory is read first so its values
    /// participate in the environment layer.
    pub fn load() -> Result<Self, figment::Error> {
        // A missing .env is normal outside development.
        dotenvy::dotenv().ok();
        Self::figment(&Self::config_path()).extract()
    }

    /// The layered provider stack, exposed for tests and tooling.
    pub fn figment(config_path: &std::path::Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
    }

    /// Sqlite URL of the metadata database.
    pub fn database_url(&self) -> String {
        self.database.url.clone().unwrap_or_else(|| {
            format!(
                "sqlite:{}?mode=rwc",
                self.database.data_dir.join("raveling.db").display()
            )
        })
    }

    /// `$RAVELING_CONFIG`, else `raveling.toml` in the working directory.
    pub fn config_path() -> PathBuf {
        std::env::var_os("RAVELING_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("raveling.toml"))
    }
}
