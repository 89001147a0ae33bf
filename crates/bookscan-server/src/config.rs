//! Configuration management

use serde::{Deserialize, Serialize};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 3001;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default embedded database path.
pub const DEFAULT_SQLITE_URL: &str = "sqlite:books.db";

/// Default maximum database connections in the pool (networked backend).
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool (networked backend).
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 0;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds.
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 30;

/// Default vision model name.
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o-mini";

/// Default token budget for a vision completion.
pub const DEFAULT_VISION_MAX_TOKENS: u32 = 1000;

/// Default vision API endpoint.
pub const DEFAULT_VISION_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default timeout for a vision API call in seconds.
///
/// The vision call is the only request with unbounded external latency, so
/// it always runs under an explicit deadline.
pub const DEFAULT_VISION_TIMEOUT_SECS: u64 = 30;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Deployment environment, controls error verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(anyhow::anyhow!("Invalid environment: {}", s)),
        }
    }
}

/// Storage backend selector
///
/// Chosen once at startup; the adapter never switches backends within a
/// process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    /// Embedded file database (SQLite)
    #[default]
    Sqlite,
    /// Networked relational database (PostgreSQL)
    Postgres,
}

impl std::str::FromStr for DatabaseBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" | "embedded" => Ok(DatabaseBackend::Sqlite),
            "postgres" | "postgresql" => Ok(DatabaseBackend::Postgres),
            _ => Err(anyhow::anyhow!("Invalid database backend: {}", s)),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub vision: VisionConfig,
    pub cors: CorsConfig,
    pub environment: Environment,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// Vision extraction API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub api_url: String,
    pub timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend: DatabaseBackend = std::env::var("DATABASE_BACKEND")
            .ok()
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or_default();

        let default_url = match backend {
            DatabaseBackend::Sqlite => DEFAULT_SQLITE_URL.to_string(),
            DatabaseBackend::Postgres => String::new(),
        };

        let config = Config {
            server: ServerConfig {
                host: std::env::var("BOOKSCAN_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: std::env::var("BOOKSCAN_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: std::env::var("BOOKSCAN_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            },
            database: DatabaseConfig {
                backend,
                url: std::env::var("DATABASE_URL").unwrap_or(default_url),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
                min_connections: std::env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MIN_CONNECTIONS),
                connect_timeout_secs: std::env::var("DATABASE_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS),
                idle_timeout_secs: std::env::var("DATABASE_IDLE_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_IDLE_TIMEOUT_SECS),
            },
            vision: VisionConfig {
                api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
                model: std::env::var("OPENAI_MODEL")
                    .unwrap_or_else(|_| DEFAULT_VISION_MODEL.to_string()),
                max_tokens: std::env::var("OPENAI_MAX_TOKENS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_VISION_MAX_TOKENS),
                api_url: std::env::var("OPENAI_API_URL")
                    .unwrap_or_else(|_| DEFAULT_VISION_API_URL.to_string()),
                timeout_secs: std::env::var("VISION_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_VISION_TIMEOUT_SECS),
            },
            cors: CorsConfig {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
                allow_credentials: std::env::var("CORS_ALLOW_CREDENTIALS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
            },
            environment: std::env::var("BOOKSCAN_ENV")
                .ok()
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!(
                "Database URL cannot be empty (set DATABASE_URL for the {} backend)",
                match self.database.backend {
                    DatabaseBackend::Sqlite => "sqlite",
                    DatabaseBackend::Postgres => "postgres",
                }
            );
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.vision.api_key.is_empty() {
            anyhow::bail!("OPENAI_API_KEY is required");
        }

        if self.vision.timeout_secs == 0 {
            anyhow::bail!("Vision timeout must be greater than 0");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                backend: DatabaseBackend::Sqlite,
                url: DEFAULT_SQLITE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            vision: VisionConfig {
                api_key: String::new(),
                model: DEFAULT_VISION_MODEL.to_string(),
                max_tokens: DEFAULT_VISION_MAX_TOKENS,
                api_url: DEFAULT_VISION_API_URL.to_string(),
                timeout_secs: DEFAULT_VISION_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            environment: Environment::Development,
        }
    }
}
