/// Configuration management for Yatube Service
///
/// All settings come from environment variables. `main` loads a `.env` file
/// through `dotenvy` first, so local development can keep them in one place.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Secret used when `SESSION_SECRET` is unset. Rejected in production.
pub const DEFAULT_SESSION_SECRET: &str = "yatube-development-secret-change-me";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Storage backend selection
    pub storage: StorageConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Session cookie configuration
    pub session: SessionConfig,
    /// Uploaded media configuration
    pub media: MediaConfig,
    /// Listing configuration
    pub pagination: PaginationConfig,
    /// Log output configuration
    pub logging: LoggingConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Number of HTTP workers
    pub workers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL through sqlx
    Postgres,
    /// In-process tables; data is lost on restart
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!(
                "STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

/// Database configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    /// Min idle connections kept in pool
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
    /// Apply pending migrations at startup
    pub run_migrations: bool,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HMAC secret for session tokens
    pub secret: String,
    /// Session lifetime
    pub ttl_hours: i64,
    /// Cookie carrying the session token
    pub cookie_name: String,
    /// Mark the cookie `Secure` (HTTPS only)
    pub cookie_secure: bool,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"[REDACTED]")
            .field("ttl_hours", &self.ttl_hours)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SESSION_SECRET.to_string(),
            ttl_hours: 24 * 14,
            cookie_name: "yatube_session".to_string(),
            cookie_secure: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Directory holding uploaded files
    pub root: PathBuf,
    /// Upper bound for a single upload
    pub max_upload_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("media"),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub posts_per_page: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { posts_per_page: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of the human-readable format
    pub json: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let storage_backend: StorageBackend = std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("YATUBE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("YATUBE_PORT", 8000)?,
                workers: parse_env_or_default("YATUBE_WORKERS", 4)?,
            },
            storage: StorageConfig {
                backend: storage_backend,
            },
            database: DatabaseConfig {
                url: match std::env::var("DATABASE_URL") {
                    Ok(url) => url,
                    Err(_) if storage_backend == StorageBackend::Postgres && production => {
                        return Err("DATABASE_URL must be set in production".to_string())
                    }
                    Err(_) => "postgres://localhost/yatube".to_string(),
                },
                max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: parse_env_or_default("DATABASE_MIN_CONNECTIONS", 1)?,
                acquire_timeout_secs: parse_env_or_default("DATABASE_ACQUIRE_TIMEOUT_SECS", 10)?,
                run_migrations: parse_env_or_default("DATABASE_RUN_MIGRATIONS", true)?,
            },
            session: {
                let secret = std::env::var("SESSION_SECRET")
                    .unwrap_or_else(|_| DEFAULT_SESSION_SECRET.to_string());
                if production && (secret.trim().is_empty() || secret == DEFAULT_SESSION_SECRET) {
                    return Err(
                        "SESSION_SECRET must be set to a non-default value in production"
                            .to_string(),
                    );
                }

                SessionConfig {
                    secret,
                    ttl_hours: parse_env_or_default("SESSION_TTL_HOURS", 24 * 14)?,
                    cookie_name: std::env::var("SESSION_COOKIE_NAME")
                        .unwrap_or_else(|_| "yatube_session".to_string()),
                    cookie_secure: parse_env_or_default("SESSION_COOKIE_SECURE", production)?,
                }
            },
            media: MediaConfig {
                root: std::env::var("MEDIA_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("media")),
                max_upload_bytes: parse_env_or_default("MEDIA_MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            },
            pagination: PaginationConfig {
                posts_per_page: match parse_env_or_default("POSTS_PER_PAGE", 10usize)? {
                    0 => return Err("POSTS_PER_PAGE must be greater than zero".to_string()),
                    n => n,
                },
            },
            logging: LoggingConfig {
                json: std::env::var("LOG_FORMAT")
                    .map(|v| v.eq_ignore_ascii_case("json"))
                    .unwrap_or(false),
            },
        })
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
