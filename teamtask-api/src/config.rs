/// Configuration management for the API server
///
/// Configuration is read from environment variables (a `.env` file is loaded
/// first when present).
///
/// # Environment Variables
///
/// - `API_HOST` (default `0.0.0.0`), `API_PORT` (default `8080`)
/// - `API_CORS_ORIGINS`: comma separated, `*` for permissive (default `*`)
/// - `API_REQUEST_TIMEOUT_SECS`: per-request deadline (default 30)
/// - `DATABASE_URL` (required), `DATABASE_MAX_CONNECTIONS` (default 10)
/// - `MIGRATIONS_AUTO`: apply migrations at startup (default true)
/// - `REDIS_URL` (required), `REDIS_CONNECTION_TIMEOUT_SECS` (5),
///   `REDIS_COMMAND_TIMEOUT_SECS` (10), `REDIS_MAX_RETRIES` (3)
/// - `JWT_SECRET` (required, at least 32 characters)
/// - `JWT_ACCESS_TTL_MINUTES` (default 30; non-positive values fall back to 30)
/// - `MAIL_API_URL` (optional; mail is logged when unset), `MAIL_API_KEY`,
///   `MAIL_FROM` (default `no-reply@teamtask.local`)
/// - `METRICS_ENABLED` (default true), `METRICS_PATH` (default `/metrics`)
/// - `LOG_FORMAT`: `pretty` or `json` (default `pretty`)
///
/// # Example
///
/// ```no_run
/// use teamtask_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use teamtask_shared::auth::jwt;
use teamtask_shared::redis::RedisConfig;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
    pub metrics: MetricsConfig,
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Deadline applied to every request
    pub request_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    pub max_connections: u32,

    /// Apply pending migrations at startup
    pub migrations_auto: bool,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HMAC-SHA256 signing key
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Access token lifetime in minutes
    pub access_ttl_minutes: i64,
}

/// Outbound mail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Mail API endpoint; `None` writes mail to the log instead
    pub api_url: Option<String>,
    pub api_key: String,
    pub from: String,
}

/// Metrics endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub path: String,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value cannot
    /// be parsed.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("API_PORT", 8080u16)?;
        let cors_origins = parse_origins(
            &env::var("API_CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        );
        let request_timeout_secs = parse_var("API_REQUEST_TIMEOUT_SECS", 30u64)?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 10u32)?;
        let migrations_auto = parse_var("MIGRATIONS_AUTO", true)?;

        let redis = RedisConfig::from_env()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }
        let access_ttl_minutes =
            parse_var("JWT_ACCESS_TTL_MINUTES", jwt::DEFAULT_ACCESS_TTL_MINUTES)?;

        let mail = MailConfig {
            api_url: env::var("MAIL_API_URL").ok().filter(|url| !url.trim().is_empty()),
            api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@teamtask.local".to_string()),
        };
        if mail.api_url.is_some() && mail.api_key.is_empty() {
            anyhow::bail!("MAIL_API_KEY is required when MAIL_API_URL is set");
        }

        let metrics = MetricsConfig {
            enabled: parse_var("METRICS_ENABLED", true)?,
            path: env::var("METRICS_PATH").unwrap_or_else(|_| "/metrics".to_string()),
        };
        if !metrics.path.starts_with('/') {
            anyhow::bail!("METRICS_PATH must start with '/'");
        }

        let log_format = match env::var("LOG_FORMAT") {
            Ok(value) => value.parse().map_err(anyhow::Error::msg)?,
            Err(_) => LogFormat::Pretty,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                request_timeout_secs,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                migrations_auto,
            },
            redis,
            jwt: JwtConfig {
                secret: jwt_secret,
                access_ttl_minutes,
            },
            mail,
            metrics,
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    /// Access token lifetime, with non-positive values replaced by the default
    pub fn access_ttl(&self) -> chrono::Duration {
        jwt::access_ttl_from_minutes(self.jwt.access_ttl_minutes)
    }
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Configuration with fixed values for unit tests
#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: "postgresql://localhost/test".to_string(),
            max_connections: 10,
            migrations_auto: false,
        },
        redis: RedisConfig::with_url("redis://localhost:6379"),
        jwt: JwtConfig {
            secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            access_ttl_minutes: 0,
        },
        mail: MailConfig {
            api_url: None,
            api_key: String::new(),
            from: "no-reply@teamtask.local".to_string(),
        },
        metrics: MetricsConfig {
            enabled: true,
            path: "/metrics".to_string(),
        },
        log_format: LogFormat::Pretty,
    }
}
