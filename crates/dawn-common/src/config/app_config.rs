//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    /// `None` runs the gateway on the in-memory message store
    pub database: Option<DatabaseConfig>,
    /// `None` runs on the in-memory cache with the pub/sub bridge degraded
    pub redis: Option<RedisConfig>,
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub realtime: RealtimeConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            "development" | "dev" => Ok(Self::Development),
            other => Err(ConfigError::InvalidValue("APP_ENV", other.to_string())),
        }
    }
}

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub max_connections: u32,
}

/// JWT verification configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
}

/// CORS configuration
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

/// Timings and limits of the realtime layer
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Lifetime of a typing indicator without a refresh
    pub typing_ttl: Duration,
    /// Lifetime of a presence entry without a heartbeat
    pub presence_ttl: Duration,
    pub typing_sweep_interval: Duration,
    pub flush_interval: Duration,
    /// Connections silent for longer than this are closed
    pub idle_timeout: Duration,
    pub pubsub_channel: String,
    /// Per-connection outbound queue capacity
    pub outbound_buffer: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            typing_ttl: Duration::from_millis(default_typing_ttl_ms()),
            presence_ttl: Duration::from_secs(default_presence_ttl_secs()),
            typing_sweep_interval: Duration::from_secs(default_typing_sweep_secs()),
            flush_interval: Duration::from_secs(default_flush_interval_secs()),
            idle_timeout: Duration::from_secs(default_idle_timeout_secs()),
            pubsub_channel: default_pubsub_channel(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "dawn-chat".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8081
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_typing_ttl_ms() -> u64 {
    6_000
}

fn default_presence_ttl_secs() -> u64 {
    60
}

fn default_typing_sweep_secs() -> u64 {
    10
}

fn default_flush_interval_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    90
}

fn default_pubsub_channel() -> String {
    "dawn:chat:events".to_string()
}

fn default_outbound_buffer() -> usize {
    256
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if `JWT_SECRET` is missing or a variable fails to parse
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let env = match lookup("APP_ENV") {
            Some(value) => value.parse()?,
            None => Environment::default(),
        };

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            gateway: ServerConfig {
                host: lookup("GATEWAY_HOST").unwrap_or_else(default_host),
                port: vars.parse_or("GATEWAY_PORT", default_gateway_port)?,
            },
            database: match lookup("DATABASE_URL") {
                Some(url) => Some(DatabaseConfig {
                    url,
                    max_connections: vars.parse_or("DATABASE_MAX_CONNECTIONS", default_max_connections)?,
                    min_connections: vars.parse_or("DATABASE_MIN_CONNECTIONS", default_min_connections)?,
                }),
                None => None,
            },
            redis: match lookup("REDIS_URL") {
                Some(url) => Some(RedisConfig {
                    url,
                    max_connections: vars.parse_or("REDIS_POOL_SIZE", default_redis_max_connections)?,
                }),
                None => None,
            },
            jwt: JwtConfig {
                secret: lookup("JWT_SECRET").ok_or(ConfigError::MissingVar("JWT_SECRET"))?,
            },
            cors: CorsConfig {
                allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
            realtime: RealtimeConfig {
                typing_ttl: Duration::from_millis(vars.parse_or("CHAT_TYPING_TTL_MS", default_typing_ttl_ms)?),
                presence_ttl: Duration::from_secs(
                    vars.parse_or("CHAT_PRESENCE_TTL_SECS", default_presence_ttl_secs)?,
                ),
                typing_sweep_interval: Duration::from_secs(
                    vars.parse_or("CHAT_TYPING_SWEEP_SECS", default_typing_sweep_secs)?,
                ),
                flush_interval: Duration::from_secs(
                    vars.parse_or("CHAT_FLUSH_INTERVAL_SECS", default_flush_interval_secs)?,
                ),
                idle_timeout: Duration::from_secs(
                    vars.parse_or("CHAT_IDLE_TIMEOUT_SECS", default_idle_timeout_secs)?,
                ),
                pubsub_channel: lookup("CHAT_PUBSUB_CHANNEL").unwrap_or_else(default_pubsub_channel),
                outbound_buffer: vars.parse_or("CHAT_OUTBOUND_BUFFER", default_outbound_buffer)?,
            },
        })
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn parse_or<T: FromStr>(&self, key: &'static str, default: fn() -> T) -> Result<T, ConfigError> {
        match (self.0)(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key, raw)),
            None => Ok(default()),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("TEST".parse::<Environment>().unwrap(), Environment::Test);
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_server_address() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 8080,
        };
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.app.name, "dawn-chat");
        assert_eq!(config.gateway.port, 8081);
        assert!(config.database.is_none());
        assert!(config.redis.is_none());
        assert_eq!(config.realtime.typing_ttl, Duration::from_secs(6));
        assert_eq!(config.realtime.typing_sweep_interval, Duration::from_secs(10));
        assert_eq!(config.realtime.pubsub_channel, "dawn:chat:events");
    }

    #[test]
    fn test_missing_secret() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("JWT_SECRET")));
    }

    #[test]
    fn test_invalid_number() {
        let err = AppConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("GATEWAY_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue("GATEWAY_PORT", _)));
    }

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("APP_ENV", "production"),
            ("DATABASE_URL", "postgres://localhost/dawn"),
            ("REDIS_URL", "redis://localhost:6379"),
            ("CHAT_TYPING_TTL_MS", "2500"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
        ]))
        .unwrap();
        assert!(config.app.env.is_production());
        assert_eq!(config.database.unwrap().max_connections, 20);
        assert_eq!(config.redis.unwrap().url, "redis://localhost:6379");
        assert_eq!(config.realtime.typing_ttl, Duration::from_millis(2500));
        assert_eq!(config.cors.allowed_origins.len(), 2);
    }
}
