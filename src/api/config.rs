//! Server configuration read from the process environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: `{value}` ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: IpAddr,
    pub port: u16,
    /// Base URL of the authentication service
    pub auth_service_url: Url,
    /// Postgres URL (None = in-memory store)
    pub database_url: Option<String>,
    /// Broadcast channel capacity per room
    pub broadcast_capacity: usize,
    /// Record deep relation removals in model history
    pub log_relation_removal: bool,
    /// Allowed CORS origins (empty = permissive)
    pub cors_allowed_origins: Vec<String>,
    pub log_format: LogFormat,
}

const DEFAULT_BIND_ADDRESS: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_PORT: u16 = 8081;
const DEFAULT_AUTH_SERVICE_URL: &str = "http://localhost:8080";
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup, applying defaults for
    /// absent or blank keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bind_address = match get("BIND_ADDRESS") {
            Some(value) => parse("BIND_ADDRESS", &value)?,
            None => DEFAULT_BIND_ADDRESS,
        };
        let port = match get("PORT") {
            Some(value) => parse("PORT", &value)?,
            None => DEFAULT_PORT,
        };
        let auth_service_url = get("AUTH_SERVICE_URL")
            .unwrap_or_else(|| DEFAULT_AUTH_SERVICE_URL.to_string());
        let auth_service_url = Url::parse(auth_service_url.trim())
            .map_err(|e| invalid("AUTH_SERVICE_URL", &auth_service_url, e))?;
        let broadcast_capacity = match get("BROADCAST_CAPACITY") {
            Some(value) => match parse::<usize>("BROADCAST_CAPACITY", &value)? {
                0 => return Err(invalid("BROADCAST_CAPACITY", &value, "must be positive")),
                capacity => capacity,
            },
            None => DEFAULT_BROADCAST_CAPACITY,
        };
        let log_relation_removal = match get("LOG_RELATION_REMOVAL") {
            Some(value) => parse_bool("LOG_RELATION_REMOVAL", &value)?,
            None => true,
        };
        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let log_format = match get("LOG_FORMAT") {
            Some(value) => match value.trim().to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "text" | "pretty" => LogFormat::Text,
                _ => return Err(invalid("LOG_FORMAT", &value, "expected `json` or `text`")),
            },
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_address,
            port,
            auth_service_url,
            database_url: get("DATABASE_URL"),
            broadcast_capacity,
            log_relation_removal,
            cors_allowed_origins,
            log_format,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: ToString,
{
    value.trim().parse().map_err(|e: T::Err| invalid(key, value, e))
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected a boolean")),
    }
}
