use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::Duration;

use crate::models::category::DefaultCategory;

/// Configuration errors raised while reading the environment
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub bcrypt_cost: u32,
}

impl SecurityConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::minutes(self.access_token_expire_minutes)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub default_category: DefaultCategory,
}

impl AppConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        // Must satisfy the same limits as user-created categories
        let defaults = DefaultCategory::default();
        let default_category = DefaultCategory {
            name: text_var(&lookup, "DEFAULT_CATEGORY_NAME", 50)?.unwrap_or(defaults.name),
            description: text_var(&lookup, "DEFAULT_CATEGORY_DESCRIPTION", 1000)?
                .or(defaults.description),
            tag: parse_var(&lookup, "DEFAULT_CATEGORY_TAG")?.or(defaults.tag),
        };

        Ok(Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
                port: parse_var(&lookup, "PORT")?.unwrap_or(8080),
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: ranged_var(&lookup, "DATABASE_MAX_CONNECTIONS", 1..=u32::MAX)?
                    .unwrap_or(5),
            },
            security: SecurityConfig {
                jwt_secret: required("JWT_SECRET")?,
                access_token_expire_minutes: ranged_var(
                    &lookup,
                    "ACCESS_TOKEN_EXPIRE_MINUTES",
                    TOKEN_MINUTES,
                )?
                .unwrap_or(30),
                bcrypt_cost: ranged_var(&lookup, "BCRYPT_COST", BCRYPT_COSTS)?
                    .unwrap_or(bcrypt::DEFAULT_COST),
            },
            default_category,
        })
    }
}

/// Token lifetimes from one minute up to a year
const TOKEN_MINUTES: RangeInclusive<i64> = 1..=525_600;

/// Costs the bcrypt crate accepts
const BCRYPT_COSTS: RangeInclusive<u32> = 4..=31;

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn ranged_var<T, F>(
    lookup: &F,
    name: &'static str,
    range: RangeInclusive<T>,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr + PartialOrd + ToString,
    F: Fn(&str) -> Option<String>,
{
    match parse_var(lookup, name)? {
        Some(value) if !range.contains(&value) => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
        parsed => Ok(parsed),
    }
}

/// Trimmed text of 1 to `max_chars` characters
fn text_var<F>(
    lookup: &F,
    name: &'static str,
    max_chars: usize,
) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => {
            let trimmed = value.trim();
            let chars = trimmed.chars().count();
            if chars == 0 || chars > max_chars {
                Err(ConfigError::Invalid { name, value })
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
    }
}
