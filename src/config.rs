use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable {0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub redis_url: String,
    pub redis_timeout_ms: u64,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub popular_limit: isize,
    pub catalog_page_size: u64,
    pub admin_page_size: u64,
    pub upload_dir: PathBuf,
    pub admin_username: String,
    pub admin_password: Option<String>,
}

impl Config {
    /// Reads the environment, after loading `.env` when present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:3000")?,
            database_url: required("DATABASE_URL")?,
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379")?,
            redis_timeout_ms: try_load("REDIS_TIMEOUT_MS", "250")?,
            jwt_secret: required("SECRET")?,
            token_ttl_hours: try_load("TOKEN_TTL_HOURS", "24")?,
            popular_limit: at_least_one("POPULAR_LIMIT", try_load("POPULAR_LIMIT", "8")?)?,
            catalog_page_size: at_least_one(
                "CATALOG_PAGE_SIZE",
                try_load("CATALOG_PAGE_SIZE", "8")?,
            )?,
            admin_page_size: at_least_one("ADMIN_PAGE_SIZE", try_load("ADMIN_PAGE_SIZE", "100")?)?,
            upload_dir: try_load::<String>("UPLOAD_DIR", "./uploads")?.into(),
            admin_username: try_load("ADMIN_USERNAME", "admin")?,
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    parse_value(key, &raw)
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    raw.parse().map_err(|err: T::Err| {
        warn!("Invalid {key} value: {err}");
        ConfigError::Invalid {
            key,
            reason: err.to_string(),
        }
    })
}

/// Limits and page sizes of zero or below would make lists unbounded.
fn at_least_one<T>(key: &'static str, value: T) -> Result<T, ConfigError>
where
    T: PartialOrd + From<u8> + Display,
{
    if value < T::from(1) {
        warn!("Invalid {key} value: {value}");
        return Err(ConfigError::Invalid {
            key,
            reason: format!("must be at least 1, got {value}"),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers() {
        let limit: isize = parse_value("POPULAR_LIMIT", "12").unwrap();
        assert_eq!(limit, 12);
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_value::<u64>("CATALOG_PAGE_SIZE", "eight").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "CATALOG_PAGE_SIZE",
                ..
            }
        ));
    }

    #[test]
    fn limits_must_be_positive() {
        assert_eq!(at_least_one::<isize>("POPULAR_LIMIT", 1).unwrap(), 1);
        for bad in [0, -3] {
            let err = at_least_one::<isize>("POPULAR_LIMIT", bad).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: "POPULAR_LIMIT", .. }));
        }
        assert!(at_least_one::<u64>("CATALOG_PAGE_SIZE", 0).is_err());
    }
}
