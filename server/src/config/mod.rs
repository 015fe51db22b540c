use rust_decimal::Decimal;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

use crate::auth;
use crate::utils::crypto;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_FEE_RATE: &str = "0.10";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub card_encryption_secret: String,
    pub default_fee_rate: Decimal,
    pub cors_allowed_origins: Vec<String>,
    pub production: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db_max_connections", &self.db_max_connections)
            .field("bind_addr", &self.bind_addr)
            .field("default_fee_rate", &self.default_fee_rate)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("production", &self.production)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < auth::MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {} bytes", auth::MIN_SECRET_LEN),
            });
        }
        let card_encryption_secret = required("CARD_ENCRYPTION_SECRET")?;
        if card_encryption_secret.len() < crypto::MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "CARD_ENCRYPTION_SECRET",
                reason: format!("must be at least {} bytes", crypto::MIN_SECRET_LEN),
            });
        }

        let db_max_connections = parse_or(
            &lookup,
            "DB_MAX_CONNECTIONS",
            DEFAULT_MAX_CONNECTIONS.to_string(),
        )?;
        let bind_addr = parse_or(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR.to_string())?;
        let default_fee_rate: Decimal =
            parse_or(&lookup, "DEFAULT_FEE_RATE", DEFAULT_FEE_RATE.to_string())?;
        if default_fee_rate.is_sign_negative() || default_fee_rate > Decimal::ONE {
            return Err(ConfigError::Invalid {
                key: "DEFAULT_FEE_RATE",
                reason: "must be between 0 and 1".to_string(),
            });
        }

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
        let production = lookup("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        Ok(Self {
            database_url,
            db_max_connections,
            bind_addr,
            jwt_secret,
            card_encryption_secret,
            default_fee_rate,
            cors_allowed_origins,
            production,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: String) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    lookup(key)
        .unwrap_or(default)
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/marquee".to_string()),
            ("JWT_SECRET", "j".repeat(32)),
            ("CARD_ENCRYPTION_SECRET", "c".repeat(32)),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&base()).unwrap();

        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.bind_addr.port(), 3001);
        assert_eq!(config.default_fee_rate, Decimal::new(10, 2));
        assert_eq!(config.cors_allowed_origins.len(), 2);
        assert!(!config.production);
    }

    #[test]
    fn test_missing_required_value() {
        let mut vars = base();
        vars.remove("DATABASE_URL");

        assert!(matches!(
            load(&vars),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    fn test_short_secrets_are_rejected() {
        let mut vars = base();
        vars.insert("CARD_ENCRYPTION_SECRET", "short".to_string());

        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid {
                key: "CARD_ENCRYPTION_SECRET",
                ..
            })
        ));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let mut vars = base();
        vars.insert("DB_MAX_CONNECTIONS", "12".to_string());
        vars.insert("DEFAULT_FEE_RATE", "0.0825".to_string());
        vars.insert("RUST_ENV", "Production".to_string());
        vars.insert("CORS_ALLOWED_ORIGINS", "https://tickets.example, ".to_string());

        let config = load(&vars).unwrap();

        assert_eq!(config.db_max_connections, 12);
        assert_eq!(config.default_fee_rate, Decimal::new(825, 4));
        assert!(config.production);
        assert_eq!(config.cors_allowed_origins, vec!["https://tickets.example"]);
    }

    #[test]
    fn test_bad_numbers_are_reported() {
        let mut vars = base();
        vars.insert("DEFAULT_FEE_RATE", "1.5".to_string());
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid {
                key: "DEFAULT_FEE_RATE",
                ..
            })
        ));

        let mut vars = base();
        vars.insert("BIND_ADDR", "nowhere".to_string());
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { key: "BIND_ADDR", .. })
        ));
    }
}
