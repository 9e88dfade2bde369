//! Server Configuration
//!
//! Read once at startup. Feature crates receive the typed configs built here
//! and never look at the environment themselves.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use auth::{AuthConfig, AuthResult};
use points::PointsConfig;
use thiserror::Error;

const MIN_TOKEN_SECRET_BYTES: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// サーバー設定（環境変数から構築）
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    pub password_pepper: Vec<u8>,
    pub access_token_secret: Vec<u8>,
    pub refresh_token_secret: Vec<u8>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub cookie_secure: bool,
    pub store_timeout: Duration,
    pub archive_interval: Duration,
    pub archive_months_threshold: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let access_token_secret = env.secret("ACCESS_TOKEN_SECRET")?;
        let refresh_token_secret = env.secret("REFRESH_TOKEN_SECRET")?;
        if access_token_secret == refresh_token_secret {
            return Err(ConfigError::Invalid {
                name: "REFRESH_TOKEN_SECRET",
                reason: "must differ from ACCESS_TOKEN_SECRET".to_string(),
            });
        }

        let archive_months_threshold: u32 = env.parse_or("ARCHIVE_MONTHS_THRESHOLD", 6)?;
        if archive_months_threshold == 0 {
            return Err(ConfigError::Invalid {
                name: "ARCHIVE_MONTHS_THRESHOLD",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            database_url: env.required("DATABASE_URL")?,
            database_max_connections: env.parse_or("DATABASE_MAX_CONNECTIONS", 5)?,
            bind_addr: env.parse_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 31113)))?,
            frontend_origins: env
                .optional("FRONTEND_ORIGINS")
                .unwrap_or_else(|| "http://localhost:40922,http://127.0.0.1:40922".to_string())
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            password_pepper: env.required("PASSWORD_PEPPER")?.into_bytes(),
            access_token_secret,
            refresh_token_secret,
            access_token_ttl: Duration::from_secs(env.parse_or("ACCESS_TOKEN_TTL_SECS", 900)?),
            refresh_token_ttl: Duration::from_secs(
                env.parse_or("REFRESH_TOKEN_TTL_SECS", 604_800)?,
            ),
            cookie_secure: env.parse_or("COOKIE_SECURE", true)?,
            store_timeout: Duration::from_millis(env.parse_or("STORE_TIMEOUT_MS", 5_000)?),
            archive_interval: Duration::from_secs(env.parse_or("ARCHIVE_INTERVAL_SECS", 86_400)?),
            archive_months_threshold,
        })
    }

    pub fn auth_config(&self) -> AuthResult<AuthConfig> {
        let config = AuthConfig::from_secrets(
            &self.password_pepper,
            &self.access_token_secret,
            self.access_token_ttl,
            &self.refresh_token_secret,
            self.refresh_token_ttl,
        )?;
        Ok(if self.cookie_secure {
            config
        } else {
            config.with_insecure_cookie()
        })
    }

    pub fn points_config(&self) -> PointsConfig {
        PointsConfig {
            store_timeout: self.store_timeout,
            archive_interval: self.archive_interval,
            archive_months_threshold: self.archive_months_threshold,
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_max_connections", &self.database_max_connections)
            .field("bind_addr", &self.bind_addr)
            .field("frontend_origins", &self.frontend_origins)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("cookie_secure", &self.cookie_secure)
            .field("store_timeout", &self.store_timeout)
            .field("archive_interval", &self.archive_interval)
            .field("archive_months_threshold", &self.archive_months_threshold)
            .finish_non_exhaustive()
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &'static str) -> Option<String> {
        (self.0)(name).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn secret(&self, name: &'static str) -> Result<Vec<u8>, ConfigError> {
        let value = self.required(name)?.into_bytes();
        if value.len() < MIN_TOKEN_SECRET_BYTES {
            return Err(ConfigError::Invalid {
                name,
                reason: format!("must be at least {MIN_TOKEN_SECRET_BYTES} bytes"),
            });
        }
        Ok(value)
    }

    fn parse_or<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.optional(name) {
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/minimart".to_string()),
            ("PASSWORD_PEPPER", "pepper-for-config-tests-0123".to_string()),
            ("ACCESS_TOKEN_SECRET", "a".repeat(32)),
            ("REFRESH_TOKEN_SECRET", "r".repeat(40)),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&base()).unwrap();

        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.bind_addr, "0.0.0.0:31113".parse().unwrap());
        assert_eq!(config.access_token_ttl, Duration::from_secs(900));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(604_800));
        assert!(config.cookie_secure);
        assert_eq!(config.store_timeout, Duration::from_millis(5_000));
        assert_eq!(config.archive_interval, Duration::from_secs(86_400));
        assert_eq!(config.archive_months_threshold, 6);
        assert_eq!(config.frontend_origins.len(), 2);
        assert!(config.auth_config().is_ok());
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let mut vars = base();
        vars.remove("PASSWORD_PEPPER");
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Missing("PASSWORD_PEPPER")
        );

        let mut vars = base();
        vars.insert("ACCESS_TOKEN_SECRET", "   ".to_string());
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Missing("ACCESS_TOKEN_SECRET")
        );
    }

    #[test]
    fn test_weak_or_shared_token_secrets_are_rejected() {
        let mut vars = base();
        vars.insert("ACCESS_TOKEN_SECRET", "short".to_string());
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid {
                name: "ACCESS_TOKEN_SECRET",
                ..
            })
        ));

        let mut vars = base();
        vars.insert("REFRESH_TOKEN_SECRET", "a".repeat(32));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid {
                name: "REFRESH_TOKEN_SECRET",
                ..
            })
        ));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let mut vars = base();
        vars.insert("COOKIE_SECURE", "false".to_string());
        vars.insert("STORE_TIMEOUT_MS", "250".to_string());
        vars.insert("FRONTEND_ORIGINS", "https://minimart.example".to_string());
        let config = load(&vars).unwrap();

        assert!(!config.cookie_secure);
        assert_eq!(config.store_timeout, Duration::from_millis(250));
        assert_eq!(config.frontend_origins, vec!["https://minimart.example"]);
        assert!(!config.auth_config().unwrap().cookie_secure);

        vars.insert("ARCHIVE_MONTHS_THRESHOLD", "0".to_string());
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid {
                name: "ARCHIVE_MONTHS_THRESHOLD",
                ..
            })
        ));

        vars.insert("ARCHIVE_MONTHS_THRESHOLD", "soon".to_string());
        assert!(load(&vars).is_err());
    }
}
