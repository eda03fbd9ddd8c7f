//! Process configuration, loaded once at startup.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_TOKEN_LIFETIME: &str = "24h";
pub const DEFAULT_ADAPTER_TIMEOUT_MS: u64 = 5_000;
pub const MIN_RECOMMENDED_SECRET_LEN: usize = 32;

const DEV_SECRET: &str = "storegate-development-secret-do-not-deploy";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set (set STOREGATE_ENV=development to use an insecure dev secret)")]
    MissingSecret,

    #[error("invalid JWT_EXPIRES_IN '{0}': expected <n>[s|m|h|d]")]
    InvalidLifetime(String),

    #[error("invalid ADAPTER_TIMEOUT_MS '{0}'")]
    InvalidTimeout(String),

    #[error("invalid bind address: {0}")]
    InvalidBindAddr(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Clone)]
pub struct GatewayConfig {
    pub environment: Environment,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_lifetime: chrono::Duration,
    pub adapter_timeout: Duration,
}

impl core::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("environment", &self.environment)
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("token_lifetime", &self.token_lifetime)
            .field("adapter_timeout", &self.adapter_timeout)
            .finish()
    }
}

/// Parse `<n>[s|m|h|d]`; a bare number is seconds.
pub fn parse_lifetime(raw: &str) -> Result<chrono::Duration, ConfigError> {
    let invalid = || ConfigError::InvalidLifetime(raw.to_string());
    let trimmed = raw.trim();

    let (digits, unit) = match trimmed.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&trimmed[..idx], c.to_ascii_lowercase()),
        Some(_) => (trimmed, 's'),
        None => return Err(invalid()),
    };
    let n: i64 = digits.parse().map_err(|_| invalid())?;
    if n <= 0 {
        return Err(invalid());
    }

    let lifetime = match unit {
        's' => chrono::Duration::try_seconds(n),
        'm' => chrono::Duration::try_minutes(n),
        'h' => chrono::Duration::try_hours(n),
        'd' => chrono::Duration::try_days(n),
        _ => None,
    };
    lifetime.ok_or_else(invalid)
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (the process environment in
    /// production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = match lookup("STOREGATE_ENV").as_deref().map(str::trim) {
            Some("development") | Some("dev") => Environment::Development,
            _ => Environment::Production,
        };

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(secret) => {
                if secret.len() < MIN_RECOMMENDED_SECRET_LEN {
                    tracing::warn!(
                        min_len = MIN_RECOMMENDED_SECRET_LEN,
                        "JWT_SECRET is shorter than recommended"
                    );
                }
                secret
            }
            None if environment == Environment::Development => {
                tracing::warn!("JWT_SECRET not set; using insecure development secret");
                DEV_SECRET.to_string()
            }
            None => return Err(ConfigError::MissingSecret),
        };

        let token_lifetime = parse_lifetime(
            &lookup("JWT_EXPIRES_IN").unwrap_or_else(|| DEFAULT_TOKEN_LIFETIME.to_string()),
        )?;

        let adapter_timeout = match lookup("ADAPTER_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .ok_or(ConfigError::InvalidTimeout(raw))?,
            None => Duration::from_millis(DEFAULT_ADAPTER_TIMEOUT_MS),
        };

        let ip: IpAddr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0".to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidBindAddr(e.to_string()))?;
        let port: u16 = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddr(format!("port '{raw}'")))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            environment,
            bind_addr: SocketAddr::new(ip, port),
            jwt_secret,
            token_lifetime,
            adapter_timeout,
        })
    }

    /// Development defaults with an explicit secret (tests, local runs).
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            environment: Environment::Development,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            jwt_secret: secret.into(),
            token_lifetime: chrono::Duration::hours(24),
            adapter_timeout: Duration::from_millis(DEFAULT_ADAPTER_TIMEOUT_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn lifetimes() {
        assert_eq!(parse_lifetime("24h").unwrap(), chrono::Duration::hours(24));
        assert_eq!(parse_lifetime("30m").unwrap(), chrono::Duration::minutes(30));
        assert_eq!(parse_lifetime("7d").unwrap(), chrono::Duration::days(7));
        assert_eq!(parse_lifetime("90").unwrap(), chrono::Duration::seconds(90));
        assert!(parse_lifetime("").is_err());
        assert!(parse_lifetime("-1h").is_err());
        assert!(parse_lifetime("5w").is_err());
    }

    #[test]
    fn secret_is_required_outside_development() {
        let err = GatewayConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingSecret);

        let dev = GatewayConfig::from_lookup(lookup(&[("STOREGATE_ENV", "development")])).unwrap();
        assert_eq!(dev.environment, Environment::Development);
        assert!(!dev.jwt_secret.is_empty());
    }

    #[test]
    fn values_are_read_from_the_source() {
        let cfg = GatewayConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("JWT_EXPIRES_IN", "2h"),
            ("ADAPTER_TIMEOUT_MS", "250"),
            ("PORT", "8081"),
        ]))
        .unwrap();

        assert_eq!(cfg.environment, Environment::Production);
        assert_eq!(cfg.token_lifetime, chrono::Duration::hours(2));
        assert_eq!(cfg.adapter_timeout, Duration::from_millis(250));
        assert_eq!(cfg.bind_addr.port(), 8081);
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let cfg = GatewayConfig::with_secret("super-secret-value");
        assert!(!format!("{cfg:?}").contains("super-secret-value"));
    }
}
