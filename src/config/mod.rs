use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Errors that prevent the process from starting
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub environment: Environment,
    pub log_level: String,
    pub backend: BackendConfig,
    pub security: SecurityConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Staging,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Connection details for the hosted backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: Url,
    /// Public key, used for client-facing auth calls
    pub public_key: String,
    /// Privileged key, used for every server-side table operation
    pub service_key: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub shutdown_grace: Duration,
}

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_JWT_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup (the environment in production, maps in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut missing = Vec::new();
        let mut required = |key: &'static str| {
            let value = get(key);
            if value.is_none() {
                missing.push(key);
            }
            value.unwrap_or_default()
        };

        let backend_url = required("SUPABASE_URL");
        let public_key = required("SUPABASE_KEY");
        let service_key = required("SUPABASE_SERVICE_KEY");
        let jwt_secret = required("JWT_SECRET");

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let url = parse_backend_url(&backend_url)?;

        let port = get("PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let environment = get("ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Development);
        let log_level = get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        let jwt_expiry = get("JWT_EXPIRY")
            .and_then(|v| parse_duration(&v))
            .filter(|d| !d.is_zero())
            .unwrap_or(DEFAULT_JWT_EXPIRY);
        let request_timeout = get("BACKEND_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_BACKEND_TIMEOUT_SECS);
        let shutdown_grace = get("SHUTDOWN_GRACE_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS);

        Ok(Self {
            port,
            environment,
            log_level,
            backend: BackendConfig {
                url,
                public_key,
                service_key,
                request_timeout: Duration::from_secs(request_timeout),
            },
            security: SecurityConfig {
                jwt_secret,
                jwt_expiry,
            },
            server: ServerConfig {
                shutdown_grace: Duration::from_secs(shutdown_grace),
            },
        })
    }
}

fn parse_backend_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        key: "SUPABASE_URL",
        message: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            key: "SUPABASE_URL",
            message: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    Ok(url)
}

/// Parse duration text such as `90s`, `30m`, `24h`, `1h30m` or `500ms`
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut total = Duration::ZERO;
    let mut rest = text;

    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let amount: u64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let part = match unit {
            "ms" => Duration::from_millis(amount),
            "s" => Duration::from_secs(amount),
            "m" => Duration::from_secs(amount.checked_mul(60)?),
            "h" => Duration::from_secs(amount.checked_mul(60 * 60)?),
            _ => return None,
        };
        total = total.checked_add(part)?;
    }

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("SUPABASE_URL", "https://project.supabase.co"),
        ("SUPABASE_KEY", "anon-key"),
        ("SUPABASE_SERVICE_KEY", "service-key"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn test_defaults_with_required_values() {
        let config = AppConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.security.jwt_expiry, Duration::from_secs(86_400));
        assert_eq!(config.backend.request_timeout, Duration::from_secs(10));
        assert_eq!(config.server.shutdown_grace, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_required_values_are_all_reported() {
        let err = AppConfig::from_lookup(lookup_from(&[("SUPABASE_URL", "https://x.supabase.co")]))
            .unwrap_err();
        match err {
            ConfigError::Missing(keys) => {
                assert_eq!(keys, vec!["SUPABASE_KEY", "SUPABASE_SERVICE_KEY", "JWT_SECRET"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_required_value_counts_as_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs[3] = ("JWT_SECRET", "   ");
        let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(keys) if keys == vec!["JWT_SECRET"]));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("PORT", "9090"),
            ("ENV", "prod"),
            ("LOG_LEVEL", "debug"),
            ("JWT_EXPIRY", "1h30m"),
            ("BACKEND_TIMEOUT_SECS", "3"),
        ]);
        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.port, 9090);
        assert!(config.environment.is_production());
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.security.jwt_expiry, Duration::from_secs(5400));
        assert_eq!(config.backend.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_unparsable_optional_values_fall_back() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([("PORT", "eighty"), ("JWT_EXPIRY", "forever")]);
        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.security.jwt_expiry, DEFAULT_JWT_EXPIRY);
    }

    #[test]
    fn test_rejects_non_http_backend_url() {
        let mut pairs = REQUIRED.to_vec();
        pairs[0] = ("SUPABASE_URL", "ftp://project.supabase.co");
        let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SUPABASE_URL", .. }));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("30m"), Some(Duration::from_secs(1800)));
        assert_eq!(parse_duration("24h"), Some(Duration::from_secs(86_400)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("1h1m1s"), Some(Duration::from_secs(3661)));
        assert_eq!(parse_duration("h"), None);
        assert_eq!(parse_duration("10"), None);
        assert_eq!(parse_duration("10d"), None);
        assert_eq!(parse_duration(""), None);
    }
}
