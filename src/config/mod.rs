use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub store: StoreConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Upper bound applied to explicit query limits
    pub max_limit: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

/// Hosted store endpoint. Object storage and public URLs hang off `url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub url: String,
    #[serde(skip_serializing)]
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
    /// Most signed-in profiles held by the profile cache at once
    pub profile_cache_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub session_secret: String,
    pub session_expiry_hours: u64,
    pub session_cookie: String,
    pub secure_cookies: bool,
    pub password_memory_kib: u32,
    pub password_iterations: u32,
}

impl AppConfig {
    /// Build the configuration from the process environment.
    ///
    /// `DATABASE_URL`, `STORE_URL`, `STORE_KEY` and `SESSION_SECRET` are
    /// required; the caller should treat an error here as fatal.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let mut config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()?;

        config.database.url = required("DATABASE_URL")?;
        config.store.url = required("STORE_URL")?;
        config.store.key = required("STORE_KEY")?;
        config.security.session_secret = required("SESSION_SECRET")?;

        url::Url::parse(&config.store.url).map_err(|_| ConfigError::Invalid {
            name: "STORE_URL",
            value: config.store.url.clone(),
        })?;

        Ok(config)
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // API overrides
        if let Some(v) = env::var("SHOWCASE_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = parse_var("PORT", &v)?;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_PROFILE_CACHE_CAPACITY") {
            self.api.profile_cache_capacity = parse_var("API_PROFILE_CACHE_CAPACITY", &v)?;
        }

        // Filter overrides
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().ok();
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("SECURITY_SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours = parse_var("SECURITY_SESSION_EXPIRY_HOURS", &v)?;
        }
        if let Ok(v) = env::var("SECURITY_SESSION_COOKIE") {
            if !v.trim().is_empty() {
                self.security.session_cookie = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("SECURITY_SECURE_COOKIES") {
            self.security.secure_cookies = v.parse().unwrap_or(self.security.secure_cookies);
        }
        if let Ok(v) = env::var("SECURITY_PASSWORD_MEMORY_KIB") {
            self.security.password_memory_kib = parse_var("SECURITY_PASSWORD_MEMORY_KIB", &v)?;
        }
        if let Ok(v) = env::var("SECURITY_PASSWORD_ITERATIONS") {
            self.security.password_iterations = parse_var("SECURITY_PASSWORD_ITERATIONS", &v)?;
        }

        Ok(self)
    }

    /// Development defaults with empty connection settings and secrets.
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            filter: FilterConfig {
                max_limit: Some(1000),
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 10,
                connection_timeout: 30,
            },
            store: StoreConfig {
                url: String::new(),
                key: String::new(),
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                profile_cache_capacity: 1000,
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                session_secret: String::new(),
                session_expiry_hours: 24 * 7, // 1 week
                session_cookie: "showcase-session".to_string(),
                secure_cookies: false,
                password_memory_kib: 19 * 1024,
                password_iterations: 2,
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.filter.max_limit = Some(500);
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.api.max_request_size_bytes = 5 * 1024 * 1024; // 5MB
        config.security.cors_origins = vec!["https://staging.example.com".to_string()];
        config.security.session_expiry_hours = 24;
        config.security.secure_cookies = true;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.filter.max_limit = Some(100);
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.api.enable_request_logging = false;
        config.api.max_request_size_bytes = 5 * 1024 * 1024; // banners and avatars
        config.api.profile_cache_capacity = 10_000;
        config.security.cors_origins = vec!["https://app.example.com".to_string()];
        config.security.session_expiry_hours = 24;
        config.security.secure_cookies = true;
        config.security.password_memory_kib = 64 * 1024;
        config.security.password_iterations = 3;
        config
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.filter.max_limit, Some(1000));
        assert!(!config.security.secure_cookies);
        assert_eq!(config.security.session_cookie, "showcase-session");
        assert!(config.api.enable_request_logging);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.filter.max_limit, Some(100));
        assert!(config.security.secure_cookies);
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn parse_var_reports_the_offending_value() {
        let err = parse_var::<u16>("PORT", "eighty").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
        assert_eq!(parse_var::<u16>("PORT", " 8080 ").unwrap(), 8080);
    }

    #[test]
    fn secrets_are_not_serialized() {
        let mut config = AppConfig::development();
        config.store.key = "service-key".to_string();
        config.security.session_secret = "signing-secret".to_string();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("service-key"));
        assert!(!json.contains("signing-secret"));
    }
}
