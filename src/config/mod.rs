use once_cell::sync::Lazy;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: HostConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Connection settings for the host shop database.
///
/// Both values come from the environment; the tier defaults leave them unset
/// so a misconfigured deployment fails loudly instead of silently pointing
/// at a default.
#[derive(Clone)]
pub struct HostConfig {
    pub endpoint_url: Option<String>,
    pub access_key: Option<String>,
}

// The access key must never appear in logs, so no derived Debug here.
impl std::fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    /// Whether issued credential markers carry the Secure attribute.
    pub secure_markers: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Host database overrides
        if let Ok(v) = env::var("HOST_ENDPOINT_URL") {
            self.host.endpoint_url = Some(v);
        }
        if let Ok(v) = env::var("HOST_ACCESS_KEY") {
            self.host.access_key = Some(v);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs =
                v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_SECURE_MARKERS") {
            self.security.secure_markers = v.parse().unwrap_or(self.security.secure_markers);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            host: HostConfig {
                endpoint_url: None,
                access_key: None,
            },
            database: DatabaseConfig {
                max_connections: 10,
                acquire_timeout_secs: 30,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                secure_markers: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            host: HostConfig {
                endpoint_url: None,
                access_key: None,
            },
            database: DatabaseConfig {
                max_connections: 20,
                acquire_timeout_secs: 10,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                secure_markers: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            host: HostConfig {
                endpoint_url: None,
                access_key: None,
            },
            database: DatabaseConfig {
                max_connections: 50,
                acquire_timeout_secs: 5,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                secure_markers: true,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

// Helper macro for common checks
#[macro_export]
macro_rules! is_development {
    () => {
        matches!(
            $crate::config::CONFIG.environment,
            $crate::config::Environment::Development
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(!config.security.secure_markers);
        assert_eq!(config.database.max_connections, 10);
        assert!(config.host.endpoint_url.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.secure_markers);
        assert_eq!(config.database.max_connections, 50);
        assert!(config.host.endpoint_url.is_none());
    }

    #[test]
    fn test_host_config_debug_redacts_access_key() {
        let host = HostConfig {
            endpoint_url: Some("postgres://pos@db.example.com:5432/host".to_string()),
            access_key: Some("super-secret".to_string()),
        };
        let rendered = format!("{:?}", host);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("***"));
    }
}
