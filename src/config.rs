//! Configuration module
//!
//! Settings are read from a TOML file (default:
//! `~/.config/user-service/config.toml`). A missing file is not an error:
//! defaults apply and environment variables can still fill in the rest.
//!
//! Environment overrides (applied after the file):
//! - `APP_PORT`: REST API port
//! - `DATABASE_URL`: database connection URL
//! - `JWT_SECRET`: token signing secret

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default bcrypt work factor
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Errors that prevent the service from starting
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("Token signing secret is not configured (set security.jwt_secret or JWT_SECRET)")]
    MissingSigningSecret,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Default config path: `<config_dir>/user-service/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("user-service")
        .join("config.toml")
}

/// Application configuration (mirrors the TOML file layout)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub security: SecuritySection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// Connection URL, or `memory` for the non-persistent store
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite://./users.db?mode=rwc".to_string(),
            max_connections: 10,
            min_connections: 1,
        }
    }
}

impl DatabaseSection {
    pub fn is_memory(&self) -> bool {
        self.url.eq_ignore_ascii_case("memory")
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl std::fmt::Debug for SecuritySection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecuritySection")
            .field("jwt_secret", &"<redacted>")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// trace, debug, info, warn, error
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_toml(&raw)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("APP_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.database.url = url;
        }
        if let Some(secret) = lookup("JWT_SECRET").filter(|v| !v.is_empty()) {
            self.security.jwt_secret = secret;
        }
    }

    /// Startup checks; any failure here must stop the process.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingSigningSecret);
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "security.bcrypt_cost",
                message: format!("{} is outside 4..=31", self.security.bcrypt_cost),
            });
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "database.url",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn api_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.security.bcrypt_cost, 10);
        assert_eq!(cfg.logging.level, "info");
        assert!(!cfg.database.is_memory());
    }

    #[test]
    fn parses_partial_toml() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            port = 8080

            [security]
            jwt_secret = "file-secret"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.security.jwt_secret, "file-secret");
        assert_eq!(cfg.security.bcrypt_cost, DEFAULT_BCRYPT_COST);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn env_overrides_win_over_file() {
        let mut cfg = AppConfig::from_toml("[security]\njwt_secret = \"file\"").unwrap();
        cfg.apply_overrides(|key| match key {
            "APP_PORT" => Some("4000".to_string()),
            "JWT_SECRET" => Some("from-env".to_string()),
            "DATABASE_URL" => Some("memory".to_string()),
            _ => None,
        });

        assert_eq!(cfg.server.port, 4000);
        assert_eq!(cfg.security.jwt_secret, "from-env");
        assert!(cfg.database.is_memory());
    }

    #[test]
    fn empty_env_values_keep_file_settings() {
        let mut cfg = AppConfig::from_toml(
            "[security]\njwt_secret = \"file\"\n[database]\nurl = \"memory\"",
        )
        .unwrap();
        cfg.apply_overrides(|key| match key {
            "JWT_SECRET" | "DATABASE_URL" => Some(String::new()),
            _ => None,
        });

        assert_eq!(cfg.security.jwt_secret, "file");
        assert!(cfg.database.is_memory());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_secret_is_fatal() {
        let mut cfg = AppConfig::default();
        cfg.security.jwt_secret = "   ".to_string();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingSigningSecret)
        ));
    }

    #[test]
    fn bcrypt_cost_out_of_range_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.security.jwt_secret = "s".to_string();
        cfg.security.bcrypt_cost = 3;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn secret_is_redacted_in_debug_output() {
        let mut cfg = AppConfig::default();
        cfg.security.jwt_secret = "top-secret".to_string();
        let printed = format!("{:?}", cfg);
        assert!(!printed.contains("top-secret"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = AppConfig::load(Path::new("/nonexistent/user-service/config.toml")).unwrap();
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.server.shutdown_timeout, 30);
    }
}
