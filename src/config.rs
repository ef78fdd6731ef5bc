/// Configuration management for the Wisper server
use crate::error::{WisperError, WisperResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub rate_limit: RateLimitSettings,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub ledger_db: PathBuf,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub requests_per_minute: u32,
    pub burst_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> WisperResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("WISPER_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("WISPER_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|_| WisperError::Validation("Invalid port number".to_string()))?;
        let version = env::var("WISPER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());

        let data_directory: PathBuf = env::var("WISPER_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let ledger_db = env::var("WISPER_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("ledger.sqlite"));

        let rate_limit_enabled = env::var("WISPER_RATE_LIMITS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        let requests_per_minute = env::var("WISPER_RATE_LIMIT_REQUESTS_PER_MINUTE")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);
        let burst_size = env::var("WISPER_RATE_LIMIT_BURST_SIZE")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .unwrap_or(50);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            storage: StorageConfig {
                data_directory,
                ledger_db,
            },
            rate_limit: RateLimitSettings {
                enabled: rate_limit_enabled,
                requests_per_minute,
                burst_size,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> WisperResult<()> {
        if self.service.hostname.is_empty() {
            return Err(WisperError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.rate_limit.requests_per_minute == 0 {
            return Err(WisperError::Validation(
                "Rate limit must allow at least one request per minute".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 5000,
                version: "0.1.0".to_string(),
            },
            storage: StorageConfig {
                data_directory: "./data".into(),
                ledger_db: "./data/ledger.sqlite".into(),
            },
            rate_limit: RateLimitSettings {
                enabled: true,
                requests_per_minute: 3000,
                burst_size: 50,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_hostname() {
        let mut config = test_config();
        config.service.hostname = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_rate_limit() {
        let mut config = test_config();
        config.rate_limit.requests_per_minute = 0;
        assert!(config.validate().is_err());
    }
}
