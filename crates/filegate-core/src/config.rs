//! Configuration module
//!
//! Settings are read from the process environment (a `.env` file is loaded
//! first when present) and validated once at startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::validation::UploadPolicy;

const SERVER_PORT: u16 = 8000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRY_MINUTES: i64 = 120;
const MAX_UPLOAD_SIZE_MB: u64 = 100;
const AUDIT_LOG_DEFAULT_LIMIT: i64 = 100;
const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Settings shared by every binary in the workspace
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expiry_minutes: i64,
    pub environment: String,
}

#[derive(Clone, Debug)]
pub struct FileGateConfig {
    pub base: BaseConfig,
    pub database_url: String,
    pub storage_root: PathBuf,
    pub max_upload_size_mb: u64,
    pub allowed_extensions: Vec<String>,
    pub audit_log_default_limit: i64,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config(pub Box<FileGateConfig>);

impl Config {
    fn inner(&self) -> &FileGateConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = FileGateConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn is_production(&self) -> bool {
        let environment = self.inner().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    /// Upper bound on a single blob read or write
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().base.db_timeout_seconds)
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn jwt_expiry_minutes(&self) -> i64 {
        self.inner().base.jwt_expiry_minutes
    }

    pub fn storage_root(&self) -> &PathBuf {
        &self.inner().storage_root
    }

    pub fn max_upload_size_bytes(&self) -> u64 {
        self.inner().max_upload_size_mb * 1024 * 1024
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.inner().allowed_extensions
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(
            self.max_upload_size_bytes(),
            self.inner().allowed_extensions.clone(),
        )
    }

    pub fn audit_log_default_limit(&self) -> i64 {
        self.inner().audit_log_default_limit
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }
}

impl FileGateConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let allowed_extensions = var("ALLOWED_EXTENSIONS")
            .unwrap_or_else(|| "xls,xlsx".to_string())
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: var("SERVER_PORT")
                .or_else(|| var("PORT"))
                .unwrap_or_else(|| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: var("DB_TIMEOUT_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: var("JWT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_expiry_minutes: var("JWT_EXPIRY_MINUTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(JWT_EXPIRY_MINUTES),
            environment,
        };

        let config = FileGateConfig {
            base,
            database_url: var("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage_root: PathBuf::from(
                var("STORAGE_ROOT").unwrap_or_else(|| "./storage".to_string()),
            ),
            max_upload_size_mb: var("MAX_UPLOAD_SIZE_MB")
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_UPLOAD_SIZE_MB),
            allowed_extensions,
            audit_log_default_limit: var("AUDIT_LOG_DEFAULT_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(AUDIT_LOG_DEFAULT_LIMIT),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            ));
        }

        if self.base.jwt_expiry_minutes <= 0 {
            return Err(anyhow::anyhow!("JWT_EXPIRY_MINUTES must be positive"));
        }

        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.base.db_max_connections == 0 || self.base.db_timeout_seconds == 0 {
            return Err(anyhow::anyhow!(
                "DB_MAX_CONNECTIONS and DB_TIMEOUT_SECONDS must be positive"
            ));
        }

        if self.max_upload_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be positive"));
        }

        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS must not be empty"));
        }

        if !(1..=1000).contains(&self.audit_log_default_limit) {
            return Err(anyhow::anyhow!(
                "AUDIT_LOG_DEFAULT_LIMIT must be between 1 and 1000"
            ));
        }

        let environment = self.base.environment.to_lowercase();
        let is_production = environment == "production" || environment == "prod";
        if is_production && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FileGateConfig::from_lookup(lookup(&[
            ("JWT_SECRET", SECRET),
            ("DATABASE_URL", "postgresql://localhost/filegate"),
        ]))
        .unwrap();
        let config = Config(Box::new(config));

        assert_eq!(config.server_port(), 8000);
        assert_eq!(config.jwt_expiry_minutes(), 120);
        assert_eq!(config.db_max_connections(), 10);
        assert_eq!(config.storage_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_upload_size_bytes(), 100 * 1024 * 1024);
        assert_eq!(config.allowed_extensions(), ["xls", "xlsx"]);
        assert_eq!(config.cors_origins(), ["*"]);
        assert_eq!(config.audit_log_default_limit(), 100);
        assert_eq!(config.storage_root(), &PathBuf::from("./storage"));
        assert!(!config.is_production());
    }

    #[test]
    fn test_missing_secret_fails() {
        let err = FileGateConfig::from_lookup(lookup(&[(
            "DATABASE_URL",
            "postgresql://localhost/filegate",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_short_secret_fails() {
        let err = FileGateConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "too-short"),
            ("DATABASE_URL", "postgresql://localhost/filegate"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_non_postgres_url_fails() {
        assert!(FileGateConfig::from_lookup(lookup(&[
            ("JWT_SECRET", SECRET),
            ("DATABASE_URL", "mysql://localhost/filegate"),
        ]))
        .is_err());
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        assert!(FileGateConfig::from_lookup(lookup(&[
            ("JWT_SECRET", SECRET),
            ("DATABASE_URL", "postgres://localhost/filegate"),
            ("ENVIRONMENT", "production"),
        ]))
        .is_err());

        let config = FileGateConfig::from_lookup(lookup(&[
            ("JWT_SECRET", SECRET),
            ("DATABASE_URL", "postgres://localhost/filegate"),
            ("ENVIRONMENT", "production"),
            ("CORS_ORIGINS", "https://files.example.com, https://admin.example.com"),
        ]))
        .unwrap();
        assert_eq!(config.base.cors_origins.len(), 2);
    }

    #[test]
    fn test_overrides_and_extension_normalization() {
        let config = FileGateConfig::from_lookup(lookup(&[
            ("JWT_SECRET", SECRET),
            ("DATABASE_URL", "postgres://localhost/filegate"),
            ("SERVER_PORT", "9000"),
            ("MAX_UPLOAD_SIZE_MB", "5"),
            ("ALLOWED_EXTENSIONS", ".XLSX, xlsm"),
            ("JWT_EXPIRY_MINUTES", "15"),
        ]))
        .unwrap();
        let config = Config(Box::new(config));

        assert_eq!(config.server_port(), 9000);
        assert_eq!(config.jwt_expiry_minutes(), 15);
        assert_eq!(config.allowed_extensions(), ["xlsx", "xlsm"]);
        assert_eq!(config.upload_policy().max_size_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_port_fails() {
        assert!(FileGateConfig::from_lookup(lookup(&[
            ("JWT_SECRET", SECRET),
            ("DATABASE_URL", "postgres://localhost/filegate"),
            ("SERVER_PORT", "eighty"),
        ]))
        .is_err());
    }
}
