//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Billing defaults.
    #[serde(default)]
    pub billing: BillingConfig,
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL. `memory` selects the in-process store.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl DatabaseConfig {
    /// Returns true when the in-process store should be used.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.url.eq_ignore_ascii_case("memory")
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in minutes.
    #[serde(default = "default_access_token_expires_minutes")]
    pub access_token_expires_minutes: i64,
}

fn default_access_token_expires_minutes() -> i64 {
    480 // one working day
}

/// Billing defaults used until business settings override them.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Flat tax rate applied to quote subtotals.
    #[serde(default = "default_tax_rate", with = "rust_decimal::serde::str")]
    pub tax_rate: Decimal,
    /// Days a quote stays valid after issue.
    #[serde(default = "default_quote_validity_days")]
    pub quote_validity_days: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            tax_rate: default_tax_rate(),
            quote_validity_days: default_quote_validity_days(),
        }
    }
}

fn default_tax_rate() -> Decimal {
    Decimal::new(7, 2)
}

fn default_quote_validity_days() -> u32 {
    15
}

/// File storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend: `fs`, `s3` or `memory`.
    #[serde(default = "default_storage_provider")]
    pub provider: String,
    /// Root directory (fs) or key prefix (s3).
    #[serde(default = "default_storage_root")]
    pub root: String,
    /// Bucket name (s3).
    #[serde(default)]
    pub bucket: Option<String>,
    /// Region (s3).
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint (s3-compatible services).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Access key id (s3).
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Secret access key (s3).
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Largest accepted upload in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: default_storage_provider(),
            root: default_storage_root(),
            bucket: None,
            region: None,
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_storage_provider() -> String {
    "fs".to_string()
}

fn default_storage_root() -> String {
    "uploads".to_string()
}

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}

/// CORS configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// `pretty` (default) or `json`.
    #[serde(default)]
    pub format: Option<String>,
}

impl LoggingConfig {
    /// Returns true when log lines should be emitted as JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
