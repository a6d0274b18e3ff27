//! Storage configuration types.

use std::path::PathBuf;

use tally_shared::config::StorageSettings;

use super::error::StorageError;

/// File extensions accepted for upload (lowercase, without the dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "pdf", "doc", "docx", "xls", "xlsx",
];

/// Storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// S3-compatible storage.
    S3 {
        /// Bucket name.
        bucket: String,
        /// Region.
        region: String,
        /// Custom endpoint for S3-compatible services.
        endpoint: Option<String>,
        /// Access key id. Falls back to the ambient credential chain.
        access_key_id: Option<String>,
        /// Secret access key.
        secret_access_key: Option<String>,
        /// Key prefix inside the bucket.
        root: String,
    },
    /// Local filesystem.
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// In-process memory, lost on restart.
    Memory,
}

impl StorageProvider {
    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "fs",
            Self::Memory => "memory",
        }
    }
}

/// File store configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Backend.
    pub provider: StorageProvider,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
}

impl StorageConfig {
    /// Default max file size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

    /// Create a config with the default size limit.
    #[must_use]
    pub const fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Set maximum file size.
    #[must_use]
    pub const fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Builds the config from the `[storage]` settings section.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Configuration` for an unknown provider or an
    /// S3 provider without a bucket.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let provider = match settings.provider.to_ascii_lowercase().as_str() {
            "fs" | "local" => StorageProvider::local_fs(&settings.root),
            "memory" => StorageProvider::Memory,
            "s3" => StorageProvider::S3 {
                bucket: settings
                    .bucket
                    .clone()
                    .ok_or_else(|| StorageError::configuration("s3 storage requires a bucket"))?,
                region: settings
                    .region
                    .clone()
                    .unwrap_or_else(|| "us-east-1".to_string()),
                endpoint: settings.endpoint.clone(),
                access_key_id: settings.access_key_id.clone(),
                secret_access_key: settings.secret_access_key.clone(),
                root: settings.root.clone(),
            },
            other => {
                return Err(StorageError::configuration(format!(
                    "unknown storage provider '{other}'"
                )));
            }
        };
        Ok(Self::new(provider).with_max_file_size(settings.max_upload_bytes))
    }

    /// Check if a file extension is accepted.
    #[must_use]
    pub fn is_extension_allowed(extension: &str) -> bool {
        let lowered = extension.to_ascii_lowercase();
        ALLOWED_EXTENSIONS.contains(&lowered.as_str())
    }
}
