//! File store backed by an OpenDAL operator.

use chrono::Utc;
use opendal::{ErrorKind, Operator, services};
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// A file accepted by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Generated storage name, used for later reads.
    pub name: String,
    /// Name the client uploaded.
    pub original_name: String,
    /// Size in bytes.
    pub size: u64,
}

/// File store for payment proofs and branding assets.
#[derive(Clone)]
pub struct FileStore {
    operator: Operator,
    config: StorageConfig,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("provider", &self.config.provider.name())
            .field("max_file_size", &self.config.max_file_size)
            .finish_non_exhaustive()
    }
}

impl FileStore {
    /// Create a file store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// An in-memory store with the default limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory backend cannot be initialized.
    pub fn memory() -> Result<Self, StorageError> {
        Self::from_config(StorageConfig::new(StorageProvider::Memory))
    }

    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::S3 {
                bucket,
                region,
                endpoint,
                access_key_id,
                secret_access_key,
                root,
            } => {
                let mut builder = services::S3::default()
                    .bucket(bucket)
                    .region(region)
                    .root(root);
                if let Some(endpoint) = endpoint {
                    builder = builder.endpoint(endpoint);
                }
                if let Some(key) = access_key_id {
                    builder = builder.access_key_id(key);
                }
                if let Some(secret) = secret_access_key {
                    builder = builder.secret_access_key(secret);
                }
                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?;
                Operator::new(services::Fs::default().root(root))
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish(),
        };
        Ok(operator)
    }

    /// Checks an upload against the size limit and the extension allow-list.
    ///
    /// # Errors
    ///
    /// Returns `EmptyFile`, `FileTooLarge` or `DisallowedExtension`.
    pub fn validate_upload(&self, filename: &str, size: u64) -> Result<(), StorageError> {
        if size == 0 {
            return Err(StorageError::EmptyFile);
        }
        if size > self.config.max_file_size {
            return Err(StorageError::FileTooLarge {
                size,
                max: self.config.max_file_size,
            });
        }
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_default();
        if !StorageConfig::is_extension_allowed(extension) {
            return Err(StorageError::DisallowedExtension {
                extension: extension.to_ascii_lowercase(),
            });
        }
        Ok(())
    }

    /// Generates the storage name for an upload:
    /// `<timestamp>_<uuid8>_<sanitized name>`.
    #[must_use]
    pub fn generate_name(original_name: &str) -> String {
        let id = Uuid::new_v4().simple().to_string();
        format!(
            "{}_{}_{}",
            Utc::now().format("%Y%m%d%H%M%S%3f"),
            &id[..8],
            sanitize_filename(original_name)
        )
    }

    /// Validates and stores an upload under a freshly generated name.
    ///
    /// # Errors
    ///
    /// Returns a validation error or the backend failure.
    pub async fn save(&self, original_name: &str, bytes: Vec<u8>) -> Result<StoredFile, StorageError> {
        let size = bytes.len() as u64;
        self.validate_upload(original_name, size)?;

        let name = Self::generate_name(original_name);
        self.operator.write(&name, bytes).await?;
        tracing::debug!(name = %name, size, "stored file");

        Ok(StoredFile {
            name,
            original_name: original_name.to_string(),
            size,
        })
    }

    /// Reads a stored file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for names that could escape the store root and
    /// `NotFound` for unknown names.
    pub async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        check_name(name)?;
        match self.operator.read(name).await {
            Ok(buffer) => Ok(buffer.to_vec()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::not_found(name)),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes a stored file, returning false when it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        check_name(name)?;
        match self.operator.stat(name).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        }
        self.operator.delete(name).await?;
        Ok(true)
    }

    /// Check if a file exists in storage.
    pub async fn exists(&self, name: &str) -> bool {
        if check_name(name).is_err() {
            return false;
        }
        self.operator.stat(name).await.is_ok()
    }

    /// Get the storage provider name.
    #[must_use]
    pub const fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Largest accepted upload in bytes.
    #[must_use]
    pub const fn max_file_size(&self) -> u64 {
        self.config.max_file_size
    }
}

/// Sanitize filename for storage key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn check_name(name: &str) -> Result<(), StorageError> {
    let safe = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_');
    if safe {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("invoice.pdf"), "invoice.pdf");
        assert_eq!(sanitize_filename("my file (1).pdf"), "my_file__1_.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
    }

    #[test]
    fn test_generated_name_shape() {
        let name = FileStore::generate_name("proof of payment.png");
        let parts: Vec<&str> = name.splitn(3, '_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 17);
        assert!(parts[0].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2], "proof_of_payment.png");
    }

    #[test]
    fn test_validate_upload() {
        let store = FileStore::from_config(
            StorageConfig::new(StorageProvider::Memory).with_max_file_size(1024),
        )
        .unwrap();

        assert!(store.validate_upload("receipt.pdf", 512).is_ok());
        assert!(matches!(
            store.validate_upload("receipt.pdf", 2048),
            Err(StorageError::FileTooLarge { size: 2048, max: 1024 })
        ));
        assert!(matches!(
            store.validate_upload("receipt.pdf", 0),
            Err(StorageError::EmptyFile)
        ));
        assert!(matches!(
            store.validate_upload("script.exe", 10),
            Err(StorageError::DisallowedExtension { .. })
        ));
        assert!(matches!(
            store.validate_upload("no_extension", 10),
            Err(StorageError::DisallowedExtension { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_read_delete() {
        let store = FileStore::memory().unwrap();

        let stored = store.save("logo.png", vec![1, 2, 3]).await.unwrap();
        assert_eq!(stored.size, 3);
        assert!(stored.name.ends_with("_logo.png"));
        assert!(store.exists(&stored.name).await);

        assert_eq!(store.read(&stored.name).await.unwrap(), vec![1, 2, 3]);

        assert!(store.delete(&stored.name).await.unwrap());
        assert!(!store.exists(&stored.name).await);
        assert!(!store.delete(&stored.name).await.unwrap());
        assert!(matches!(
            store.read(&stored.name).await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_same_file_twice_gets_distinct_names() {
        let store = FileStore::memory().unwrap();
        let a = store.save("proof.pdf", vec![1]).await.unwrap();
        let b = store.save("proof.pdf", vec![2]).await.unwrap();
        assert_ne!(a.name, b.name);
    }

    #[tokio::test]
    async fn test_traversal_names_rejected() {
        let store = FileStore::memory().unwrap();
        assert!(matches!(
            store.read("../secret.pdf").await,
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.read("a/b.pdf").await,
            Err(StorageError::InvalidKey(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_sanitized_filename_safe_chars(filename in ".*") {
            let sanitized = sanitize_filename(&filename);
            for c in sanitized.chars() {
                let is_safe = c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_';
                prop_assert!(is_safe, "Unexpected character in sanitized filename: {}", c);
            }
        }
    }
}
