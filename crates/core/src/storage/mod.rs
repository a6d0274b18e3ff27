//! File storage for payment proofs and branding assets, using Apache OpenDAL.
//!
//! Uploaded files are stored under a generated name
//! `<timestamp>_<uuid8>_<sanitized original name>` so two uploads of the same
//! file never collide. Supported backends:
//! - Local filesystem (default)
//! - S3-compatible: AWS S3, Cloudflare R2, MinIO
//! - In-process memory (tests)

mod config;
mod error;
mod store;

pub use config::{ALLOWED_EXTENSIONS, StorageConfig, StorageProvider};
pub use error::StorageError;
pub use store::{FileStore, StoredFile, sanitize_filename};
