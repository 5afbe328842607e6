//! Vault configuration.
//!
//! Two knobs matter: the input file size bound enforced at the upload
//! boundary before any decode (`max_file_size_mb`, overridable through the
//! `MAX_FILE_SIZE_MB` environment variable) and the serialized-collection
//! safety ceiling the store checks before writing (`storage_ceiling_bytes`).
//! The two are deliberately distinct: the first bounds what we are willing
//! to decode, the second bounds what we are willing to persist.

use crate::store::DEFAULT_STORAGE_CEILING_BYTES;

/// Default bound on input file size, in MiB.
pub const DEFAULT_MAX_FILE_SIZE_MB: usize = 5;

/// Environment variable overriding [`VaultConfig::max_file_size_mb`].
pub const MAX_FILE_SIZE_ENV: &str = "MAX_FILE_SIZE_MB";

#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Maximum accepted input file size in MiB, checked before decoding.
    pub max_file_size_mb: usize,
    /// Safety threshold for the serialized record collection, strictly
    /// below the backing store's true capacity.
    pub storage_ceiling_bytes: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            storage_ceiling_bytes: DEFAULT_STORAGE_CEILING_BYTES,
        }
    }
}

impl VaultConfig {
    pub fn new(max_file_size_mb: usize, storage_ceiling_bytes: usize) -> Self {
        Self {
            max_file_size_mb,
            storage_ceiling_bytes,
        }
    }

    /// Defaults, with `MAX_FILE_SIZE_MB` honored when set and parseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(MAX_FILE_SIZE_ENV) {
            if let Ok(mb) = raw.trim().parse::<usize>() {
                config.max_file_size_mb = mb;
            }
        }
        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_file_size_mb == 0 {
            return Err("max file size must be greater than 0 MB".to_string());
        }
        if self.storage_ceiling_bytes == 0 {
            return Err("storage ceiling must be greater than 0 bytes".to_string());
        }
        Ok(())
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }
}
