//! Backing byte stores for the persisted record blob.
//!
//! A [`BlobStore`] holds exactly one value: the serialized record
//! collection. The write is all-or-nothing and the store may enforce a hard
//! capacity it never announces up front, so callers must treat
//! [`BlobError::QuotaExceeded`] as a normal outcome rather than a fault.

use async_trait::async_trait;
use std::error::Error as StdError;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;

/// Failure writing or reading the single persisted blob.
#[derive(Debug)]
pub enum BlobError {
    /// The write exceeded the store's hard capacity. Nothing was replaced.
    QuotaExceeded { attempted: usize, capacity: usize },
    Io(std::io::Error),
}

impl fmt::Display for BlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobError::QuotaExceeded {
                attempted,
                capacity,
            } => write!(
                f,
                "blob of {} bytes exceeds store capacity of {} bytes",
                attempted, capacity
            ),
            BlobError::Io(e) => write!(f, "blob I/O error: {}", e),
        }
    }
}

impl StdError for BlobError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            BlobError::Io(e) => Some(e),
            BlobError::QuotaExceeded { .. } => None,
        }
    }
}

impl From<std::io::Error> for BlobError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Single-slot byte store behind the quota-aware record collection.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the current blob, `None` if nothing was ever written.
    async fn read(&self) -> Result<Option<Vec<u8>>, BlobError>;

    /// Replace the blob atomically. On error the previous value survives.
    async fn write(&mut self, bytes: &[u8]) -> Result<(), BlobError>;
}

/// File-backed blob store. Writes go to a temporary file in the same
/// directory and are renamed into place, so a failed write never clobbers
/// the previous blob.
pub struct FileBlobStore {
    path: PathBuf,
}

impl FileBlobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn read(&self) -> Result<Option<Vec<u8>>, BlobError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BlobError::Io(e)),
        }
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), BlobError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&dir).await?;

        // Blob payloads stay under a few MiB, small enough to write inline.
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| BlobError::Io(e.error))?;
        Ok(())
    }
}

/// In-memory blob store with a hard capacity, modelling the platform
/// key-value store's unannounced quota (typically around 5 MiB).
pub struct MemoryBlobStore {
    capacity: usize,
    data: Option<Vec<u8>>,
}

impl MemoryBlobStore {
    /// Conventional capacity of the platform store this type stands in for.
    pub const DEFAULT_CAPACITY: usize = 5 * 1024 * 1024;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            data: None,
        }
    }

    /// Seed the store with pre-existing blob contents.
    pub fn with_contents(capacity: usize, data: Vec<u8>) -> Self {
        Self {
            capacity,
            data: Some(data),
        }
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self) -> Result<Option<Vec<u8>>, BlobError> {
        Ok(self.data.clone())
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), BlobError> {
        if bytes.len() > self.capacity {
            return Err(BlobError::QuotaExceeded {
                attempted: bytes.len(),
                capacity: self.capacity,
            });
        }
        self.data = Some(bytes.to_vec());
        Ok(())
    }
}
