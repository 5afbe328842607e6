//! Error taxonomy for the vault.
//!
//! Codec and conversion failures are terminal for the operation that hit
//! them: the transcoder's repeated attempts are a search, not error-driven
//! retry. Admission errors always leave the store in the last successfully
//! persisted state. Every kind maps cleanly to a single human-readable
//! message for the caller; the library itself does no presentation.

use std::error::Error as StdError;
use std::fmt;

use crate::model::ImageFormat;

/// Platform codec failure: malformed input or an encoder fault.
#[derive(Debug)]
pub enum CodecError {
    /// The byte payload could not be decoded as a raster image.
    Decode { reason: String },
    /// Encoding failed, including non-positive target dimensions.
    Encode { reason: String },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Decode { reason } => write!(f, "image decode failed: {}", reason),
            CodecError::Encode { reason } => write!(f, "image encode failed: {}", reason),
        }
    }
}

impl StdError for CodecError {}

/// A codec failure during format conversion, with the original cause.
#[derive(Debug)]
pub struct ConversionError {
    pub format: ImageFormat,
    pub source: CodecError,
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conversion to {} failed: {}", self.format, self.source)
    }
}

impl StdError for ConversionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

/// Why a candidate record was not admitted into the store.
#[derive(Debug)]
pub enum AdmissionError {
    /// The pre-flight size check exceeded the safety threshold; nothing was
    /// written. Also reported for inputs over the upload size bound, where
    /// `limit` is the configured file size limit.
    TooLarge { size: usize, limit: usize },
    /// The backing store's actual quota was hit despite pre-flight passing;
    /// the in-memory append was rolled back.
    StorageFull { attempted: usize, capacity: usize },
    /// Any other storage-layer failure; the in-memory change was rolled back.
    StorageFault { reason: String },
}

impl fmt::Display for AdmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionError::TooLarge { size, limit } => write!(
                f,
                "payload of {} bytes exceeds the {} byte limit",
                size, limit
            ),
            AdmissionError::StorageFull {
                attempted,
                capacity,
            } => write!(
                f,
                "storage quota exceeded writing {} bytes (capacity {})",
                attempted, capacity
            ),
            AdmissionError::StorageFault { reason } => {
                write!(f, "storage failure: {}", reason)
            }
        }
    }
}

impl StdError for AdmissionError {}

/// Startup deserialization failure. The collection resets to empty and the
/// existing blob is left untouched so a human can still recover it.
#[derive(Debug)]
pub enum LoadError {
    /// The blob could not be read from the backing store.
    Unreadable { reason: String },
    /// The blob was read but did not parse as a record collection.
    Corrupt { reason: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Unreadable { reason } => {
                write!(f, "failed to read persisted images: {}", reason)
            }
            LoadError::Corrupt { reason } => {
                write!(f, "persisted images are corrupt: {}", reason)
            }
        }
    }
}

impl StdError for LoadError {}

/// Top-level error type for the collaborator-facing surface.
#[derive(Debug)]
pub enum VaultError {
    Codec(CodecError),
    Conversion(ConversionError),
    Admission(AdmissionError),
    Load(LoadError),
    RecordNotFound { id: String },
}

impl fmt::Display for VaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultError::Codec(e) => e.fmt(f),
            VaultError::Conversion(e) => e.fmt(f),
            VaultError::Admission(e) => e.fmt(f),
            VaultError::Load(e) => e.fmt(f),
            VaultError::RecordNotFound { id } => write!(f, "no stored image with id {}", id),
        }
    }
}

impl StdError for VaultError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            VaultError::Codec(e) => Some(e),
            VaultError::Conversion(e) => Some(e),
            VaultError::Admission(e) => Some(e),
            VaultError::Load(e) => Some(e),
            VaultError::RecordNotFound { .. } => None,
        }
    }
}

impl From<CodecError> for VaultError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

impl From<ConversionError> for VaultError {
    fn from(e: ConversionError) -> Self {
        Self::Conversion(e)
    }
}

impl From<AdmissionError> for VaultError {
    fn from(e: AdmissionError) -> Self {
        Self::Admission(e)
    }
}

impl From<LoadError> for VaultError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

/// Result type alias using the top-level error.
pub type VaultResult<T> = Result<T, VaultError>;
