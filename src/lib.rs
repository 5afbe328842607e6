//! # Image Vault Library
//!
//! A quota-aware image ingestion library: uploads are transcoded to a
//! requested quality tier, converted between container formats on demand,
//! and persisted as a single JSON collection that never grows past a
//! configured storage ceiling.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `codec`: Decode/encode seam over the `image` codecs with SIMD resizing
//! - `processing`: Quality-tier transcoding and format conversion pipelines
//! - `store`: Quota-aware persistence with pre-flight admission checks
//! - `config`: Configuration management and validation
//! - `session`: High-level vault orchestration
//!
//! ## Features
//!
//! - **Pre-flight admission**: A record is serialized and measured against
//!   the storage ceiling before anything touches the persisted blob
//! - **Adaptive transcoding**: Bounded quality/scale search that fits a
//!   payload under a byte ceiling
//! - **Snapshot subscriptions**: Collaborators observe complete, consistent
//!   collection snapshots over a watch channel
//! - **Async/await**: Built on Tokio
//!
//! ## Example
//!
//! ```rust,no_run
//! use image_vault::{ImageVault, MemoryBlobStore, QualityTier, VaultConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = VaultConfig::default();
//! let blob = MemoryBlobStore::new(MemoryBlobStore::DEFAULT_CAPACITY);
//! let vault = ImageVault::new(config, blob);
//! vault.init().await?;
//!
//! let bytes = std::fs::read("photo.jpg")?;
//! let record = vault
//!     .upload(&bytes, "photo.jpg", "image/jpeg", QualityTier::Optimized)
//!     .await?;
//! println!("stored {} ({} bytes)", record.name, record.stored_size);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod processing;
pub mod session;
pub mod store;

/// Re-export error types for convenience
pub use error::{AdmissionError, CodecError, ConversionError, LoadError, VaultError, VaultResult};

/// Re-export the types most callers need
pub use config::VaultConfig;
pub use model::{ImageFormat, QualityTier, StoredImageRecord};
pub use session::ImageVault;
pub use store::{BlobStore, FileBlobStore, ImageStore, MemoryBlobStore};
