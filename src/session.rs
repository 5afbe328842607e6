//! High-level vault session.
//!
//! [`ImageVault`] owns the quota-aware store and exposes the surface a UI
//! collaborator consumes: upload, convert, list, subscribe, delete and
//! point lookup. It is an explicitly constructed object handed to whoever
//! needs it, with an `init`/`dispose` lifecycle instead of global wiring.
//!
//! Mutations are serialized behind a single-writer lock: the store's
//! check-then-write admission protocol is not safe under interleaving, so
//! no second admission begins while one is in flight.

use tokio::sync::{watch, Mutex};

use crate::config::VaultConfig;
use crate::error::{AdmissionError, CodecError, LoadError, VaultError, VaultResult};
use crate::model::{self, ImageFormat, QualityTier, StoredImageRecord};
use crate::processing::{convert, transcode};
use crate::store::{BlobStore, ImageStore, NewRecord};

/// Serialized-record overhead assumed when budgeting a re-encode: field
/// names, id, timestamp and the data-URI prefix.
const RECORD_OVERHEAD_BYTES: usize = 512;

pub struct ImageVault<B: BlobStore> {
    store: Mutex<ImageStore<B>>,
    snapshots: watch::Receiver<Vec<StoredImageRecord>>,
    config: VaultConfig,
}

impl<B: BlobStore> ImageVault<B> {
    /// Build a vault over `blob`. Call [`ImageVault::init`] before use.
    pub fn new(config: VaultConfig, blob: B) -> Self {
        let (store, snapshots) = ImageStore::new(blob, config.storage_ceiling_bytes);
        Self {
            store: Mutex::new(store),
            snapshots,
            config,
        }
    }

    /// Load the persisted collection. On failure the vault stays usable
    /// with an empty collection and the persisted blob is left untouched.
    pub async fn init(&self) -> Result<(), LoadError> {
        self.store.lock().await.load().await
    }

    /// Drop the vault, closing the snapshot channel for all subscribers.
    pub fn dispose(self) {}

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Upload a raw image payload at the requested quality tier.
    ///
    /// Payloads over the configured file size bound are rejected before any
    /// decode is attempted; that bound is distinct from the post-transcode
    /// storage ceiling the admission check enforces.
    pub async fn upload(
        &self,
        bytes: &[u8],
        filename: &str,
        mime_type: &str,
        tier: QualityTier,
    ) -> VaultResult<StoredImageRecord> {
        let limit = self.config.max_file_size_bytes();
        if bytes.len() > limit {
            return Err(AdmissionError::TooLarge {
                size: bytes.len(),
                limit,
            }
            .into());
        }
        if bytes.is_empty() {
            return Err(CodecError::Decode {
                reason: "empty input payload".to_string(),
            }
            .into());
        }

        let reduced = transcode::reduce_to_quality_tier(bytes, mime_type, tier).await?;
        let record = NewRecord {
            name: filename.to_string(),
            encoded_data: model::encode_data_uri(&reduced.mime_type, &reduced.bytes),
            mime_type: reduced.mime_type,
            original_size: reduced.original_size,
            stored_size: reduced.reduced_size,
            quality_tier: tier,
            compression_ratio: reduced.compression_ratio,
        };

        Ok(self.store.lock().await.admit(record).await?)
    }

    /// Convert a stored record to another container format and admit the
    /// result as a new record.
    pub async fn convert_record(
        &self,
        id: &str,
        target: ImageFormat,
    ) -> VaultResult<StoredImageRecord> {
        let source = self
            .get_by_id(id)
            .await
            .ok_or_else(|| VaultError::RecordNotFound { id: id.to_string() })?;
        self.convert_payload(&source.encoded_data, &source.name, target)
            .await
    }

    /// Convert a raw payload to another container format without storing
    /// the source itself.
    pub async fn convert_bytes(
        &self,
        bytes: &[u8],
        filename: &str,
        mime_type: &str,
        target: ImageFormat,
    ) -> VaultResult<StoredImageRecord> {
        let data_uri = model::encode_data_uri(mime_type, bytes);
        self.convert_payload(&data_uri, filename, target).await
    }

    /// Conversion pipeline shared by both entry points.
    ///
    /// The first attempt encodes at native resolution and is admitted with
    /// the `original` tier. If pre-flight rejects it, the conversion is
    /// silently retried through the byte-ceiling search and admitted with
    /// the literal `medium` marker, whatever quality the search actually
    /// reached. Any other admission failure propagates unchanged.
    async fn convert_payload(
        &self,
        data_uri: &str,
        source_name: &str,
        target: ImageFormat,
    ) -> VaultResult<StoredImageRecord> {
        let result = convert::convert(data_uri, target).await?;
        let name = converted_filename(source_name, target);
        let record = conversion_record(&name, result, QualityTier::Original);

        let first = {
            let mut store = self.store.lock().await;
            store.admit(record).await
        };
        match first {
            Ok(record) => Ok(record),
            Err(AdmissionError::TooLarge { .. }) => {
                let ceiling = self.reencode_budget().await;
                let result = convert::convert_with_ceiling(data_uri, target, ceiling).await?;
                let record = conversion_record(&name, result, QualityTier::Medium);
                Ok(self.store.lock().await.admit(record).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read-only copy of the current collection.
    pub async fn list(&self) -> Vec<StoredImageRecord> {
        self.store.lock().await.snapshot()
    }

    /// Push-style subscription to snapshot changes. Each published value is
    /// a complete, consistent collection; subscribers never see a torn one.
    pub fn subscribe(&self) -> watch::Receiver<Vec<StoredImageRecord>> {
        self.snapshots.clone()
    }

    pub async fn get_by_id(&self, id: &str) -> Option<StoredImageRecord> {
        self.store.lock().await.get_by_id(id).cloned()
    }

    /// Unconditional delete; absent ids are a no-op.
    pub async fn delete(&self, id: &str) -> VaultResult<()> {
        Ok(self.store.lock().await.delete(id).await?)
    }

    /// Raw-byte budget for a ceiling-driven re-encode: the storage ceiling
    /// minus what the collection already occupies, discounted by the 4/3
    /// base64 expansion the stored payload will undergo.
    async fn reencode_budget(&self) -> usize {
        let used = self.store.lock().await.serialized_len();
        self.config
            .storage_ceiling_bytes
            .saturating_sub(used + RECORD_OVERHEAD_BYTES)
            .saturating_mul(3)
            / 4
    }
}

/// Rewrite a filename for a converted copy: strip the extension, append
/// the `-converted` marker and the target format's extension.
fn converted_filename(original: &str, target: ImageFormat) -> String {
    let stem = match original.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => original,
    };
    format!("{}-converted.{}", stem, target.extension())
}

fn conversion_record(
    name: &str,
    result: convert::ConversionResult,
    tier: QualityTier,
) -> NewRecord {
    let compression_ratio = if result.original_size_estimate > 0 {
        result.converted_size as f64 / result.original_size_estimate as f64
    } else {
        1.0
    };
    NewRecord {
        name: name.to_string(),
        encoded_data: model::encode_data_uri(&result.mime_type, &result.bytes),
        mime_type: result.mime_type,
        original_size: result.original_size_estimate,
        stored_size: result.converted_size,
        quality_tier: tier,
        compression_ratio,
    }
}
