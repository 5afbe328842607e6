//! Quota-aware record store.
//!
//! An ordered, insertion-order collection of [`StoredImageRecord`]s mirrored
//! into a single-slot [`BlobStore`] as one JSON array. The store owns
//! admission control: a candidate is serialized and measured against a
//! safety threshold strictly below the backing store's real capacity before
//! any write is attempted, and a write that still fails afterwards is rolled
//! back so the in-memory collection always matches the last successfully
//! persisted state.
//!
//! Every successful mutation publishes a fresh snapshot through a watch
//! channel before returning; readers never observe a record that failed
//! admission or a partially applied change.
//!
//! Admission and deletion take `&mut self`, so a shared store must sit
//! behind a single-writer lock. The check-then-write sequence is not safe
//! under interleaving.

pub mod blob;

pub use blob::{BlobError, BlobStore, FileBlobStore, MemoryBlobStore};

use chrono::Utc;
use tokio::sync::watch;

use crate::error::{AdmissionError, LoadError};
use crate::model::{QualityTier, StoredImageRecord};

/// Safety threshold for the serialized collection, set strictly below the
/// ~5 MiB capacity typical of the backing stores this crate targets.
pub const DEFAULT_STORAGE_CEILING_BYTES: usize = 4 * 1024 * 1024;

/// Candidate fields for admission. `id` and `created_at` are assigned by
/// the store at admission time.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub name: String,
    pub encoded_data: String,
    pub mime_type: String,
    pub original_size: u64,
    pub stored_size: u64,
    pub quality_tier: QualityTier,
    pub compression_ratio: f64,
}

pub struct ImageStore<B: BlobStore> {
    blob: B,
    ceiling_bytes: usize,
    records: Vec<StoredImageRecord>,
    snapshots: watch::Sender<Vec<StoredImageRecord>>,
    last_id: u64,
}

impl<B: BlobStore> ImageStore<B> {
    /// Create a store over `blob` with the given serialized-size ceiling.
    /// Returns the store and a receiver for published snapshots.
    pub fn new(blob: B, ceiling_bytes: usize) -> (Self, watch::Receiver<Vec<StoredImageRecord>>) {
        let (snapshots, rx) = watch::channel(Vec::new());
        (
            Self {
                blob,
                ceiling_bytes,
                records: Vec::new(),
                snapshots,
                last_id: 0,
            },
            rx,
        )
    }

    /// Deserialize the persisted blob.
    ///
    /// On read or parse failure the collection resets to empty and the
    /// error is surfaced, but the blob itself is left untouched: rewriting
    /// it here would destroy data a human might still recover manually.
    pub async fn load(&mut self) -> Result<(), LoadError> {
        let bytes = match self.blob.read().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                self.records.clear();
                self.publish();
                return Ok(());
            }
            Err(e) => {
                self.records.clear();
                self.publish();
                return Err(LoadError::Unreadable {
                    reason: e.to_string(),
                });
            }
        };

        match serde_json::from_slice::<Vec<StoredImageRecord>>(&bytes) {
            Ok(records) => {
                // Keep new ids ahead of anything already persisted.
                self.last_id = records
                    .iter()
                    .filter_map(|r| r.id.parse::<u64>().ok())
                    .max()
                    .unwrap_or(0);
                self.records = records;
                self.publish();
                Ok(())
            }
            Err(e) => {
                self.records.clear();
                self.publish();
                Err(LoadError::Corrupt {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Admit a candidate record.
    ///
    /// Pre-flight: the hypothetical post-admission collection is serialized
    /// and measured; over-ceiling candidates are rejected before any write.
    /// If the write itself fails the appended record is removed again
    /// (compensating rollback) before the error is reported. Success
    /// publishes the new snapshot and returns the created record.
    pub async fn admit(&mut self, fields: NewRecord) -> Result<StoredImageRecord, AdmissionError> {
        let record = StoredImageRecord {
            id: self.next_id(),
            name: fields.name,
            encoded_data: fields.encoded_data,
            mime_type: fields.mime_type,
            created_at: Utc::now(),
            original_size: fields.original_size,
            stored_size: fields.stored_size,
            quality_tier: fields.quality_tier,
            compression_ratio: fields.compression_ratio,
        };

        self.records.push(record.clone());
        let payload = match serde_json::to_vec(&self.records) {
            Ok(payload) => payload,
            Err(e) => {
                self.records.pop();
                return Err(AdmissionError::StorageFault {
                    reason: e.to_string(),
                });
            }
        };

        if payload.len() > self.ceiling_bytes {
            self.records.pop();
            return Err(AdmissionError::TooLarge {
                size: payload.len(),
                limit: self.ceiling_bytes,
            });
        }

        match self.blob.write(&payload).await {
            Ok(()) => {
                self.publish();
                Ok(record)
            }
            Err(BlobError::QuotaExceeded {
                attempted,
                capacity,
            }) => {
                self.records.pop();
                Err(AdmissionError::StorageFull {
                    attempted,
                    capacity,
                })
            }
            Err(e) => {
                self.records.pop();
                Err(AdmissionError::StorageFault {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Remove a record by id. Absent ids are a no-op, not an error. On a
    /// persist failure the removal is rolled back; deletion only ever
    /// reports the `Storage*` admission kinds.
    pub async fn delete(&mut self, id: &str) -> Result<(), AdmissionError> {
        let Some(position) = self.records.iter().position(|r| r.id == id) else {
            return Ok(());
        };
        let removed = self.records.remove(position);

        let payload = match serde_json::to_vec(&self.records) {
            Ok(payload) => payload,
            Err(e) => {
                self.records.insert(position, removed);
                return Err(AdmissionError::StorageFault {
                    reason: e.to_string(),
                });
            }
        };

        match self.blob.write(&payload).await {
            Ok(()) => {
                self.publish();
                Ok(())
            }
            Err(BlobError::QuotaExceeded {
                attempted,
                capacity,
            }) => {
                self.records.insert(position, removed);
                Err(AdmissionError::StorageFull {
                    attempted,
                    capacity,
                })
            }
            Err(e) => {
                self.records.insert(position, removed);
                Err(AdmissionError::StorageFault {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Point lookup, no side effects.
    pub fn get_by_id(&self, id: &str) -> Option<&StoredImageRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Read-only copy of the current collection, in insertion order.
    pub fn snapshot(&self) -> Vec<StoredImageRecord> {
        self.records.clone()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current serialized size of the collection.
    pub fn serialized_len(&self) -> usize {
        serde_json::to_vec(&self.records).map(|p| p.len()).unwrap_or(0)
    }

    pub fn ceiling_bytes(&self) -> usize {
        self.ceiling_bytes
    }

    /// Tear the store down, handing back the blob it was persisting to.
    pub fn into_blob(self) -> B {
        self.blob
    }

    /// Millisecond-timestamp ids, bumped past the last issued value so
    /// sequential admissions within one millisecond still get distinct ids.
    fn next_id(&mut self) -> String {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let id = now.max(self.last_id + 1);
        self.last_id = id;
        id.to_string()
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.records.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::encode_data_uri;

    fn candidate(name: &str, payload: &[u8]) -> NewRecord {
        NewRecord {
            name: name.to_string(),
            encoded_data: encode_data_uri("image/png", payload),
            mime_type: "image/png".to_string(),
            original_size: payload.len() as u64,
            stored_size: payload.len() as u64,
            quality_tier: QualityTier::Original,
            compression_ratio: 1.0,
        }
    }

    #[tokio::test]
    async fn test_ids_are_unique_and_increasing() {
        let (mut store, _rx) = ImageStore::new(MemoryBlobStore::default(), 1 << 20);
        let mut ids = Vec::new();
        for i in 0..10 {
            let record = store
                .admit(candidate(&format!("img-{i}.png"), b"xx"))
                .await
                .unwrap();
            ids.push(record.id.parse::<u64>().unwrap());
        }
        for pair in ids.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[tokio::test]
    async fn test_load_resumes_id_sequence() {
        let (mut store, _rx) = ImageStore::new(MemoryBlobStore::default(), 1 << 20);
        let first = store.admit(candidate("a.png", b"aa")).await.unwrap();
        let blob = store.blob.read().await.unwrap().unwrap();

        let seeded = MemoryBlobStore::with_contents(MemoryBlobStore::DEFAULT_CAPACITY, blob);
        let (mut reopened, _rx) = ImageStore::new(seeded, 1 << 20);
        reopened.load().await.unwrap();
        let second = reopened.admit(candidate("b.png", b"bb")).await.unwrap();
        assert!(second.id.parse::<u64>().unwrap() > first.id.parse::<u64>().unwrap());
    }

    #[tokio::test]
    async fn test_empty_blob_loads_empty() {
        let (mut store, rx) = ImageStore::new(MemoryBlobStore::default(), 1 << 20);
        store.load().await.unwrap();
        assert!(store.is_empty());
        assert!(rx.borrow().is_empty());
    }
}
