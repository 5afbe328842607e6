//! End-to-end tests for the vault session.
//!
//! These drive the full pipeline through [`ImageVault`]: upload with tier
//! transcoding, format conversion with the silent quality downgrade,
//! snapshot subscriptions, deletion and reopening a persisted library.

mod common;

use image_vault::error::{AdmissionError, VaultError};
use image_vault::model::{self, ImageFormat, QualityTier};
use image_vault::store::{FileBlobStore, MemoryBlobStore};
use image_vault::{ImageVault, VaultConfig};

fn memory_vault(config: VaultConfig) -> ImageVault<MemoryBlobStore> {
    ImageVault::new(config, MemoryBlobStore::new(MemoryBlobStore::DEFAULT_CAPACITY))
}

#[tokio::test]
async fn test_upload_medium_tier() {
    let vault = memory_vault(VaultConfig::default());
    vault.init().await.unwrap();

    let png = common::gradient_png(320, 200);
    let record = vault
        .upload(&png, "scenery.png", "image/png", QualityTier::Medium)
        .await
        .unwrap();

    assert_eq!(record.name, "scenery.png");
    assert_eq!(record.mime_type, "image/jpeg");
    assert_eq!(record.quality_tier, QualityTier::Medium);
    assert_eq!(record.original_size, png.len() as u64);

    // stored_size matches the payload actually held in the data URI
    let payload = model::decode_data_uri(&record.encoded_data).unwrap();
    assert_eq!(record.stored_size, payload.len() as u64);

    let records = vault.list().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, record.id);

    let fetched = vault.get_by_id(&record.id).await.unwrap();
    assert_eq!(fetched.encoded_data, record.encoded_data);
}

#[tokio::test]
async fn test_oversized_payload_rejected_before_decoding() {
    let vault = memory_vault(VaultConfig::default());
    vault.init().await.unwrap();

    // Not a valid image. A decode would fail with a codec error, so getting
    // TooLarge proves the size bound is enforced first.
    let garbage = vec![0u8; 6 * 1024 * 1024];
    let err = vault
        .upload(&garbage, "garbage.bin", "image/png", QualityTier::Optimized)
        .await
        .unwrap_err();

    match err {
        VaultError::Admission(AdmissionError::TooLarge { size, limit }) => {
            assert_eq!(size, garbage.len());
            assert_eq!(limit, 5 * 1024 * 1024);
        }
        other => panic!("expected TooLarge, got {other:?}"),
    }
    assert!(vault.list().await.is_empty());
}

#[tokio::test]
async fn test_subscription_sees_admissions() {
    let vault = memory_vault(VaultConfig::default());
    vault.init().await.unwrap();
    let mut rx = vault.subscribe();
    rx.mark_unchanged();

    let png = common::gradient_png(64, 64);
    let record = vault
        .upload(&png, "sub.png", "image/png", QualityTier::Low)
        .await
        .unwrap();

    rx.changed().await.unwrap();
    let snapshot = rx.borrow_and_update();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, record.id);
}

#[tokio::test]
async fn test_convert_record_renames_and_stores_copy() {
    let vault = memory_vault(VaultConfig::default());
    vault.init().await.unwrap();

    let png = common::gradient_png(200, 120);
    let source = vault
        .upload(&png, "photo.png", "image/png", QualityTier::Original)
        .await
        .unwrap();

    let converted = vault
        .convert_record(&source.id, ImageFormat::Jpeg)
        .await
        .unwrap();

    assert_eq!(converted.name, "photo-converted.jpg");
    assert_eq!(converted.mime_type, "image/jpeg");
    assert_eq!(converted.quality_tier, QualityTier::Original);
    assert_ne!(converted.id, source.id);
    assert_eq!(vault.list().await.len(), 2);
}

#[tokio::test]
async fn test_convert_unknown_id() {
    let vault = memory_vault(VaultConfig::default());
    vault.init().await.unwrap();

    let err = vault
        .convert_record("12345", ImageFormat::Png)
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::RecordNotFound { .. }));
}

#[tokio::test]
async fn test_conversion_downgrades_silently_under_tight_ceiling() {
    // Ceiling small enough that a native-resolution JPEG of noise cannot
    // fit, forcing the ceiling-driven retry.
    let config = VaultConfig::new(5, 100 * 1024);
    let vault = memory_vault(config);
    vault.init().await.unwrap();

    let png = common::noisy_png(512, 512);
    let record = vault
        .convert_bytes(&png, "noise.png", "image/png", ImageFormat::Jpeg)
        .await
        .unwrap();

    // Admitted on retry with the downgrade marker, and it actually fits.
    assert_eq!(record.quality_tier, QualityTier::Medium);
    assert_eq!(record.name, "noise-converted.jpg");
    assert!(record.stored_size < 100 * 1024);
    assert_eq!(vault.list().await.len(), 1);
}

#[tokio::test]
async fn test_delete_then_lookup() {
    let vault = memory_vault(VaultConfig::default());
    vault.init().await.unwrap();

    let png = common::gradient_png(64, 64);
    let record = vault
        .upload(&png, "gone.png", "image/png", QualityTier::Optimized)
        .await
        .unwrap();

    vault.delete(&record.id).await.unwrap();
    assert!(vault.get_by_id(&record.id).await.is_none());
    assert!(vault.list().await.is_empty());

    // Deleting again is a no-op.
    vault.delete(&record.id).await.unwrap();
}

#[tokio::test]
async fn test_library_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.json");
    let png = common::gradient_png(100, 100);

    let stored = {
        let vault = ImageVault::new(VaultConfig::default(), FileBlobStore::new(&path));
        vault.init().await.unwrap();
        let record = vault
            .upload(&png, "keeper.png", "image/png", QualityTier::Optimized)
            .await
            .unwrap();
        vault.dispose();
        record
    };

    let vault = ImageVault::new(VaultConfig::default(), FileBlobStore::new(&path));
    vault.init().await.unwrap();

    let records = vault.list().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, stored.id);
    assert_eq!(records[0].encoded_data, stored.encoded_data);
    assert_eq!(records[0].created_at, stored.created_at);
}
