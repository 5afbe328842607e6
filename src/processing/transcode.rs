//! Adaptive transcoder.
//!
//! Two entry points: [`reduce_to_quality_tier`] performs at most one encode
//! at a fixed quality factor, and [`reduce_to_byte_ceiling`] runs a bounded
//! search over (quality, scale) pairs until the encoded size fits under a
//! byte ceiling or the attempt budget runs out.
//!
//! The ceiling search is monotonic-effort, not monotonic-result: quality and
//! scale never increase once lowered, but a later attempt is not guaranteed
//! smaller than an earlier one, so every round decides on the actual encoded
//! byte length rather than an estimate. Re-encoding is the only lever
//! available here, which keeps the search space intentionally small: fixed
//! step sizes and a fixed attempt cap favor predictability over optimality.

use crate::codec::{self, SourceImage};
use crate::error::CodecError;
use crate::model::{ImageFormat, QualityTier};

/// Attempt budget for the ceiling search.
pub const MAX_ATTEMPTS: u32 = 5;

const START_QUALITY: f32 = 0.8;
const QUALITY_STEP: f32 = 0.15;
const QUALITY_FLOOR: f32 = 0.1;
const SCALE_STEP: f32 = 0.8;

/// Output of one encode attempt, carrying the settings that produced it.
#[derive(Debug, Clone)]
pub struct EncodedCandidate {
    pub bytes: Vec<u8>,
    pub quality: f32,
    pub scale: f32,
    pub width: u32,
    pub height: u32,
}

impl EncodedCandidate {
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

/// Result of a quality-tier reduction, sized against the source payload.
#[derive(Debug, Clone)]
pub struct ReducedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub original_size: u64,
    pub reduced_size: u64,
    pub quality_tier: QualityTier,
    pub compression_ratio: f64,
}

/// Reduce a payload to a nominal quality tier.
///
/// `original` is a byte-for-byte passthrough that never decodes. Every
/// other tier decodes once and produces a single JPEG encode at the image's
/// native dimensions; `source_mime` survives only on the passthrough path.
pub async fn reduce_to_quality_tier(
    bytes: &[u8],
    source_mime: &str,
    tier: QualityTier,
) -> Result<ReducedImage, CodecError> {
    let Some(quality) = tier.quality_factor() else {
        return Ok(ReducedImage {
            bytes: bytes.to_vec(),
            mime_type: source_mime.to_string(),
            original_size: bytes.len() as u64,
            reduced_size: bytes.len() as u64,
            quality_tier: tier,
            compression_ratio: 1.0,
        });
    };

    let image = codec::decode(bytes).await?;
    let encoded = codec::encode(
        &image,
        ImageFormat::Jpeg,
        quality,
        image.width(),
        image.height(),
    )
    .await?;

    let compression_ratio = encoded.len() as f64 / bytes.len() as f64;
    Ok(ReducedImage {
        reduced_size: encoded.len() as u64,
        bytes: encoded,
        mime_type: ImageFormat::Jpeg.mime_type().to_string(),
        original_size: bytes.len() as u64,
        quality_tier: tier,
        compression_ratio,
    })
}

/// Search for an encoding of `image` that fits under `ceiling_bytes`.
///
/// Starts at quality 0.8 and scale 1.0. Each unsuccessful attempt lowers
/// quality by 0.15 (floor 0.1); after the second unsuccessful attempt the
/// scale is additionally multiplied by 0.8 on every subsequent attempt.
/// Returns as soon as a candidate fits, or the last candidate produced once
/// the attempt budget is exhausted, even if it is still over the ceiling.
/// The caller decides whether an over-ceiling result is acceptable.
pub async fn reduce_to_byte_ceiling(
    image: &SourceImage,
    format: ImageFormat,
    ceiling_bytes: usize,
) -> Result<EncodedCandidate, CodecError> {
    let mut quality = START_QUALITY;
    let mut scale = 1.0f32;
    let mut attempts = 0u32;

    loop {
        if attempts > 0 {
            quality = (quality - QUALITY_STEP).max(QUALITY_FLOOR);
            if attempts > 2 {
                scale *= SCALE_STEP;
            }
        }

        let width = ((image.width() as f32 * scale).floor() as u32).max(1);
        let height = ((image.height() as f32 * scale).floor() as u32).max(1);
        let bytes = codec::encode(image, format, quality, width, height).await?;
        attempts += 1;

        if bytes.len() <= ceiling_bytes || attempts >= MAX_ATTEMPTS {
            return Ok(EncodedCandidate {
                bytes,
                quality,
                scale,
                width,
                height,
            });
        }
    }
}
