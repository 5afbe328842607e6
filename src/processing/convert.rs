//! Container format conversion.
//!
//! Most targets are a single encode at native resolution with a default
//! quality of 0.9. GIF is the exception: its encoder produces badly
//! oversized output at native resolution, so the converter caps the longest
//! dimension at 300 px and drops the default quality to 0.7 *before*
//! encoding, trading fidelity for a deterministic worst case instead of
//! discovering the overage afterwards.
//!
//! The original size reported alongside a conversion is derived from the
//! text-safe source length (`ceil(len * 3 / 4)` for base64, data-URI prefix
//! included), because the true source byte length is not independently
//! tracked on this path. The estimate runs a few bytes high and is
//! documented as an estimate wherever it surfaces.

use crate::codec::{self, SourceImage};
use crate::error::{CodecError, ConversionError};
use crate::model::{self, ImageFormat};
use crate::processing::transcode::{self, EncodedCandidate};

const DEFAULT_QUALITY: f32 = 0.9;
const GIF_QUALITY: f32 = 0.7;
const GIF_MAX_DIMENSION: u32 = 300;

/// Outcome of a conversion: the new payload plus both size figures the
/// caller needs for its percent-saved arithmetic.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub bytes: Vec<u8>,
    /// Base64-length-derived estimate of the source payload size.
    pub original_size_estimate: u64,
    pub converted_size: u64,
    pub format: ImageFormat,
    pub mime_type: String,
}

/// Convert a data-URI payload to `target`, encoding once.
pub async fn convert(
    data_uri: &str,
    target: ImageFormat,
) -> Result<ConversionResult, ConversionError> {
    let image = decode_source(data_uri, target).await?;
    let (width, height, quality) = plan_encode(&image, target);

    let bytes = codec::encode(&image, target, quality, width, height)
        .await
        .map_err(|source| ConversionError {
            format: target,
            source,
        })?;

    Ok(build_result(bytes, data_uri.len(), target))
}

/// Convert a data-URI payload to `target`, searching for an encoding that
/// fits under `ceiling_bytes` via the adaptive transcoder.
pub async fn convert_with_ceiling(
    data_uri: &str,
    target: ImageFormat,
    ceiling_bytes: usize,
) -> Result<ConversionResult, ConversionError> {
    let image = decode_source(data_uri, target).await?;
    let EncodedCandidate { bytes, .. } =
        transcode::reduce_to_byte_ceiling(&image, target, ceiling_bytes)
            .await
            .map_err(|source| ConversionError {
                format: target,
                source,
            })?;

    Ok(build_result(bytes, data_uri.len(), target))
}

async fn decode_source(data_uri: &str, target: ImageFormat) -> Result<SourceImage, ConversionError> {
    let bytes = model::decode_data_uri(data_uri).map_err(|e| ConversionError {
        format: target,
        source: CodecError::Decode {
            reason: format!("invalid base64 payload: {}", e),
        },
    })?;
    codec::decode(&bytes).await.map_err(|source| ConversionError {
        format: target,
        source,
    })
}

/// Target dimensions and quality for a straight conversion.
fn plan_encode(image: &SourceImage, target: ImageFormat) -> (u32, u32, f32) {
    let (w, h) = (image.width(), image.height());
    match target {
        ImageFormat::Gif => {
            let longest = w.max(h);
            if longest > GIF_MAX_DIMENSION {
                let scale = GIF_MAX_DIMENSION as f32 / longest as f32;
                let w = ((w as f32 * scale).floor() as u32).max(1);
                let h = ((h as f32 * scale).floor() as u32).max(1);
                (w, h, GIF_QUALITY)
            } else {
                (w, h, GIF_QUALITY)
            }
        }
        _ => (w, h, DEFAULT_QUALITY),
    }
}

fn build_result(bytes: Vec<u8>, source_text_len: usize, target: ImageFormat) -> ConversionResult {
    ConversionResult {
        original_size_estimate: model::estimate_bytes_from_base64_len(source_text_len),
        converted_size: bytes.len() as u64,
        bytes,
        format: target,
        mime_type: target.mime_type().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_data_uri(w: u32, h: u32) -> String {
        let pixels = image::RgbaImage::from_fn(w, h, |x, y| {
            image::Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 99, 255])
        });
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(pixels)
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        model::encode_data_uri("image/png", &out)
    }

    #[tokio::test]
    async fn test_convert_to_jpeg() {
        let uri = gradient_data_uri(60, 40);
        let result = convert(&uri, ImageFormat::Jpeg).await.unwrap();
        assert_eq!(result.mime_type, "image/jpeg");
        assert_eq!(result.converted_size, result.bytes.len() as u64);
        let decoded = crate::codec::decode(&result.bytes).await.unwrap();
        assert_eq!((decoded.width(), decoded.height()), (60, 40));
    }

    #[tokio::test]
    async fn test_size_estimate_from_text_length() {
        let uri = gradient_data_uri(16, 16);
        let result = convert(&uri, ImageFormat::Png).await.unwrap();
        assert_eq!(
            result.original_size_estimate,
            model::estimate_bytes_from_base64_len(uri.len())
        );
    }

    #[tokio::test]
    async fn test_gif_caps_longest_dimension() {
        let uri = gradient_data_uri(600, 300);
        let result = convert(&uri, ImageFormat::Gif).await.unwrap();
        let decoded = crate::codec::decode(&result.bytes).await.unwrap();
        assert_eq!(decoded.width(), 300);
        assert_eq!(decoded.height(), 150);
    }

    #[tokio::test]
    async fn test_small_gif_keeps_native_size() {
        let uri = gradient_data_uri(120, 80);
        let result = convert(&uri, ImageFormat::Gif).await.unwrap();
        let decoded = crate::codec::decode(&result.bytes).await.unwrap();
        assert_eq!((decoded.width(), decoded.height()), (120, 80));
    }

    #[tokio::test]
    async fn test_bad_payload_carries_cause() {
        let err = convert("data:image/png;base64,!!!!", ImageFormat::Jpeg)
            .await
            .unwrap_err();
        assert!(matches!(err.source, CodecError::Decode { .. }));
        assert_eq!(err.format, ImageFormat::Jpeg);
    }
}
