//! Codec adapter wrapping the `image` crate's decode/encode primitives.
//!
//! Two operations: [`decode`] turns raw bytes into a [`SourceImage`], and
//! [`encode`] turns a [`SourceImage`] into container bytes at a requested
//! quality and size. Quality is a factor in `[0, 1]`; lossless encoders
//! (PNG, lossless WebP, GIF) ignore it rather than fail. Neither operation
//! has side effects beyond the returned buffers; decoded pixel buffers are
//! dropped on every exit path, including errors.

pub(crate) mod resize;

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::error::CodecError;
use crate::model::ImageFormat;

/// An ephemeral decoded image. Owned exclusively by the operation that
/// decoded it and dropped once encoding (or the transcoder search) finishes.
#[derive(Debug)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub(crate) fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Decode raw bytes into pixels, sniffing the container format.
pub async fn decode(bytes: &[u8]) -> Result<SourceImage, CodecError> {
    let dynamic = image::load_from_memory(bytes).map_err(|e| CodecError::Decode {
        reason: e.to_string(),
    })?;
    Ok(SourceImage {
        pixels: dynamic.to_rgba8(),
    })
}

/// Encode `image` into `format` at the given quality and target dimensions.
///
/// Off-native dimensions are resampled first. `quality` is clamped to
/// `[0, 1]` and mapped onto the JPEG encoder's 1-100 range; the other
/// formats encode losslessly and ignore it.
pub async fn encode(
    image: &SourceImage,
    format: ImageFormat,
    quality: f32,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, CodecError> {
    if width == 0 || height == 0 {
        return Err(CodecError::Encode {
            reason: format!("non-positive target dimensions {}x{}", width, height),
        });
    }

    let frame = resize::resize_rgba(image.pixels(), width, height)?;
    let mut out = Vec::new();

    match format {
        ImageFormat::Jpeg => {
            let q = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
            // JPEG has no alpha channel
            let rgb = image::DynamicImage::ImageRgba8(frame).to_rgb8();
            JpegEncoder::new_with_quality(&mut out, q)
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(encode_err)?;
        }
        ImageFormat::Png => {
            PngEncoder::new(&mut out)
                .write_image(frame.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(encode_err)?;
        }
        ImageFormat::Webp => {
            WebPEncoder::new_lossless(&mut out)
                .write_image(frame.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(encode_err)?;
        }
        ImageFormat::Gif => {
            let mut encoder = GifEncoder::new(&mut out);
            encoder
                .encode(frame.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(encode_err)?;
        }
    }

    Ok(out)
}

fn encode_err(e: image::ImageError) -> CodecError {
    CodecError::Encode {
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(w: u32, h: u32) -> SourceImage {
        let pixels = RgbaImage::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        });
        SourceImage { pixels }
    }

    #[tokio::test]
    async fn test_decode_rejects_garbage() {
        let err = decode(b"definitely not an image").await.unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_encode_decode_round_trip() {
        let img = checkerboard(20, 12);
        let png = encode(&img, ImageFormat::Png, 1.0, 20, 12).await.unwrap();
        let back = decode(&png).await.unwrap();
        assert_eq!((back.width(), back.height()), (20, 12));
    }

    #[tokio::test]
    async fn test_lossless_ignores_quality() {
        let img = checkerboard(16, 16);
        let at_full = encode(&img, ImageFormat::Png, 1.0, 16, 16).await.unwrap();
        let at_low = encode(&img, ImageFormat::Png, 0.1, 16, 16).await.unwrap();
        assert_eq!(at_full, at_low);
    }

    #[tokio::test]
    async fn test_jpeg_quality_changes_output() {
        let img = checkerboard(64, 64);
        let high = encode(&img, ImageFormat::Jpeg, 0.95, 64, 64).await.unwrap();
        let low = encode(&img, ImageFormat::Jpeg, 0.1, 64, 64).await.unwrap();
        assert!(low.len() < high.len());
    }

    #[tokio::test]
    async fn test_encode_rejects_zero_dimensions() {
        let img = checkerboard(8, 8);
        let err = encode(&img, ImageFormat::Jpeg, 0.8, 0, 8).await.unwrap_err();
        assert!(matches!(err, CodecError::Encode { .. }));
    }

    #[tokio::test]
    async fn test_encode_scales_to_target() {
        let img = checkerboard(40, 40);
        let png = encode(&img, ImageFormat::Png, 1.0, 10, 10).await.unwrap();
        let back = decode(&png).await.unwrap();
        assert_eq!((back.width(), back.height()), (10, 10));
    }
}
