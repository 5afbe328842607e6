//! Shared fixtures for the integration tests.
//!
//! Image payloads are generated deterministically so every run exercises the
//! same bytes: a smooth gradient that compresses well and a hash-noise image
//! that resists compression and forces the byte-ceiling search to work.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

/// Deterministic per-pixel hash, xorshift-style.
fn pixel_hash(x: u32, y: u32) -> u32 {
    let mut h = x.wrapping_mul(0x9E37_79B9) ^ y.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2_AE35);
    h ^ (h >> 16)
}

/// PNG of uncorrelated noise. Barely compressible, so its encoded size stays
/// close to `w * h * 4` and shrinks roughly with pixel count.
pub fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let h = pixel_hash(x, y);
        image::Rgba([(h & 0xFF) as u8, (h >> 8 & 0xFF) as u8, (h >> 16 & 0xFF) as u8, 255])
    });
    encode_png(&img)
}

/// PNG of a smooth two-axis gradient. Compresses well under every codec.
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        image::Rgba([r, g, 128, 255])
    });
    encode_png(&img)
}

fn encode_png(img: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgba8)
        .expect("png fixture encode");
    out
}
