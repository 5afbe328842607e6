// RGBA scaler built on fast_image_resize (SIMD-accelerated).
// RGBA8 in, RGBA8 out, tightly packed rows on both sides.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x4;
use fir::{ResizeOptions, Resizer};
use image::RgbaImage;

use crate::error::CodecError;

/// Resample `src` to `dst_w` x `dst_h`. Returns a clone when the target
/// equals the source dimensions so callers can pass native sizes through.
pub(crate) fn resize_rgba(
    src: &RgbaImage,
    dst_w: u32,
    dst_h: u32,
) -> Result<RgbaImage, CodecError> {
    let (w, h) = src.dimensions();
    if dst_w == 0 || dst_h == 0 {
        return Err(CodecError::Encode {
            reason: format!("non-positive target dimensions {}x{}", dst_w, dst_h),
        });
    }
    if (dst_w, dst_h) == (w, h) {
        return Ok(src.clone());
    }

    let src_view = TypedImageRef::<U8x4>::from_buffer(w, h, src.as_raw()).map_err(buffer_err)?;
    let mut dst_buf = vec![0u8; dst_w as usize * dst_h as usize * 4];
    let mut dst_view =
        TypedImage::<U8x4>::from_buffer(dst_w, dst_h, dst_buf.as_mut_slice()).map_err(buffer_err)?;

    let opts = ResizeOptions::new().use_alpha(true);
    let mut resizer = Resizer::new();
    resizer
        .resize_typed::<U8x4>(&src_view, &mut dst_view, &opts)
        .map_err(|e| CodecError::Encode {
            reason: format!("resize failed: {}", e),
        })?;
    drop(dst_view);

    RgbaImage::from_raw(dst_w, dst_h, dst_buf).ok_or_else(|| CodecError::Encode {
        reason: "resize produced a short buffer".to_string(),
    })
}

fn buffer_err(e: fir::ImageBufferError) -> CodecError {
    CodecError::Encode {
        reason: format!("image buffer error: {}", e),
    }
}
