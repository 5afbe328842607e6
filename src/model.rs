//! Data model shared across the vault: persisted records, quality tiers,
//! container formats and the data-URI text encoding used for payloads.
//!
//! On the wire the record layout is a JSON array of camelCase objects with
//! ISO-8601 timestamps, matching the persisted blob format documented in
//! the crate docs. `stored_size` is always the true decoded byte length of
//! `encoded_data`, never an estimate.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nominal quality setting for an upload.
///
/// `Medium` doubles as the marker a conversion pipeline writes when it
/// silently downgraded quality to fit the storage ceiling, regardless of the
/// (quality, scale) pair the search actually reached. That overload is
/// inherited behavior; callers should not read the exact search result out
/// of this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Store the payload byte-for-byte, no re-encode.
    Original,
    Optimized,
    Medium,
    Low,
}

impl QualityTier {
    /// Encoder quality factor for this tier, `None` for passthrough.
    pub fn quality_factor(self) -> Option<f32> {
        match self {
            QualityTier::Original => None,
            QualityTier::Optimized => Some(0.85),
            QualityTier::Medium => Some(0.6),
            QualityTier::Low => Some(0.3),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::Original => "original",
            QualityTier::Optimized => "optimized",
            QualityTier::Medium => "medium",
            QualityTier::Low => "low",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported container formats for encoded payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Filename extension for this format. JPEG uses the short `jpg` form.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Gif => "gif",
        }
    }

    /// Best-effort mapping from a MIME type, falling back to JPEG for
    /// anything unrecognized.
    pub fn from_mime_type(mime: &str) -> Self {
        if mime.contains("jpeg") || mime.contains("jpg") {
            ImageFormat::Jpeg
        } else if mime.contains("png") {
            ImageFormat::Png
        } else if mime.contains("webp") {
            ImageFormat::Webp
        } else if mime.contains("gif") {
            ImageFormat::Gif
        } else {
            ImageFormat::Jpeg
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Gif => "gif",
        })
    }
}

/// A persisted image record. Created only by successful admission into the
/// store, never mutated afterwards, removed only by an explicit delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImageRecord {
    /// Unique identifier, timestamp-derived and strictly increasing within
    /// a process.
    pub id: String,
    /// Display filename. Conversions rewrite the extension and append a
    /// `-converted` marker.
    pub name: String,
    /// The payload as a base64 data URI.
    pub encoded_data: String,
    /// Container format of `encoded_data`.
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    /// Byte count of the source payload before transcoding. On conversion
    /// this is a base64-length-derived estimate, not a tracked true count.
    pub original_size: u64,
    /// True byte length of `encoded_data` after base64 decoding.
    pub stored_size: u64,
    pub quality_tier: QualityTier,
    /// `stored_size / original_size`; 1.0 when the payload was untouched.
    pub compression_ratio: f64,
}

/// Encode raw bytes as a `data:<mime>;base64,<payload>` URI.
pub fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, BASE64.encode(bytes))
}

/// Decode a data URI (or a bare base64 string) back into raw bytes.
pub fn decode_data_uri(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match data.split_once(',') {
        Some((_, payload)) => payload,
        None => data,
    };
    BASE64.decode(payload)
}

/// Byte count a base64 text encoding of this length represents, rounded up.
/// Used where the true source byte length is not independently tracked.
pub fn estimate_bytes_from_base64_len(len: usize) -> u64 {
    ((len as u64) * 3).div_ceil(4)
}

/// Human-readable size with 1024-based units and up to two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let exp = (bytes as f64).log(1024.0).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let mut text = format!("{:.2}", value);
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    format!("{} {}", text, UNITS[exp])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri_round_trip() {
        let bytes = b"\x89PNG\r\n\x1a\n not really a png";
        let uri = encode_data_uri("image/png", bytes);
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_uri(&uri).unwrap(), bytes);
    }

    #[test]
    fn test_decode_bare_base64() {
        let encoded = BASE64.encode(b"abc");
        assert_eq!(decode_data_uri(&encoded).unwrap(), b"abc");
    }

    #[test]
    fn test_base64_length_estimate() {
        // 3 raw bytes encode to 4 characters
        assert_eq!(estimate_bytes_from_base64_len(4), 3);
        // round up on partial groups
        assert_eq!(estimate_bytes_from_base64_len(5), 4);
        assert_eq!(estimate_bytes_from_base64_len(0), 0);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2 MB");
    }

    #[test]
    fn test_format_from_mime() {
        assert_eq!(ImageFormat::from_mime_type("image/jpg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_mime_type("image/webp"), ImageFormat::Webp);
        assert_eq!(
            ImageFormat::from_mime_type("application/octet-stream"),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_record_wire_format() {
        let record = StoredImageRecord {
            id: "1700000000000".to_string(),
            name: "photo.png".to_string(),
            encoded_data: encode_data_uri("image/png", b"xyz"),
            mime_type: "image/png".to_string(),
            created_at: Utc::now(),
            original_size: 3,
            stored_size: 3,
            quality_tier: QualityTier::Original,
            compression_ratio: 1.0,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"encodedData\""));
        assert!(json.contains("\"qualityTier\":\"original\""));
        assert!(json.contains("\"createdAt\""));
        let back: StoredImageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
