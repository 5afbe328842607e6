//! Image processing pipeline: quality-tier reduction, ceiling-driven
//! adaptive transcoding, and container format conversion.

pub mod convert;
pub mod transcode;

pub use convert::{convert, convert_with_ceiling, ConversionResult};
pub use transcode::{
    reduce_to_byte_ceiling, reduce_to_quality_tier, EncodedCandidate, ReducedImage, MAX_ATTEMPTS,
};
