//! Audio preparation: decoding, resampling, and segmentation
//!
//! Everything here is synchronous and CPU-bound. The pipeline runs the
//! normalizer on the blocking thread pool.

pub mod normalizer;
pub mod resampler;
pub mod segmenter;

pub use normalizer::{AudioNormalizer, CodecHint};
pub use resampler::Resampler;
pub use segmenter::Segmenter;
