//! Text normalization for quality estimation.
pub mod normalize;

pub use normalize::{DEFAULT_NOISE_CHARS, NormalizationConfig, normalize_lines};
