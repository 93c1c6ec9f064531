use image::RgbImage;
use thiserror::Error;

use crate::types::Extraction;

/// Errors from a provider that cannot run at all.
///
/// Per-modality extraction failures are not errors: they surface as zeroed
/// sub-vectors with the matching [`DescriptorQuality`](crate::DescriptorQuality)
/// flag set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("descriptor provider unavailable: {0}")]
    Unavailable(String),
    #[error("unsupported input image: {0}")]
    UnsupportedInput(String),
}

/// Capability that turns an image area into a [`Descriptor`](crate::Descriptor).
///
/// Implementations must be pure with respect to pixel content: the same image
/// always yields the same extraction. Model-backed providers may block for
/// inference; callers treat `extract` as a blocking call and keep it off
/// latency-sensitive dispatch paths.
pub trait DescriptorProvider: Send + Sync {
    fn extract(&self, image: &RgbImage) -> Result<Extraction, ProviderError>;
}
