//! # Puzzle Descriptors
//!
//! Data model and provider contract for the multi-modal descriptors that
//! drive puzzle-piece matching. A [`Descriptor`] bundles three views of an
//! image area:
//!
//! - a color histogram over HSV bins,
//! - shape features (a gradient-orientation histogram plus Hu invariant
//!   moments),
//! - an L2-normalized embedding vector from an opaque feature model.
//!
//! ## Contract
//!
//! Descriptor production is abstracted behind [`DescriptorProvider`]. A
//! provider that cannot complete an individual sub-extraction returns a
//! zeroed vector of the expected length and sets the matching flag in
//! [`DescriptorQuality`] — degraded output is a valid, low-information
//! descriptor, never an error. [`ProviderError`] is reserved for a provider
//! that cannot run at all, so callers can distinguish "computed but degraded"
//! from "capability unavailable."
//!
//! [`StubProvider`] is a deterministic, dependency-free implementation used
//! in tests and deployments without a model: the classic color and shape
//! features are computed directly from pixels, and a grid-pooled luminance
//! vector stands in for the model embedding.

pub mod normalize;
mod provider;
mod stub;
mod types;

pub use crate::provider::{DescriptorProvider, ProviderError};
pub use crate::stub::{StubConfig, StubProvider};
pub use crate::types::{
    is_degenerate, Descriptor, DescriptorQuality, Extraction, ShapeFeatures, COLOR_HIST_BINS,
    COLOR_HIST_LEN, EDGE_HIST_LEN, HU_MOMENTS_LEN,
};
