use serde::{Deserialize, Serialize};

/// HSV histogram layout: 30 hue × 32 saturation × 32 value bins.
pub const COLOR_HIST_BINS: (usize, usize, usize) = (30, 32, 32);

/// Flattened length of the color histogram.
pub const COLOR_HIST_LEN: usize = COLOR_HIST_BINS.0 * COLOR_HIST_BINS.1 * COLOR_HIST_BINS.2;

/// Number of gradient-orientation bins in the edge histogram.
pub const EDGE_HIST_LEN: usize = 16;

/// Number of Hu invariant moments.
pub const HU_MOMENTS_LEN: usize = 7;

/// Shape features of an image area.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShapeFeatures {
    /// Normalized histogram of gradient orientations over `[-π, π]`,
    /// [`EDGE_HIST_LEN`] bins.
    pub edge_hist: Vec<f32>,
    /// Log-scaled, sign-preserving Hu invariant moments, [`HU_MOMENTS_LEN`]
    /// values.
    pub hu_moments: Vec<f32>,
}

impl ShapeFeatures {
    /// Degraded placeholder: all-zero vectors of the expected lengths.
    pub fn zeroed() -> Self {
        Self {
            edge_hist: vec![0.0; EDGE_HIST_LEN],
            hu_moments: vec![0.0; HU_MOMENTS_LEN],
        }
    }
}

/// Full multi-modal descriptor of an image area.
///
/// `embedding` is L2-normalized by the provider when non-degenerate. Any
/// sub-vector may be all-zero after a failed sub-extraction; consumers must
/// treat zeroed vectors as valid low-information inputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Descriptor {
    pub color_hist: Vec<f32>,
    pub shape: ShapeFeatures,
    pub embedding: Vec<f32>,
}

impl Descriptor {
    /// Fully degraded placeholder with an `embedding_dim`-length zero
    /// embedding.
    pub fn zeroed(embedding_dim: usize) -> Self {
        Self {
            color_hist: vec![0.0; COLOR_HIST_LEN],
            shape: ShapeFeatures::zeroed(),
            embedding: vec![0.0; embedding_dim],
        }
    }
}

/// Per-modality degradation flags for one extraction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DescriptorQuality {
    pub color_degraded: bool,
    pub shape_degraded: bool,
    pub embedding_degraded: bool,
}

impl DescriptorQuality {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn any_degraded(&self) -> bool {
        self.color_degraded || self.shape_degraded || self.embedding_degraded
    }
}

/// Outcome of one provider call: the descriptor plus what was degraded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Extraction {
    pub descriptor: Descriptor,
    pub quality: DescriptorQuality,
}

/// Whether a feature vector carries no information (empty or all-zero).
pub fn is_degenerate(values: &[f32]) -> bool {
    values.is_empty() || values.iter().all(|&v| v == 0.0)
}
