//! Stage scoring for the color → shape → embedding cascade.
//!
//! The three stages are ordered by cost: the color correlation is a cheap
//! prefilter that rejects most spatially irrelevant regions before the shape
//! and embedding comparisons run. Zeroed (degraded) sub-vectors are valid
//! low-information inputs: the shape stage substitutes a neutral prior, the
//! embedding stage scores them as 0.

use descriptor::{is_degenerate, Descriptor, ShapeFeatures};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::types::MatchConfig;

/// Sub-similarity substituted when a shape sub-vector is degenerate.
pub(crate) const NEUTRAL_SHAPE_PRIOR: f32 = 0.5;

/// Per-stage similarities and the fused confidence for one piece/region pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StageScores {
    /// Color-histogram similarity in [0, 1].
    pub color: f32,
    /// Shape similarity in [0, 1].
    pub shape: f32,
    /// Embedding similarity in [0, 1].
    pub embedding: f32,
    /// Raw fused confidence in [0, 100].
    pub confidence: f32,
}

/// Run the full cascade for one piece/region pair.
///
/// Returns `None` when the color prefilter rejects the region or the fused
/// confidence stays below the acceptance gate — rejected pairs produce no
/// candidate at all.
pub fn score_pair(
    piece: &Descriptor,
    region: &Descriptor,
    cfg: &MatchConfig,
) -> Option<StageScores> {
    let color = color_similarity(piece, region);
    if color < cfg.color_prefilter {
        return None;
    }

    let shape = shape_similarity(&piece.shape, &region.shape);
    let embedding = embedding_similarity(&piece.embedding, &region.embedding);

    let confidence = 100.0
        * (cfg.color_weight * color + cfg.shape_weight * shape + cfg.embedding_weight * embedding);
    if confidence < cfg.min_confidence {
        return None;
    }

    Some(StageScores {
        color,
        shape,
        embedding,
        confidence,
    })
}

/// Stage 1: correlation of the HSV histograms, mapped into [0, 1].
pub(crate) fn color_similarity(piece: &Descriptor, region: &Descriptor) -> f32 {
    correlation_similarity(&piece.color_hist, &region.color_hist)
}

/// Stage 2: mean of edge-histogram correlation and Hu-moment proximity, each
/// falling back to [`NEUTRAL_SHAPE_PRIOR`] when its sub-vector is degenerate.
pub(crate) fn shape_similarity(piece: &ShapeFeatures, region: &ShapeFeatures) -> f32 {
    let edge = if is_degenerate(&piece.edge_hist) || is_degenerate(&region.edge_hist) {
        NEUTRAL_SHAPE_PRIOR
    } else {
        correlation_similarity(&piece.edge_hist, &region.edge_hist)
    };

    let hu = if is_degenerate(&piece.hu_moments) || is_degenerate(&region.hu_moments) {
        NEUTRAL_SHAPE_PRIOR
    } else {
        (-euclidean_distance(&piece.hu_moments, &region.hu_moments)).exp()
    };

    clamp01((edge + hu) / 2.0)
}

/// Stage 3: cosine similarity of the embeddings, 0 for empty or zero-norm
/// vectors.
pub(crate) fn embedding_similarity(piece: &[f32], region: &[f32]) -> f32 {
    if piece.is_empty() || region.is_empty() || piece.len() != region.len() {
        return 0.0;
    }
    let a = ArrayView1::from(piece);
    let b = ArrayView1::from(region);
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    clamp01(a.dot(&b) / (norm_a * norm_b))
}

/// Round a confidence to the one-decimal precision of the external contract.
pub(crate) fn round_confidence(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Pearson correlation mapped from [-1, 1] into [0, 1].
fn correlation_similarity(a: &[f32], b: &[f32]) -> f32 {
    clamp01((correlation(a, b) + 1.0) / 2.0)
}

/// Pearson correlation between two equal-length vectors.
///
/// Returns 0.0 for mismatched lengths, empty inputs, or zero variance on
/// either side, which makes the derived similarity a neutral 0.5.
fn correlation(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let n = a.len() as f32;
    let av = ArrayView1::from(a);
    let bv = ArrayView1::from(b);
    let mean_a = av.sum() / n;
    let mean_b = bv.sum() / n;

    let covariance = av.dot(&bv) - n * mean_a * mean_b;
    let variance_a = av.dot(&av) - n * mean_a * mean_a;
    let variance_b = bv.dot(&bv) - n * mean_b * mean_b;
    if variance_a <= 0.0 || variance_b <= 0.0 {
        return 0.0;
    }
    covariance / (variance_a * variance_b).sqrt()
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
