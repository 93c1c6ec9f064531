use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use descriptor::ProviderError;
use grid::RegionGeometry;
use serde::{Deserialize, Serialize};
use store::StoreError;
use thiserror::Error;

use crate::cascade::StageScores;

/// Rotation applied to the piece to produce a candidate, in clockwise
/// degrees. The surfaced value is "the rotation needed to align the piece."
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum Rotation {
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    /// All rotations in search order.
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    pub fn degrees(self) -> u16 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> u16 {
        rotation.degrees()
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Rotation::R0),
            90 => Ok(Rotation::R90),
            180 => Ok(Rotation::R180),
            270 => Ok(Rotation::R270),
            other => Err(format!("rotation must be one of 0/90/180/270, got {other}")),
        }
    }
}

/// Thresholds and fusion weights for one matching engine.
///
/// Cheap to clone and serde-friendly so it can be embedded in higher-level
/// configs. The defaults are the fixed constants of this engine version; the
/// knobs trade recall for speed (`color_prefilter`), control result
/// strictness (`min_confidence`, `confident_threshold`), and set modality
/// trust (the fusion weights).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchConfig {
    /// Number of pooled candidates retained after ranking.
    #[serde(default = "MatchConfig::default_top_k")]
    pub top_k: usize,
    /// Color-similarity floor below which a region is rejected before the
    /// shape and embedding stages run.
    #[serde(default = "MatchConfig::default_color_prefilter")]
    pub color_prefilter: f32,
    /// Minimum fused confidence (0-100) for a candidate to be kept at all.
    #[serde(default = "MatchConfig::default_min_confidence")]
    pub min_confidence: f32,
    /// Confidence floor (0-100) above which the best match is considered
    /// trustworthy: gates both the alternatives list and the low-confidence
    /// warning.
    #[serde(default = "MatchConfig::default_confident_threshold")]
    pub confident_threshold: f32,
    /// Fusion weight of the color stage.
    #[serde(default = "MatchConfig::default_color_weight")]
    pub color_weight: f32,
    /// Fusion weight of the shape stage.
    #[serde(default = "MatchConfig::default_shape_weight")]
    pub shape_weight: f32,
    /// Fusion weight of the embedding stage (the most discriminative cue).
    #[serde(default = "MatchConfig::default_embedding_weight")]
    pub embedding_weight: f32,
}

impl MatchConfig {
    pub(crate) fn default_top_k() -> usize {
        5
    }

    pub(crate) fn default_color_prefilter() -> f32 {
        0.30
    }

    pub(crate) fn default_min_confidence() -> f32 {
        40.0
    }

    pub(crate) fn default_confident_threshold() -> f32 {
        80.0
    }

    pub(crate) fn default_color_weight() -> f32 {
        0.25
    }

    pub(crate) fn default_shape_weight() -> f32 {
        0.25
    }

    pub(crate) fn default_embedding_weight() -> f32 {
        0.50
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Validate thresholds and fusion weights.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.top_k == 0 {
            return Err(MatchError::InvalidConfig(
                "top_k must be greater than zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.color_prefilter) {
            return Err(MatchError::InvalidConfig(
                "color_prefilter must be within [0.0, 1.0]".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.min_confidence) {
            return Err(MatchError::InvalidConfig(
                "min_confidence must be within [0.0, 100.0]".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.confident_threshold) {
            return Err(MatchError::InvalidConfig(
                "confident_threshold must be within [0.0, 100.0]".into(),
            ));
        }
        let weights = [self.color_weight, self.shape_weight, self.embedding_weight];
        if weights.iter().any(|w| *w < 0.0) {
            return Err(MatchError::InvalidConfig(
                "fusion weights must be non-negative".into(),
            ));
        }
        let sum: f32 = weights.iter().sum();
        if (sum - 1.0).abs() > 1e-3 {
            return Err(MatchError::InvalidConfig(format!(
                "fusion weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            top_k: Self::default_top_k(),
            color_prefilter: Self::default_color_prefilter(),
            min_confidence: Self::default_min_confidence(),
            confident_threshold: Self::default_confident_threshold(),
            color_weight: Self::default_color_weight(),
            shape_weight: Self::default_shape_weight(),
            embedding_weight: Self::default_embedding_weight(),
        }
    }
}

/// Candidate accepted by the cascade, before ranking. Transient: pooled,
/// sorted, and discarded within a single match call.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    /// Fused confidence rounded to one decimal, as surfaced to callers.
    pub confidence: f32,
    /// Raw per-stage similarities.
    pub scores: StageScores,
    /// Discovery-order index of the region in the descriptor set.
    pub region_index: usize,
    pub rotation: Rotation,
}

/// A ranked candidate surfaced to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionMatch {
    /// Fused confidence, 0-100, one decimal.
    pub confidence: f32,
    pub location: RegionGeometry,
    pub rotation_needed: Rotation,
    pub description: String,
}

/// The externally observable result of one match request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    pub best_match: Option<RegionMatch>,
    pub alternatives: Vec<RegionMatch>,
    pub warning: Option<String>,
}

/// Cooperative cancellation flag for long region sweeps.
///
/// Clones share the flag; cancelling any clone aborts the match with
/// [`MatchError::Cancelled`] at the next check point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Errors produced by the matching layer.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Invalid engine configuration.
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
    /// The store has no descriptor set for the requested puzzle.
    #[error("no puzzle indexed under id {0}")]
    PuzzleNotFound(String),
    /// The descriptor provider could not run at all.
    #[error("descriptor provider error: {0}")]
    Provider(#[from] ProviderError),
    /// Store read failed for a reason other than a missing set.
    #[error("store error: {0}")]
    Store(StoreError),
    /// The request was cancelled through its [`CancelToken`].
    #[error("match request cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_serializes_as_degrees() {
        assert_eq!(serde_json::to_string(&Rotation::R90).unwrap(), "90");
        let r: Rotation = serde_json::from_str("270").unwrap();
        assert_eq!(r, Rotation::R270);
    }

    #[test]
    fn rotation_rejects_other_angles() {
        let err = serde_json::from_str::<Rotation>("45").unwrap_err();
        assert!(err.to_string().contains("rotation"));
    }

    #[test]
    fn rotation_order_matches_search_order() {
        assert!(Rotation::R0 < Rotation::R90);
        assert!(Rotation::R90 < Rotation::R180);
        assert!(Rotation::R180 < Rotation::R270);
        let degrees: Vec<u16> = Rotation::ALL.iter().map(|r| r.degrees()).collect();
        assert_eq!(degrees, vec![0, 90, 180, 270]);
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = MatchConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.top_k, 5);
        assert!((cfg.color_prefilter - 0.30).abs() < f32::EPSILON);
        assert!((cfg.min_confidence - 40.0).abs() < f32::EPSILON);
        assert!((cfg.confident_threshold - 80.0).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_top_k_rejected() {
        let cfg = MatchConfig::default().with_top_k(0);
        let err = cfg.validate().expect_err("config should be invalid");
        match err {
            MatchError::InvalidConfig(msg) => assert!(msg.contains("top_k")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn weights_must_sum_to_one() {
        let cfg = MatchConfig {
            embedding_weight: 0.9,
            ..MatchConfig::default()
        };
        let err = cfg.validate().expect_err("config should be invalid");
        match err {
            MatchError::InvalidConfig(msg) => assert!(msg.contains("sum to 1.0")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn out_of_range_prefilter_rejected() {
        let cfg = MatchConfig {
            color_prefilter: 1.2,
            ..MatchConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_serde_defaults() {
        let cfg: MatchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, MatchConfig::default());
    }

    #[test]
    fn cancel_token_is_shared_across_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
