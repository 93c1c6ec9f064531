use std::sync::Arc;
use std::time::Instant;

use descriptor::{Descriptor, DescriptorProvider};
use image::{imageops, RgbImage};
use rayon::prelude::*;
use store::{DescriptorStore, PuzzleDescriptorSet, StoreError};
use tracing::{debug, info, warn};

use crate::cascade::{round_confidence, score_pair};
use crate::metrics::metrics_recorder;
use crate::rank;
use crate::types::{CancelToken, MatchCandidate, MatchConfig, MatchError, MatchResult, Rotation};


/// One rotated view of the piece with its freshly extracted descriptor.
/// Ephemeral: lives only for the duration of a single match call and is
/// never persisted.
struct PieceObservation {
    rotation: Rotation,
    descriptor: Descriptor,
}

/// Matching engine: locates a piece within an indexed puzzle.
///
/// The engine holds its collaborators — the descriptor store and the
/// descriptor provider — by explicit injection, and keeps no per-request
/// state: every match is a pure function of the piece image and the loaded
/// descriptor set, so concurrent requests are fully independent.
pub struct PieceMatcher {
    store: Arc<DescriptorStore>,
    provider: Arc<dyn DescriptorProvider>,
    cfg: MatchConfig,
}

impl PieceMatcher {
    /// Construct an engine from its collaborators, validating the config.
    pub fn new(
        store: Arc<DescriptorStore>,
        provider: Arc<dyn DescriptorProvider>,
        cfg: MatchConfig,
    ) -> Result<Self, MatchError> {
        cfg.validate()?;
        Ok(Self {
            store,
            provider,
            cfg,
        })
    }

    /// Convenience constructor over an ephemeral in-memory store.
    pub fn in_memory(
        provider: Arc<dyn DescriptorProvider>,
        cfg: MatchConfig,
    ) -> Result<Self, MatchError> {
        Self::new(Arc::new(DescriptorStore::in_memory()), provider, cfg)
    }

    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    pub fn store(&self) -> &DescriptorStore {
        &self.store
    }

    /// Load the descriptor set for `puzzle_id` and match `piece` against it.
    ///
    /// A puzzle without a stored set is a request-fatal
    /// [`MatchError::PuzzleNotFound`]; the engine never synthesizes a result
    /// for an unknown puzzle.
    pub fn match_piece(&self, puzzle_id: &str, piece: &RgbImage) -> Result<MatchResult, MatchError> {
        let start = Instant::now();
        let set = self.store.load(puzzle_id).map_err(|e| match e {
            StoreError::NotFound { puzzle_id } => MatchError::PuzzleNotFound(puzzle_id),
            other => MatchError::Store(other),
        })?;

        let result = self.find_matches(piece, &set)?;

        if let Some(recorder) = metrics_recorder() {
            recorder.record_match(
                puzzle_id,
                start.elapsed(),
                result.best_match.as_ref().map(|m| m.confidence),
            );
        }
        Ok(result)
    }

    /// Match `piece` against an already-loaded descriptor set.
    pub fn find_matches(
        &self,
        piece: &RgbImage,
        set: &PuzzleDescriptorSet,
    ) -> Result<MatchResult, MatchError> {
        self.find_matches_with(piece, set, &CancelToken::default())
    }

    /// Like [`find_matches`](Self::find_matches), aborting with
    /// [`MatchError::Cancelled`] once `cancel` is set. The flag is checked
    /// before each rotation batch and per region, so a cancel lands within
    /// one region's cascade.
    pub fn find_matches_with(
        &self,
        piece: &RgbImage,
        set: &PuzzleDescriptorSet,
        cancel: &CancelToken,
    ) -> Result<MatchResult, MatchError> {
        info!(
            regions = set.regions.len(),
            grid_rows = set.grid_size.0,
            grid_cols = set.grid_size.1,
            "matching piece against descriptor set"
        );

        let observations = self.observe_rotations(piece, cancel)?;

        // The (rotation, region) comparison space has no data dependencies;
        // fan out freely and let the ranker's total sort restore determinism.
        let candidates: Vec<MatchCandidate> = observations
            .par_iter()
            .flat_map(|observation| {
                set.regions
                    .par_iter()
                    .enumerate()
                    .filter_map(move |(region_index, region)| {
                        if cancel.is_cancelled() {
                            return None;
                        }
                        score_pair(&observation.descriptor, &region.descriptor, &self.cfg).map(
                            |scores| MatchCandidate {
                                confidence: round_confidence(scores.confidence),
                                scores,
                                region_index,
                                rotation: observation.rotation,
                            },
                        )
                    })
            })
            .collect();

        if cancel.is_cancelled() {
            return Err(MatchError::Cancelled);
        }
        debug!(candidates = candidates.len(), "cascade sweep complete");

        Ok(rank::rank(candidates, set, &self.cfg))
    }

    /// Extract a fresh descriptor for each of the four piece rotations.
    ///
    /// Shape and embedding features are orientation-sensitive; color is not,
    /// but is recomputed with the rest for symmetry.
    fn observe_rotations(
        &self,
        piece: &RgbImage,
        cancel: &CancelToken,
    ) -> Result<Vec<PieceObservation>, MatchError> {
        let mut observations = Vec::with_capacity(Rotation::ALL.len());
        for rotation in Rotation::ALL {
            if cancel.is_cancelled() {
                return Err(MatchError::Cancelled);
            }
            let rotated = rotate_piece(piece, rotation);
            let extraction = self.provider.extract(&rotated)?;
            if extraction.quality.any_degraded() {
                warn!(
                    rotation = rotation.degrees(),
                    color = extraction.quality.color_degraded,
                    shape = extraction.quality.shape_degraded,
                    embedding = extraction.quality.embedding_degraded,
                    "piece descriptor extraction degraded"
                );
            }
            debug!(rotation = rotation.degrees(), "piece descriptor extracted");
            observations.push(PieceObservation {
                rotation,
                descriptor: extraction.descriptor,
            });
        }
        Ok(observations)
    }
}

/// Rotate the piece clockwise by the given rotation.
fn rotate_piece(piece: &RgbImage, rotation: Rotation) -> RgbImage {
    match rotation {
        Rotation::R0 => piece.clone(),
        Rotation::R90 => imageops::rotate90(piece),
        Rotation::R180 => imageops::rotate180(piece),
        Rotation::R270 => imageops::rotate270(piece),
    }
}
