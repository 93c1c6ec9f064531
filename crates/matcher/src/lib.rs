//! # Puzzle Matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` sits on top of the descriptor layer (`descriptor`) and the store
//! layer (`store`). It locates where a photographed piece belongs inside an
//! indexed puzzle: the piece is observed under four rotations, every stored
//! region is scored through a cascaded color → shape → embedding comparison,
//! and the pooled candidates are reduced to a ranked, annotated result.
//!
//! The cascade rejects most regions cheaply: a region whose color histogram
//! correlates poorly with the piece (similarity below 0.30) never reaches the
//! costlier shape and embedding stages, and a fused confidence under 40 is
//! discarded silently. Surviving candidates fuse the three similarities at
//! 25/25/50 weights — the embedding dominates because it is the most
//! discriminative cue, with color and shape as noise-tolerant corroboration.
//!
//! ## Core Types
//!
//! - [`PieceMatcher`]: the engine; holds the injected [`store`] and
//!   descriptor provider.
//! - [`MatchConfig`]: thresholds and fusion weights, validated at
//!   construction.
//! - [`MatchResult`] / [`RegionMatch`]: the externally observable outcome —
//!   best match, gated alternatives, and an optional warning.
//! - [`Rotation`]: the clockwise rotation needed to align the piece.
//! - [`StageScores`]: per-stage similarities for one piece/region pair.
//! - [`CancelToken`]: cooperative cancellation for large region sweeps.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use descriptor::StubProvider;
//! use matcher::{MatchConfig, PieceMatcher};
//! use store::DescriptorStore;
//!
//! let store = Arc::new(DescriptorStore::in_memory());
//! let provider = Arc::new(StubProvider::default());
//! let matcher = PieceMatcher::new(store, provider, MatchConfig::default()).unwrap();
//!
//! let piece = image::RgbImage::new(100, 100);
//! let result = matcher.match_piece("puzzle-1", &piece).unwrap();
//! if let Some(best) = result.best_match {
//!     println!("{} ({}%)", best.description, best.confidence);
//! }
//! ```
//!
//! ## Concurrency
//!
//! A match request reads the immutable descriptor set and mutates nothing:
//! the 4-orientation × N-region space fans out across rayon workers, and the
//! ranker's total ordering (confidence, then rotation, then region discovery
//! index) keeps results reproducible regardless of scheduling.
//!
//! ## Observability
//!
//! Install a [`MatchMetrics`] implementation via [`set_match_metrics`] to
//! record per-request latency and outcomes, typically once during service
//! startup.

pub mod cascade;
pub mod engine;
pub mod metrics;
pub mod rank;
pub mod types;

pub use crate::cascade::{score_pair, StageScores};
pub use crate::engine::PieceMatcher;
pub use crate::metrics::{set_match_metrics, MatchMetrics};
pub use crate::rank::{LOW_CONFIDENCE_WARNING, NO_MATCH_WARNING};
pub use crate::types::{
    CancelToken, MatchCandidate, MatchConfig, MatchError, MatchResult, RegionMatch, Rotation,
};
