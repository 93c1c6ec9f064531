//! Workspace umbrella crate for puzzlefit.
//!
//! This crate stitches the member crates together so callers can index a
//! puzzle image and match pieces against it with a single API surface:
//!
//! - [`grid`] partitions the puzzle dimensions into overlapping regions,
//! - [`descriptor`] extracts a multi-modal descriptor per region,
//! - [`store`] persists the resulting [`PuzzleDescriptorSet`],
//! - [`matcher`] locates pieces at query time.
//!
//! The typical flow is [`index_and_save`] once at puzzle ingestion, then
//! [`PieceMatcher::match_piece`] per lookup.

pub use descriptor::{
    is_degenerate, Descriptor, DescriptorProvider, DescriptorQuality, Extraction, ProviderError,
    ShapeFeatures, StubConfig, StubProvider, COLOR_HIST_BINS, COLOR_HIST_LEN, EDGE_HIST_LEN,
    HU_MOMENTS_LEN,
};
pub use grid::{build_grid, GridConfig, GridError, PuzzleGrid, RegionGeometry};
pub use matcher::{
    score_pair, set_match_metrics, CancelToken, MatchConfig, MatchError, MatchMetrics,
    MatchResult, PieceMatcher, RegionMatch, Rotation, StageScores,
};
pub use store::{
    BackendConfig, CompressionCodec, CompressionConfig, DescriptorStore, PuzzleDescriptorSet,
    Region, StoreBackend, StoreConfig, StoreError, STORE_SCHEMA_VERSION,
};

mod config;
pub use crate::config::{ConfigError, PuzzlefitConfig};

use image::{imageops, RgbImage};
use thiserror::Error;
use tracing::{info, warn};

/// Errors from the offline puzzle-indexing pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("grid construction failed: {0}")]
    Grid(#[from] GridError),
    #[error("descriptor extraction failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Build the descriptor set for a full puzzle image.
///
/// Runs once per puzzle at ingestion time: the image is partitioned into
/// overlapping regions, each region is cropped and handed to the provider,
/// and the descriptors are assembled in discovery order. Degraded
/// extractions are kept (and logged) — a region with partial features is
/// still a valid match target.
pub fn index_puzzle(
    image: &RgbImage,
    grid_cfg: &GridConfig,
    provider: &dyn DescriptorProvider,
) -> Result<PuzzleDescriptorSet, PipelineError> {
    let (width, height) = image.dimensions();
    let grid = build_grid(width, height, grid_cfg)?;
    info!(
        width,
        height,
        rows = grid.rows,
        cols = grid.cols,
        "indexing puzzle image"
    );

    let mut regions = Vec::with_capacity(grid.cells.len());
    for (index, cell) in grid.cells.iter().enumerate() {
        let view = imageops::crop_imm(image, cell.x, cell.y, cell.width, cell.height).to_image();
        let extraction = provider.extract(&view)?;
        if extraction.quality.any_degraded() {
            warn!(
                region = index,
                x = cell.x,
                y = cell.y,
                "region descriptor extraction degraded"
            );
        }
        regions.push(Region {
            geometry: *cell,
            descriptor: extraction.descriptor,
        });
    }

    Ok(PuzzleDescriptorSet {
        schema_version: STORE_SCHEMA_VERSION,
        source_width: width,
        source_height: height,
        grid_size: (grid.rows, grid.cols),
        regions,
    })
}

/// Index `image` and persist the result under `puzzle_id`.
pub fn index_and_save(
    store: &DescriptorStore,
    puzzle_id: &str,
    image: &RgbImage,
    grid_cfg: &GridConfig,
    provider: &dyn DescriptorProvider,
) -> Result<PuzzleDescriptorSet, PipelineError> {
    let set = index_puzzle(image, grid_cfg, provider)?;
    store.save(puzzle_id, &set)?;
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn index_puzzle_matches_grid_layout() {
        let image = RgbImage::from_fn(300, 200, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let provider = StubProvider::default();
        let set = index_puzzle(&image, &GridConfig::default(), &provider).unwrap();

        assert_eq!(set.grid_size, (3, 5));
        assert_eq!(set.regions.len(), 15);
        assert_eq!((set.source_width, set.source_height), (300, 200));

        let grid = build_grid(300, 200, &GridConfig::default()).unwrap();
        for (region, cell) in set.regions.iter().zip(&grid.cells) {
            assert_eq!(region.geometry, *cell);
        }
    }

    #[test]
    fn undersized_image_indexes_to_an_empty_set() {
        let image = RgbImage::from_pixel(80, 80, Rgb([10, 20, 30]));
        let provider = StubProvider::default();
        let set = index_puzzle(&image, &GridConfig::default(), &provider).unwrap();
        assert!(set.regions.is_empty());
        assert_eq!(set.grid_size, (0, 0));
    }
}
