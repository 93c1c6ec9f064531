//! Failure-path behavior across the pipeline: missing puzzles are fatal for
//! the request, degraded descriptors are not, and invalid configurations are
//! rejected up front.

use std::sync::Arc;

use image::{imageops, Rgb, RgbImage};
use puzzlefit::{
    index_and_save, CancelToken, DescriptorStore, GridConfig, MatchConfig, MatchError,
    PieceMatcher, StoreError, StubProvider,
};

fn small_puzzle() -> RgbImage {
    RgbImage::from_fn(150, 150, |x, y| {
        Rgb([(x * 3 % 256) as u8, (y * 7 % 256) as u8, 64])
    })
}

#[test]
fn matching_an_unindexed_puzzle_is_not_found() {
    let matcher =
        PieceMatcher::in_memory(Arc::new(StubProvider::default()), MatchConfig::default()).unwrap();
    let piece = RgbImage::from_pixel(50, 50, Rgb([1, 2, 3]));

    match matcher.match_piece("never-indexed", &piece) {
        Err(MatchError::PuzzleNotFound(id)) => assert_eq!(id, "never-indexed"),
        other => panic!("expected PuzzleNotFound, got {other:?}"),
    }
}

#[test]
fn deleted_puzzle_stops_matching() {
    let store = Arc::new(DescriptorStore::in_memory());
    let provider = Arc::new(StubProvider::default());
    let image = small_puzzle();

    index_and_save(
        &store,
        "ephemeral",
        &image,
        &GridConfig::default(),
        provider.as_ref(),
    )
    .unwrap();
    store.delete("ephemeral").unwrap();

    let matcher = PieceMatcher::new(store.clone(), provider, MatchConfig::default()).unwrap();
    let piece = imageops::crop_imm(&image, 0, 0, 100, 100).to_image();
    assert!(matches!(
        matcher.match_piece("ephemeral", &piece),
        Err(MatchError::PuzzleNotFound(_))
    ));
    assert!(matches!(
        store.load("ephemeral"),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn no_match_is_a_normal_result() {
    let store = Arc::new(DescriptorStore::in_memory());
    let provider = Arc::new(StubProvider::default());

    // Index a colorful puzzle, then query with a flat black piece: its
    // embedding is degraded and nothing clears the acceptance gate.
    let image = small_puzzle();
    index_and_save(
        &store,
        "colorful",
        &image,
        &GridConfig::default(),
        provider.as_ref(),
    )
    .unwrap();

    let matcher = PieceMatcher::new(store, provider, MatchConfig::default()).unwrap();
    let piece = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
    let result = matcher.match_piece("colorful", &piece).unwrap();

    assert!(result.best_match.is_none());
    assert!(result.alternatives.is_empty());
    assert!(result.warning.is_some());
}

#[test]
fn cancellation_aborts_with_a_dedicated_error() {
    let provider = Arc::new(StubProvider::default());
    let image = small_puzzle();
    let set = puzzlefit::index_puzzle(&image, &GridConfig::default(), provider.as_ref()).unwrap();

    let matcher = PieceMatcher::in_memory(provider, MatchConfig::default()).unwrap();
    let piece = imageops::crop_imm(&image, 0, 0, 100, 100).to_image();

    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(matches!(
        matcher.find_matches_with(&piece, &set, &cancel),
        Err(MatchError::Cancelled)
    ));
}

#[test]
fn invalid_match_config_is_rejected_at_construction() {
    let result = PieceMatcher::in_memory(
        Arc::new(StubProvider::default()),
        MatchConfig::default().with_top_k(0),
    );
    assert!(matches!(result, Err(MatchError::InvalidConfig(_))));
}

#[test]
fn invalid_grid_config_fails_indexing() {
    let provider = StubProvider::default();
    let cfg = GridConfig::default().with_overlap(100);
    let err = puzzlefit::index_puzzle(&small_puzzle(), &cfg, &provider).unwrap_err();
    assert!(matches!(err, puzzlefit::PipelineError::Grid(_)));
}
