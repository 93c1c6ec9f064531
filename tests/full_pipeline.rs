//! End-to-end pipeline tests: index a puzzle image, persist the descriptor
//! set, and match pieces against it through the store.

use std::sync::Arc;

use image::{imageops, Rgb, RgbImage};
use puzzlefit::{
    index_and_save, DescriptorStore, GridConfig, MatchConfig, PieceMatcher, Rotation, StubProvider,
};

fn puzzle_image() -> RgbImage {
    RgbImage::from_fn(300, 200, |x, y| {
        Rgb([
            (x * 11 % 251) as u8,
            (y * 17 % 239) as u8,
            ((x * 5 + y * 3) % 227) as u8,
        ])
    })
}

#[test]
fn indexed_puzzle_matches_its_own_pieces() {
    let store = Arc::new(DescriptorStore::in_memory());
    let provider = Arc::new(StubProvider::default());
    let image = puzzle_image();

    let set = index_and_save(
        &store,
        "garden-500",
        &image,
        &GridConfig::default(),
        provider.as_ref(),
    )
    .unwrap();
    assert_eq!(set.grid_size, (3, 5));
    assert_eq!(set.regions.len(), 15);

    let matcher = PieceMatcher::new(store, provider, MatchConfig::default()).unwrap();

    let target = set.regions[9].geometry;
    let piece =
        imageops::crop_imm(&image, target.x, target.y, target.width, target.height).to_image();

    let result = matcher.match_piece("garden-500", &piece).unwrap();
    let best = result.best_match.expect("own piece must match");
    assert_eq!(best.confidence, 100.0);
    assert_eq!(best.location, target);
    assert_eq!(best.rotation_needed, Rotation::R0);
    assert!(result.warning.is_none());
}

#[test]
fn rotated_piece_is_located_with_its_rotation() {
    let store = Arc::new(DescriptorStore::in_memory());
    let provider = Arc::new(StubProvider::default());
    let image = puzzle_image();

    let set = index_and_save(
        &store,
        "garden-501",
        &image,
        &GridConfig::default(),
        provider.as_ref(),
    )
    .unwrap();

    let target = set.regions[2].geometry;
    let crop =
        imageops::crop_imm(&image, target.x, target.y, target.width, target.height).to_image();
    let piece = imageops::rotate180(&crop);

    let matcher = PieceMatcher::new(store, provider, MatchConfig::default()).unwrap();
    let result = matcher.match_piece("garden-501", &piece).unwrap();
    let best = result.best_match.expect("rotated piece must match");
    assert_eq!(best.location, target);
    assert_eq!(best.rotation_needed, Rotation::R180);
    assert!(best.description.ends_with("rotated 180°"));
}

#[test]
fn result_serializes_to_the_external_contract() {
    let store = Arc::new(DescriptorStore::in_memory());
    let provider = Arc::new(StubProvider::default());
    let image = puzzle_image();

    index_and_save(
        &store,
        "garden-502",
        &image,
        &GridConfig::default(),
        provider.as_ref(),
    )
    .unwrap();

    let matcher = PieceMatcher::new(store, provider, MatchConfig::default()).unwrap();
    let piece = imageops::crop_imm(&image, 50, 50, 100, 100).to_image();
    let result = matcher.match_piece("garden-502", &piece).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    let best = &json["best_match"];
    assert!(best.is_object());
    assert!(best["confidence"].is_number());
    assert!(best["location"]["x"].is_number());
    assert!(best["location"]["width"].is_number());
    assert_eq!(best["rotation_needed"], 0);
    assert!(best["description"].is_string());
    assert!(json["alternatives"].is_array());
    assert!(json["warning"].is_null());
}
