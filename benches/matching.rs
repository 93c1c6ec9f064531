use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{imageops, Rgb, RgbImage};
use puzzlefit::{
    index_puzzle, score_pair, GridConfig, MatchConfig, PieceMatcher, StubProvider,
};

fn puzzle_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 13 % 251) as u8,
            (y * 29 % 239) as u8,
            ((x * 7 + y * 11) % 227) as u8,
        ])
    })
}

fn bench_cascade(c: &mut Criterion) {
    let provider = StubProvider::default();
    let image = puzzle_image(300, 200);
    let set = index_puzzle(&image, &GridConfig::default(), &provider).unwrap();
    let cfg = MatchConfig::default();
    let piece = &set.regions[7].descriptor;
    let region = &set.regions[8].descriptor;

    c.bench_function("cascade_score_pair", |b| {
        b.iter(|| score_pair(black_box(piece), black_box(region), black_box(&cfg)))
    });
}

fn bench_full_match(c: &mut Criterion) {
    let provider = Arc::new(StubProvider::default());
    let image = puzzle_image(500, 400);
    let set = index_puzzle(&image, &GridConfig::default(), provider.as_ref()).unwrap();
    let matcher = PieceMatcher::in_memory(provider, MatchConfig::default()).unwrap();
    let piece = imageops::crop_imm(&image, 200, 150, 100, 100).to_image();

    c.bench_function("find_matches_500x400", |b| {
        b.iter(|| {
            matcher
                .find_matches(black_box(&piece), black_box(&set))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_cascade, bench_full_match);
criterion_main!(benches);
