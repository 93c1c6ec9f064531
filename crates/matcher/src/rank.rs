//! Result shaping: deterministic ordering, top-k truncation, alternatives
//! gating, warnings, and location phrasing.

use grid::RegionGeometry;
use store::PuzzleDescriptorSet;

use crate::types::{MatchCandidate, MatchConfig, MatchResult, RegionMatch, Rotation};

/// Warning surfaced when no candidate survived the cascade at all.
pub const NO_MATCH_WARNING: &str =
    "No confident match found. Please try a different piece or retake the photo.";

/// Warning surfaced when the best candidate stays under the confidence floor.
pub const LOW_CONFIDENCE_WARNING: &str = "Low confidence match. This may not be accurate.";

/// Reduce the pooled candidate set to the final result shape.
///
/// The sort is a total order — confidence descending, then rotation
/// ascending, then region discovery index ascending — so the outcome is
/// reproducible no matter how the parallel sweep interleaved its output.
pub(crate) fn rank(
    mut candidates: Vec<MatchCandidate>,
    set: &PuzzleDescriptorSet,
    cfg: &MatchConfig,
) -> MatchResult {
    candidates.sort_unstable_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.rotation.cmp(&b.rotation))
            .then_with(|| a.region_index.cmp(&b.region_index))
    });
    candidates.truncate(cfg.top_k);

    let mut top: Vec<RegionMatch> = candidates
        .iter()
        .map(|candidate| {
            let geometry = set.regions[candidate.region_index].geometry;
            RegionMatch {
                confidence: candidate.confidence,
                location: geometry,
                rotation_needed: candidate.rotation,
                description: location_description(
                    &geometry,
                    set.source_width,
                    set.source_height,
                    candidate.rotation,
                ),
            }
        })
        .collect();

    if top.is_empty() {
        return MatchResult {
            best_match: None,
            alternatives: Vec::new(),
            warning: Some(NO_MATCH_WARNING.to_string()),
        };
    }

    let best = top.remove(0);
    let confident = best.confidence >= cfg.confident_threshold;

    // Alternatives are only meaningful when the primary answer itself is
    // trustworthy.
    let alternatives = if confident {
        top.into_iter()
            .filter(|m| m.confidence >= cfg.confident_threshold)
            .collect()
    } else {
        Vec::new()
    };
    let warning = (!confident).then(|| LOW_CONFIDENCE_WARNING.to_string());

    MatchResult {
        best_match: Some(best),
        alternatives,
        warning,
    }
}

/// Human-readable phrase for where a region sits within the puzzle, with the
/// required rotation appended.
pub(crate) fn location_description(
    geometry: &RegionGeometry,
    puzzle_width: u32,
    puzzle_height: u32,
    rotation: Rotation,
) -> String {
    let x = geometry.x as f64;
    let y = geometry.y as f64;
    let width = puzzle_width as f64;
    let height = puzzle_height as f64;

    let h_pos = if x < width * 0.33 {
        "left"
    } else if x < width * 0.67 {
        "center"
    } else {
        "right"
    };
    let v_pos = if y < height * 0.33 {
        "upper"
    } else if y < height * 0.67 {
        "middle"
    } else {
        "lower"
    };

    let position = match (v_pos, h_pos) {
        ("middle", "center") => "Center area".to_string(),
        ("middle", side) => format!("{} side", capitalize(side)),
        (row, "center") => format!("{} area", capitalize(row)),
        (row, side) => format!("{}-{} quadrant", capitalize(row), side),
    };

    let rotation_text = match rotation {
        Rotation::R0 => "",
        Rotation::R90 => ", rotated 90° clockwise",
        Rotation::R180 => ", rotated 180°",
        Rotation::R270 => ", rotated 90° counter-clockwise",
    };

    format!("{position}{rotation_text}")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
