//! Deterministic fallback provider.
//!
//! Used in tests and in deployments where no embedding model is wired in.
//! The color and shape features follow the same recipes a model-backed
//! provider would use (HSV histogram, gradient orientations, Hu moments);
//! only the embedding is substituted, with a grid-pooled luminance vector
//! that stays orientation-sensitive and L2-normalized.

use std::f32::consts::PI;

use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::normalize::l2_normalize_in_place;
use crate::provider::{DescriptorProvider, ProviderError};
use crate::types::{
    is_degenerate, Descriptor, DescriptorQuality, Extraction, ShapeFeatures, COLOR_HIST_BINS,
    COLOR_HIST_LEN, EDGE_HIST_LEN, HU_MOMENTS_LEN,
};

/// Tuning knobs for [`StubProvider`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StubConfig {
    /// Side length of the pooling grid for the stand-in embedding; the
    /// embedding dimension is `pool_grid²`.
    #[serde(default = "StubConfig::default_pool_grid")]
    pub pool_grid: usize,
}

impl StubConfig {
    pub(crate) fn default_pool_grid() -> usize {
        8
    }
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            pool_grid: Self::default_pool_grid(),
        }
    }
}

/// Deterministic pixel-statistics provider.
#[derive(Debug, Clone, Default)]
pub struct StubProvider {
    cfg: StubConfig,
}

impl StubProvider {
    pub fn new(cfg: StubConfig) -> Self {
        Self { cfg }
    }
}

impl DescriptorProvider for StubProvider {
    fn extract(&self, image: &RgbImage) -> Result<Extraction, ProviderError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ProviderError::UnsupportedInput("empty image".into()));
        }

        let mut quality = DescriptorQuality::clean();
        let gray = luma_plane(image);

        let color_hist = color_histogram(image);

        let shape = shape_features(&gray, image.width(), image.height());
        if is_degenerate(&shape.edge_hist) && is_degenerate(&shape.hu_moments) {
            quality.shape_degraded = true;
            warn!(
                width = image.width(),
                height = image.height(),
                "image too small for shape features, returning zeroed vectors"
            );
        }

        let embedding = pooled_embedding(&gray, image.width(), image.height(), self.cfg.pool_grid);
        if is_degenerate(&embedding) {
            quality.embedding_degraded = true;
            warn!("pooled embedding is degenerate (uniform black input)");
        }

        Ok(Extraction {
            descriptor: Descriptor {
                color_hist,
                shape,
                embedding,
            },
            quality,
        })
    }
}

/// BT.601 luminance plane, row-major.
fn luma_plane(image: &RgbImage) -> Vec<f32> {
    image
        .pixels()
        .map(|p| 0.299 * p.0[0] as f32 + 0.587 * p.0[1] as f32 + 0.114 * p.0[2] as f32)
        .collect()
}

/// HSV in OpenCV's byte conventions: hue halved into `[0, 180)`, saturation
/// and value in `[0, 255]`.
fn rgb_to_hsv([r, g, b]: [u8; 3]) -> (f32, f32, f32) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let sat = if max == 0.0 { 0.0 } else { delta / max };

    (hue / 2.0, sat * 255.0, max * 255.0)
}

fn color_histogram(image: &RgbImage) -> Vec<f32> {
    let (hb, sb, vb) = COLOR_HIST_BINS;
    let mut hist = vec![0.0f32; COLOR_HIST_LEN];
    for px in image.pixels() {
        let (h, s, v) = rgb_to_hsv(px.0);
        let hi = ((h as usize * hb) / 180).min(hb - 1);
        let si = ((s as usize * sb) / 256).min(sb - 1);
        let vi = ((v as usize * vb) / 256).min(vb - 1);
        hist[(hi * sb + si) * vb + vi] += 1.0;
    }
    l2_normalize_in_place(&mut hist);
    hist
}

fn shape_features(gray: &[f32], width: u32, height: u32) -> ShapeFeatures {
    let mut edge_hist = vec![0.0f32; EDGE_HIST_LEN];

    if width >= 3 && height >= 3 {
        let w = width as usize;
        for y in 1..height as usize - 1 {
            for x in 1..w - 1 {
                let gx = gray[y * w + x + 1] - gray[y * w + x - 1];
                let gy = gray[(y + 1) * w + x] - gray[(y - 1) * w + x];
                let theta = gy.atan2(gx);
                let bin = (((theta + PI) / (2.0 * PI)) * EDGE_HIST_LEN as f32) as usize;
                edge_hist[bin.min(EDGE_HIST_LEN - 1)] += 1.0;
            }
        }
        l2_normalize_in_place(&mut edge_hist);
    }

    ShapeFeatures {
        hu_moments: hu_moments(gray, width, height),
        edge_hist,
    }
}

/// The seven Hu invariants of the intensity image, log-scaled with sign
/// preserved for numerical stability.
fn hu_moments(gray: &[f32], width: u32, height: u32) -> Vec<f32> {
    let w = width as usize;
    let (mut m00, mut m10, mut m01) = (0.0f64, 0.0f64, 0.0f64);
    let (mut m11, mut m20, mut m02) = (0.0f64, 0.0f64, 0.0f64);
    let (mut m21, mut m12, mut m30, mut m03) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);

    for y in 0..height as usize {
        let yf = y as f64;
        for x in 0..w {
            let i = gray[y * w + x] as f64;
            let xf = x as f64;
            m00 += i;
            m10 += xf * i;
            m01 += yf * i;
            m11 += xf * yf * i;
            m20 += xf * xf * i;
            m02 += yf * yf * i;
            m21 += xf * xf * yf * i;
            m12 += xf * yf * yf * i;
            m30 += xf * xf * xf * i;
            m03 += yf * yf * yf * i;
        }
    }

    if m00 == 0.0 {
        return vec![0.0; HU_MOMENTS_LEN];
    }

    let cx = m10 / m00;
    let cy = m01 / m00;
    let mu11 = m11 - cx * m01;
    let mu20 = m20 - cx * m10;
    let mu02 = m02 - cy * m01;
    let mu30 = m30 - 3.0 * cx * m20 + 2.0 * cx * cx * m10;
    let mu03 = m03 - 3.0 * cy * m02 + 2.0 * cy * cy * m01;
    let mu21 = m21 - 2.0 * cx * m11 - cy * m20 + 2.0 * cx * cx * m01;
    let mu12 = m12 - 2.0 * cy * m11 - cx * m02 + 2.0 * cy * cy * m10;

    let norm = |mu: f64, order: i32| mu / m00.powf(1.0 + order as f64 / 2.0);
    let n11 = norm(mu11, 2);
    let n20 = norm(mu20, 2);
    let n02 = norm(mu02, 2);
    let n30 = norm(mu30, 3);
    let n03 = norm(mu03, 3);
    let n21 = norm(mu21, 3);
    let n12 = norm(mu12, 3);

    let h1 = n20 + n02;
    let h2 = (n20 - n02).powi(2) + 4.0 * n11 * n11;
    let h3 = (n30 - 3.0 * n12).powi(2) + (3.0 * n21 - n03).powi(2);
    let h4 = (n30 + n12).powi(2) + (n21 + n03).powi(2);
    let h5 = (n30 - 3.0 * n12)
        * (n30 + n12)
        * ((n30 + n12).powi(2) - 3.0 * (n21 + n03).powi(2))
        + (3.0 * n21 - n03) * (n21 + n03) * (3.0 * (n30 + n12).powi(2) - (n21 + n03).powi(2));
    let h6 = (n20 - n02) * ((n30 + n12).powi(2) - (n21 + n03).powi(2))
        + 4.0 * n11 * (n30 + n12) * (n21 + n03);
    let h7 = (3.0 * n21 - n03)
        * (n30 + n12)
        * ((n30 + n12).powi(2) - 3.0 * (n21 + n03).powi(2))
        - (n30 - 3.0 * n12) * (n21 + n03) * (3.0 * (n30 + n12).powi(2) - (n21 + n03).powi(2));

    [h1, h2, h3, h4, h5, h6, h7]
        .iter()
        .map(|&h| {
            let sign = if h > 0.0 {
                1.0
            } else if h < 0.0 {
                -1.0
            } else {
                0.0
            };
            (-sign * (h.abs() + 1e-10).log10()) as f32
        })
        .collect()
}

/// Mean luminance pooled over a `grid × grid` layout, mean-centered and
/// L2-normalized. Centering keeps the cosine between unrelated areas near
/// zero and makes uniform areas carry no signal at all.
fn pooled_embedding(gray: &[f32], width: u32, height: u32, grid: usize) -> Vec<f32> {
    if grid == 0 {
        return Vec::new();
    }
    let mut sums = vec![0.0f32; grid * grid];
    let mut counts = vec![0u32; grid * grid];
    let (w, h) = (width as usize, height as usize);

    for y in 0..h {
        let gy = (y * grid / h).min(grid - 1);
        for x in 0..w {
            let gx = (x * grid / w).min(grid - 1);
            let cell = gy * grid + gx;
            sums[cell] += gray[y * w + x];
            counts[cell] += 1;
        }
    }

    for (sum, &count) in sums.iter_mut().zip(&counts) {
        if count > 0 {
            *sum /= count as f32;
        }
    }
    let mean = sums.iter().sum::<f32>() / sums.len() as f32;
    for value in sums.iter_mut() {
        *value -= mean;
    }
    l2_normalize_in_place(&mut sums);
    sums
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::l2_norm;
    use image::Rgb;

    fn patterned(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 7 % 256) as u8,
                (y * 13 % 256) as u8,
                ((x + y) * 3 % 256) as u8,
            ])
        })
    }

    #[test]
    fn extraction_is_deterministic() {
        let provider = StubProvider::default();
        let image = patterned(64, 64);
        let a = provider.extract(&image).unwrap();
        let b = provider.extract(&image).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn descriptor_has_contract_lengths() {
        let provider = StubProvider::default();
        let extraction = provider.extract(&patterned(48, 32)).unwrap();
        let d = &extraction.descriptor;
        assert_eq!(d.color_hist.len(), COLOR_HIST_LEN);
        assert_eq!(d.shape.edge_hist.len(), EDGE_HIST_LEN);
        assert_eq!(d.shape.hu_moments.len(), HU_MOMENTS_LEN);
        assert_eq!(d.embedding.len(), 64);
        assert!(!extraction.quality.any_degraded());
    }

    #[test]
    fn embedding_is_unit_length() {
        let provider = StubProvider::default();
        let extraction = provider.extract(&patterned(100, 100)).unwrap();
        let norm = l2_norm(&extraction.descriptor.embedding);
        assert!((norm - 1.0).abs() < 1e-4, "norm={norm}");
    }

    #[test]
    fn different_pixels_produce_different_descriptors() {
        let provider = StubProvider::default();
        let a = provider.extract(&patterned(64, 64)).unwrap();
        let b = provider
            .extract(&RgbImage::from_pixel(64, 64, Rgb([200, 10, 10])))
            .unwrap();
        assert_ne!(a.descriptor.color_hist, b.descriptor.color_hist);
        assert_ne!(a.descriptor.embedding, b.descriptor.embedding);
    }

    #[test]
    fn empty_image_is_rejected() {
        let provider = StubProvider::default();
        let err = provider.extract(&RgbImage::new(0, 0)).unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedInput(_)));
    }

    #[test]
    fn black_image_degrades_embedding_not_the_call() {
        let provider = StubProvider::default();
        let extraction = provider
            .extract(&RgbImage::from_pixel(32, 32, Rgb([0, 0, 0])))
            .unwrap();
        assert!(extraction.quality.embedding_degraded);
        assert!(is_degenerate(&extraction.descriptor.embedding));
        // The color histogram still carries the all-black mass.
        assert!(!is_degenerate(&extraction.descriptor.color_hist));
    }

    #[test]
    fn rotation_changes_orientation_sensitive_features() {
        let provider = StubProvider::default();
        let image = patterned(64, 64);
        let rotated = image::imageops::rotate90(&image);
        let a = provider.extract(&image).unwrap().descriptor;
        let b = provider.extract(&rotated).unwrap().descriptor;
        assert_ne!(a.embedding, b.embedding);
        assert_ne!(a.shape.edge_hist, b.shape.edge_hist);
    }

    #[test]
    fn custom_pool_grid_sets_embedding_dim() {
        let provider = StubProvider::new(StubConfig { pool_grid: 4 });
        let extraction = provider.extract(&patterned(40, 40)).unwrap();
        assert_eq!(extraction.descriptor.embedding.len(), 16);
    }
}
