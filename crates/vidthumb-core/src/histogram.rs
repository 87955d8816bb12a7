use tracing::debug;

use crate::video::frame::{VideoFrame, BYTES_PER_PIXEL};

/// Pixels with a luminance below this count as dark.
pub const DARK_LUMINANCE_THRESHOLD: u8 = 15;

/// Pixel counts per luminance value, indexed 0..=255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; 256],
}

impl Default for Histogram {
    fn default() -> Self {
        Self { counts: [0; 256] }
    }
}

impl Histogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, luminance: u8, count: u64) {
        self.counts[luminance as usize] += count;
    }

    pub fn count(&self, luminance: u8) -> u64 {
        self.counts[luminance as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Non-empty buckets in ascending luminance order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        (0..=u8::MAX)
            .zip(self.counts.iter().copied())
            .filter(|&(_, count)| count > 0)
    }
}

/// Perceptual brightness of an RGB pixel (ITU-R BT.601 weights).
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    y.round().min(255.0) as u8
}

pub fn build_histogram(frame: &VideoFrame) -> Histogram {
    let mut histogram = Histogram::new();
    for row in frame.rows() {
        for px in row.chunks_exact(BYTES_PER_PIXEL) {
            histogram.add(luminance(px[0], px[1], px[2]), 1);
        }
    }

    debug!(
        width = frame.width(),
        height = frame.height(),
        total = histogram.total(),
        "built luminance histogram"
    );
    histogram
}

/// True when more than half of `num_pixels` are darker than
/// [`DARK_LUMINANCE_THRESHOLD`].
pub fn is_dark_image(num_pixels: u64, histogram: &Histogram) -> bool {
    let dark_pixels: u64 = (0..DARK_LUMINANCE_THRESHOLD)
        .map(|lum| histogram.count(lum))
        .sum();
    dark_pixels > num_pixels / 2
}
