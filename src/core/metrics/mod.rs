//! # Metrics Module
//!
//! The metric engine: objective quality measurements computed from pixels.
//!
//! - `loader` - decodes an image file into an RGB buffer
//! - `exposure` - exposure, white balance and focus (the "3A" checks)
//! - `abnormal` - coarse black / green / purple frame detection
//! - `video` - container open and first-frame decode checks
//!
//! Every function that takes a path re-loads from that path. Callers must pass
//! the artifact's current location, which changes once it is quarantined.

pub mod abnormal;
pub mod exposure;
pub mod loader;
pub mod video;

pub use abnormal::{check_abnormal_color, AbnormalDetector, AbnormalThresholds, AbnormalVerdict};
pub use exposure::{
    check_exposure_white_balance_focus, MetricReport, QualityAnalyzer, QualityThresholds, RgbMeans,
};
pub use loader::{load_artifact, FastDecoder};
pub use video::{check_video_basic, FfprobeBackend, VideoBackend, VideoHandle, VideoMetadata, VideoReport};

use image::{GrayImage, RgbImage};

/// Convert RGB to 8-bit luminance with BT.601 weights.
///
/// Fixed-point form of `0.299 R + 0.587 G + 0.114 B`, rounded, so the gray
/// plane matches what camera and video tooling produce.
pub fn luma_plane(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let y = (u32::from(r) * 4899 + u32::from(g) * 9617 + u32::from(b) * 1868 + 8192) >> 14;
        image::Luma([y.min(255) as u8])
    })
}

/// Mean of a gray plane (0-255)
pub fn mean_luma(gray: &GrayImage) -> f64 {
    let n = u64::from(gray.width()) * u64::from(gray.height());
    if n == 0 {
        return 0.0;
    }
    let sum: u64 = gray.pixels().map(|p| u64::from(p[0])).sum();
    sum as f64 / n as f64
}

/// Per-channel means over the whole buffer
pub fn channel_means(image: &RgbImage) -> RgbMeans {
    let n = u64::from(image.width()) * u64::from(image.height());
    if n == 0 {
        return RgbMeans::default();
    }

    let mut sums = [0u64; 3];
    for pixel in image.pixels() {
        for (sum, value) in sums.iter_mut().zip(pixel.0) {
            *sum += u64::from(value);
        }
    }

    let n = n as f64;
    RgbMeans {
        r: sums[0] as f64 / n,
        g: sums[1] as f64 / n,
        b: sums[2] as f64 / n,
    }
}
