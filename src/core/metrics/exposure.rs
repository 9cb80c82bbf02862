//! Exposure, white balance and focus checks (the "3A" checks).
//!
//! - **AE**: mean luminance must sit inside a brightness window
//! - **AWB**: the three channel means must agree pairwise within a tolerance
//! - **AF**: variance of the Laplacian of luminance must reach a threshold
//!
//! White balance is judged by relative channel agreement, never by one
//! channel's absolute value. That is strict for neutral gray targets and can
//! false-fail on scenes dominated by a natural color.

use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

use super::{channel_means, load_artifact, luma_plane, mean_luma};
use crate::error::MediaError;

/// Pass/fail limits for the 3A checks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Inclusive (min, max) mean luminance
    pub brightness_range: (f64, f64),
    /// Maximum pairwise channel-mean difference (exclusive)
    pub wb_tolerance: f64,
    /// Minimum Laplacian variance
    pub sharpness_threshold: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            brightness_range: (50.0, 200.0),
            wb_tolerance: 25.0,
            sharpness_threshold: 80.0,
        }
    }
}

/// Mean of each color channel (0-255)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RgbMeans {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl RgbMeans {
    /// Largest absolute difference between any two channels
    pub fn max_pairwise_difference(&self) -> f64 {
        (self.r - self.g)
            .abs()
            .max((self.g - self.b).abs())
            .max((self.r - self.b).abs())
    }
}

impl fmt::Display for RgbMeans {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.r, self.g, self.b)
    }
}

/// 3A measurements for one image.
///
/// The verdict booleans are derived from the numbers and thresholds in
/// [`MetricReport::evaluate`] and cannot be set any other way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricReport {
    brightness: f64,
    rgb_means: RgbMeans,
    sharpness: f64,
    exposure_ok: bool,
    white_balance_ok: bool,
    focus_ok: bool,
}

impl MetricReport {
    /// Apply thresholds to raw measurements
    pub fn evaluate(
        brightness: f64,
        rgb_means: RgbMeans,
        sharpness: f64,
        thresholds: &QualityThresholds,
    ) -> Self {
        let (min, max) = thresholds.brightness_range;
        let tolerance = thresholds.wb_tolerance;

        Self {
            brightness,
            rgb_means,
            sharpness,
            exposure_ok: (min..=max).contains(&brightness),
            white_balance_ok: (rgb_means.r - rgb_means.g).abs() < tolerance
                && (rgb_means.g - rgb_means.b).abs() < tolerance
                && (rgb_means.r - rgb_means.b).abs() < tolerance,
            focus_ok: sharpness >= thresholds.sharpness_threshold,
        }
    }

    pub fn brightness(&self) -> f64 {
        self.brightness
    }

    pub fn rgb_means(&self) -> RgbMeans {
        self.rgb_means
    }

    pub fn sharpness(&self) -> f64 {
        self.sharpness
    }

    pub fn exposure_ok(&self) -> bool {
        self.exposure_ok
    }

    pub fn white_balance_ok(&self) -> bool {
        self.white_balance_ok
    }

    pub fn focus_ok(&self) -> bool {
        self.focus_ok
    }
}

/// Measure exposure, white balance and focus on a decoded image.
///
/// Pure: the same buffer and thresholds always give bit-identical results.
pub fn check_exposure_white_balance_focus(
    image: &RgbImage,
    thresholds: &QualityThresholds,
) -> MetricReport {
    let gray = luma_plane(image);
    let brightness = mean_luma(&gray);
    let rgb_means = channel_means(image);
    let sharpness = laplacian_variance(&gray);

    MetricReport::evaluate(brightness, rgb_means, sharpness, thresholds)
}

/// Variance of the Laplacian response as a measure of sharpness
///
/// Kernel `[0, 1, 0; 1, -4, 1; 0, 1, 0]` applied to every pixel, with borders
/// mirrored without repeating the edge pixel. Sharp images have strong edges
/// and therefore a widely spread response.
///
/// Measured at native resolution in two passes over the plane (mean, then
/// squared deviations) with no per-pixel buffer.
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    let n = u64::from(width) * u64::from(height);
    if n == 0 {
        return 0.0;
    }

    let w = i64::from(width);
    let h = i64::from(height);
    let at = |x: i64, y: i64| -> f64 {
        f64::from(gray.get_pixel(reflect_101(x, w) as u32, reflect_101(y, h) as u32)[0])
    };
    let response = |x: i64, y: i64| -> f64 {
        at(x, y - 1) + at(x, y + 1) + at(x - 1, y) + at(x + 1, y) - 4.0 * at(x, y)
    };
    let fold = |f: &dyn Fn(f64) -> f64| -> f64 {
        let mut total = 0.0;
        for y in 0..h {
            for x in 0..w {
                total += f(response(x, y));
            }
        }
        total
    };

    let count = n as f64;
    let mean = fold(&|v| v) / count;
    fold(&|v| (v - mean).powi(2)) / count
}

/// Mirror an out-of-range index back inside `0..len` (`gfedcb|abcdefgh|gfedcba`)
fn reflect_101(index: i64, len: i64) -> i64 {
    if len == 1 {
        return 0;
    }
    if index < 0 {
        -index
    } else if index >= len {
        2 * len - 2 - index
    } else {
        index
    }
}

/// Runs the 3A checks against files with a fixed set of thresholds
#[derive(Debug, Clone, Default)]
pub struct QualityAnalyzer {
    thresholds: QualityThresholds,
}

impl QualityAnalyzer {
    /// Create a new analyzer with custom thresholds
    pub fn new(thresholds: QualityThresholds) -> Self {
        Self { thresholds }
    }

    /// Load the image at its current path and measure it
    pub fn check_file(&self, path: &Path) -> Result<MetricReport, MediaError> {
        let image = load_artifact(path)?;
        let report = self.check_image(&image);
        debug!(
            path = %path.display(),
            brightness = report.brightness(),
            rgb = %report.rgb_means(),
            sharpness = report.sharpness(),
            "3A metrics"
        );
        Ok(report)
    }

    /// Measure a decoded image
    pub fn check_image(&self, image: &RgbImage) -> MetricReport {
        check_exposure_white_balance_focus(image, &self.thresholds)
    }
}
