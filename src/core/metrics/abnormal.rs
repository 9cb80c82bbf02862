//! Abnormal frame detection: black frames and green or purple color casts.
//!
//! Labels are tried in a fixed order and the first match wins. An image dark
//! enough to be "black" is never also reported as a color cast.

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

use super::{channel_means, load_artifact, luma_plane, mean_luma, RgbMeans};
use crate::error::MediaError;

/// Limits for abnormal frame detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbnormalThresholds {
    /// Mean luminance below this is a black frame
    pub brightness_threshold: f64,
    /// How far one channel must dominate to count as a cast
    pub color_ratio: f64,
}

impl Default for AbnormalThresholds {
    fn default() -> Self {
        Self {
            brightness_threshold: 30.0,
            color_ratio: 1.5,
        }
    }
}

/// Coarse brightness/color defect classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbnormalVerdict {
    /// Nothing abnormal
    #[serde(rename = "none")]
    Normal,
    /// Frame is (nearly) black
    Black,
    /// Green channel dominates both red and blue
    Green,
    /// Red and blue together dominate green
    Purple,
}

/// Labels in evaluation order. Black must precede the casts.
const CHECK_ORDER: [AbnormalVerdict; 3] = [
    AbnormalVerdict::Black,
    AbnormalVerdict::Green,
    AbnormalVerdict::Purple,
];

impl AbnormalVerdict {
    /// Whether this image shows any defect
    pub fn is_abnormal(&self) -> bool {
        !matches!(self, AbnormalVerdict::Normal)
    }

    /// Lowercase label used in failure descriptions
    pub fn label(&self) -> &'static str {
        match self {
            AbnormalVerdict::Normal => "none",
            AbnormalVerdict::Black => "black",
            AbnormalVerdict::Green => "green",
            AbnormalVerdict::Purple => "purple",
        }
    }

    fn matches(&self, brightness: f64, means: &RgbMeans, thresholds: &AbnormalThresholds) -> bool {
        let ratio = thresholds.color_ratio;
        match self {
            AbnormalVerdict::Normal => true,
            AbnormalVerdict::Black => brightness < thresholds.brightness_threshold,
            AbnormalVerdict::Green => means.g > means.r * ratio && means.g > means.b * ratio,
            AbnormalVerdict::Purple => (means.r + means.b) / 2.0 > means.g * ratio,
        }
    }
}

impl fmt::Display for AbnormalVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a decoded image
pub fn check_abnormal_color(image: &RgbImage, thresholds: &AbnormalThresholds) -> AbnormalVerdict {
    let brightness = mean_luma(&luma_plane(image));
    let means = channel_means(image);

    CHECK_ORDER
        .into_iter()
        .find(|verdict| verdict.matches(brightness, &means, thresholds))
        .unwrap_or(AbnormalVerdict::Normal)
}

/// Runs abnormal detection against files with fixed thresholds
#[derive(Debug, Clone, Default)]
pub struct AbnormalDetector {
    thresholds: AbnormalThresholds,
}

impl AbnormalDetector {
    pub fn new(thresholds: AbnormalThresholds) -> Self {
        Self { thresholds }
    }

    /// Load the image at its current path and classify it
    pub fn classify_file(&self, path: &Path) -> Result<AbnormalVerdict, MediaError> {
        let image = load_artifact(path)?;
        let verdict = self.classify_image(&image);
        debug!(path = %path.display(), verdict = %verdict, "abnormal check");
        Ok(verdict)
    }

    pub fn classify_image(&self, image: &RgbImage) -> AbnormalVerdict {
        check_abnormal_color(image, &self.thresholds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(r: u8, g: u8, b: u8) -> RgbImage {
        RgbImage::from_pixel(16, 16, Rgb([r, g, b]))
    }

    #[test]
    fn mid_gray_is_normal() {
        let verdict = check_abnormal_color(&solid(125, 125, 125), &AbnormalThresholds::default());
        assert_eq!(verdict, AbnormalVerdict::Normal);
        assert!(!verdict.is_abnormal());
    }

    #[test]
    fn dark_frame_is_black() {
        let verdict = check_abnormal_color(&solid(10, 10, 10), &AbnormalThresholds::default());
        assert_eq!(verdict, AbnormalVerdict::Black);
    }

    #[test]
    fn black_wins_over_green_cast() {
        // Green dominates by far more than 1.5x but the frame is dark.
        let verdict = check_abnormal_color(&solid(2, 40, 2), &AbnormalThresholds::default());
        assert_eq!(verdict, AbnormalVerdict::Black);
    }

    #[test]
    fn black_wins_over_purple_cast() {
        let verdict = check_abnormal_color(&solid(60, 2, 60), &AbnormalThresholds::default());
        assert_eq!(verdict, AbnormalVerdict::Black);
    }

    #[test]
    fn green_cast_detected() {
        let verdict = check_abnormal_color(&solid(60, 200, 60), &AbnormalThresholds::default());
        assert_eq!(verdict, AbnormalVerdict::Green);
    }

    #[test]
    fn purple_cast_detected() {
        let verdict = check_abnormal_color(&solid(200, 60, 200), &AbnormalThresholds::default());
        assert_eq!(verdict, AbnormalVerdict::Purple);
    }

    #[test]
    fn green_requires_dominating_both_channels() {
        // Green beats blue by 1.5x but not red.
        let verdict = check_abnormal_color(&solid(150, 180, 100), &AbnormalThresholds::default());
        assert_eq!(verdict, AbnormalVerdict::Normal);
    }

    #[test]
    fn custom_thresholds_apply() {
        let strict = AbnormalThresholds {
            brightness_threshold: 130.0,
            color_ratio: 1.5,
        };
        assert_eq!(
            check_abnormal_color(&solid(125, 125, 125), &strict),
            AbnormalVerdict::Black
        );
    }

    #[test]
    fn labels_are_lowercase() {
        assert_eq!(AbnormalVerdict::Normal.to_string(), "none");
        assert_eq!(AbnormalVerdict::Purple.to_string(), "purple");
        assert_eq!(
            serde_json::to_string(&AbnormalVerdict::Normal).unwrap(),
            "\"none\""
        );
    }
}
