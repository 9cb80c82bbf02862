//! Validation policy: which checks run and with which thresholds.

use crate::core::metrics::{AbnormalThresholds, QualityThresholds};
use crate::error::QaError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which checks run on a batch, and their limits
///
/// Every field has a default, so a JSON file only needs the keys it changes:
///
/// ```json
/// { "check_focus": false, "quality": { "sharpness_threshold": 120.0 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Run the 3A bundle at all
    pub check_quality: bool,
    /// Fail on exposure (only when `check_quality`)
    pub check_exposure: bool,
    /// Fail on white balance (only when `check_quality`)
    pub check_white_balance: bool,
    /// Fail on focus (only when `check_quality`)
    pub check_focus: bool,
    /// Fail on black frames and color casts
    pub check_abnormal_color: bool,
    /// Fail on videos that cannot be opened or decoded
    pub check_video: bool,
    /// 3A thresholds
    pub quality: QualityThresholds,
    /// Abnormal frame thresholds
    pub abnormal: AbnormalThresholds,
    /// Where failing images are moved
    pub quarantine_dir: PathBuf,
    /// Include hidden files in directory discovery
    pub include_hidden: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            check_quality: true,
            check_exposure: true,
            check_white_balance: true,
            check_focus: true,
            check_abnormal_color: true,
            check_video: true,
            quality: QualityThresholds::default(),
            abnormal: AbnormalThresholds::default(),
            quarantine_dir: default_output_dir().join("pic_fail"),
            include_hidden: false,
        }
    }
}

impl ValidationConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, QaError> {
        let content = fs::read_to_string(path)
            .map_err(|e| QaError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| QaError::Config(format!("invalid config {}: {}", path.display(), e)))
    }
}

/// Default root for pulled media, quarantine and reports
pub fn default_output_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("camera-media-qa")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_enable_every_check() {
        let config = ValidationConfig::default();
        assert!(config.check_quality);
        assert!(config.check_exposure);
        assert!(config.check_white_balance);
        assert!(config.check_focus);
        assert!(config.check_abnormal_color);
        assert!(config.check_video);
        assert_eq!(config.quality.brightness_range, (50.0, 200.0));
        assert_eq!(config.abnormal.color_ratio, 1.5);
        assert!(config.quarantine_dir.ends_with("pic_fail"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ValidationConfig = serde_json::from_str(
            r#"{ "check_focus": false, "quality": { "sharpness_threshold": 120.0 } }"#,
        )
        .unwrap();

        assert!(!config.check_focus);
        assert!(config.check_exposure);
        assert_eq!(config.quality.sharpness_threshold, 120.0);
        assert_eq!(config.quality.wb_tolerance, 25.0);
    }

    #[test]
    fn from_json_file_reports_bad_input() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let result = ValidationConfig::from_json_file(file.path());
        assert!(matches!(result, Err(QaError::Config(_))));
    }

    #[test]
    fn from_json_file_reads_quarantine_dir() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{ "quarantine_dir": "/tmp/qa/pic_fail" }"#).unwrap();

        let config = ValidationConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.quarantine_dir, PathBuf::from("/tmp/qa/pic_fail"));
    }
}
