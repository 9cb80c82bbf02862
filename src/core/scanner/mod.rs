//! # Scanner Module
//!
//! Discovers captured artifacts to validate.
//!
//! ## Supported Formats
//! - Images: JPEG (.jpg)
//! - Videos: MP4 (.mp4), QuickTime (.mov), AVI (.avi), Matroska (.mkv)
//!
//! Extensions match case-insensitively, so `IMG_0001.JPG` is picked up too.
//!
//! ## Ordering
//! Discovery order is part of the contract: a test against a fixed directory
//! always sees the same sequence. Images come first, sorted by name, then
//! videos grouped by container in the order listed above.
//!
//! ## Example
//! ```rust,ignore
//! use camera_media_qa::core::scanner::discover_artifacts;
//!
//! let artifacts = discover_artifacts(Path::new("/home/qa/output"))?;
//! ```

mod filter;
mod walker;

pub use filter::{ArtifactFilter, VIDEO_EXTENSIONS};
pub use walker::{DirectoryScanner, ScanConfig};

use crate::error::DiscoveryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A captured file under validation. Identity is the path it was found at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Where discovery found the file
    pub path: PathBuf,
    /// Image or video
    pub kind: ArtifactKind,
}

/// Discriminant that routes an artifact to image or video checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Image,
    Video,
}

impl ArtifactKind {
    /// Infer the kind from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        if ext == "jpg" {
            Some(ArtifactKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(ArtifactKind::Video)
        } else {
            None
        }
    }

    /// Infer the kind from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Image => write!(f, "image"),
            ArtifactKind::Video => write!(f, "video"),
        }
    }
}

/// Enumerate the artifacts at `path` with the default scanner configuration.
///
/// A file yields itself; a directory yields its top-level images then videos.
pub fn discover_artifacts(path: &Path) -> Result<Vec<Artifact>, DiscoveryError> {
    DirectoryScanner::new(ScanConfig::default()).discover(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension_lowercase() {
        assert_eq!(ArtifactKind::from_extension("jpg"), Some(ArtifactKind::Image));
        assert_eq!(ArtifactKind::from_extension("mp4"), Some(ArtifactKind::Video));
        assert_eq!(ArtifactKind::from_extension("mov"), Some(ArtifactKind::Video));
        assert_eq!(ArtifactKind::from_extension("avi"), Some(ArtifactKind::Video));
        assert_eq!(ArtifactKind::from_extension("mkv"), Some(ArtifactKind::Video));
    }

    #[test]
    fn kind_from_extension_uppercase() {
        assert_eq!(ArtifactKind::from_extension("JPG"), Some(ArtifactKind::Image));
        assert_eq!(ArtifactKind::from_extension("MP4"), Some(ArtifactKind::Video));
    }

    #[test]
    fn unsupported_extensions_have_no_kind() {
        assert_eq!(ArtifactKind::from_extension("png"), None);
        assert_eq!(ArtifactKind::from_extension("jpeg"), None);
        assert_eq!(ArtifactKind::from_extension("txt"), None);
        assert_eq!(ArtifactKind::from_path(Path::new("/output/noext")), None);
    }

    #[test]
    fn kind_displays_lowercase() {
        assert_eq!(ArtifactKind::Image.to_string(), "image");
        assert_eq!(ArtifactKind::Video.to_string(), "video");
    }
}
