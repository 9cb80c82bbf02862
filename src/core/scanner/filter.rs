//! File filtering logic for discovery.

use super::ArtifactKind;
use std::path::Path;

/// Video containers, in the order their groups appear in a batch.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

/// Decides which directory entries are artifacts
#[derive(Debug, Clone, Default)]
pub struct ArtifactFilter {
    /// Whether to include hidden files
    include_hidden: bool,
}

impl ArtifactFilter {
    /// Create a filter that skips hidden files
    pub fn new() -> Self {
        Self::default()
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Classify a path, or `None` if it is not an artifact
    pub fn classify(&self, path: &Path) -> Option<ArtifactKind> {
        if !self.include_hidden {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    return None;
                }
            }
        }

        ArtifactKind::from_path(path)
    }

    /// Position of a video's container group in the batch order
    pub fn video_group(&self, path: &Path) -> Option<usize> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        VIDEO_EXTENSIONS.iter().position(|candidate| *candidate == ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_includes_jpg_any_case() {
        let filter = ArtifactFilter::new();
        assert_eq!(
            filter.classify(Path::new("/output/IMG_0001.jpg")),
            Some(ArtifactKind::Image)
        );
        assert_eq!(
            filter.classify(Path::new("/output/IMG_0001.JPG")),
            Some(ArtifactKind::Image)
        );
    }

    #[test]
    fn filter_includes_videos() {
        let filter = ArtifactFilter::new();
        assert_eq!(
            filter.classify(Path::new("/output/VID_0001.mkv")),
            Some(ArtifactKind::Video)
        );
    }

    #[test]
    fn filter_excludes_hidden_by_default() {
        let filter = ArtifactFilter::new();
        assert_eq!(filter.classify(Path::new("/output/.pending.jpg")), None);
        assert!(ArtifactFilter::new()
            .with_hidden(true)
            .classify(Path::new("/output/.pending.jpg"))
            .is_some());
    }

    #[test]
    fn video_groups_follow_container_order() {
        let filter = ArtifactFilter::new();
        assert_eq!(filter.video_group(Path::new("a.mp4")), Some(0));
        assert_eq!(filter.video_group(Path::new("a.MOV")), Some(1));
        assert_eq!(filter.video_group(Path::new("a.avi")), Some(2));
        assert_eq!(filter.video_group(Path::new("a.mkv")), Some(3));
        assert_eq!(filter.video_group(Path::new("a.jpg")), None);
    }
}
