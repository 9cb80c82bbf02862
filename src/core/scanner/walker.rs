//! Directory walking implementation using walkdir.

use super::{filter::ArtifactFilter, Artifact, ArtifactKind};
use crate::error::DiscoveryError;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Configuration for artifact discovery
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to include hidden files
    pub include_hidden: bool,
}

/// Discovers artifacts in a file or a single directory level
pub struct DirectoryScanner {
    filter: ArtifactFilter,
}

impl DirectoryScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        Self {
            filter: ArtifactFilter::new().with_hidden(config.include_hidden),
        }
    }

    /// Enumerate artifacts at `path` in batch order
    pub fn discover(&self, path: &Path) -> Result<Vec<Artifact>, DiscoveryError> {
        if path.is_file() {
            return match ArtifactKind::from_path(path) {
                Some(kind) => Ok(vec![Artifact {
                    path: path.to_path_buf(),
                    kind,
                }]),
                None => Err(DiscoveryError::NoArtifactsFound {
                    path: path.to_path_buf(),
                }),
            };
        }

        if !path.is_dir() {
            return Err(DiscoveryError::InvalidPath {
                path: path.to_path_buf(),
            });
        }

        let artifacts = self.scan_directory(path)?;
        if artifacts.is_empty() {
            return Err(DiscoveryError::NoArtifactsFound {
                path: path.to_path_buf(),
            });
        }

        debug!(path = %path.display(), count = artifacts.len(), "discovered artifacts");
        Ok(artifacts)
    }

    /// Top-level images sorted by name, then videos grouped by container
    fn scan_directory(&self, root: &Path) -> Result<Vec<Artifact>, DiscoveryError> {
        let mut images: Vec<PathBuf> = Vec::new();
        let mut video_groups: Vec<Vec<PathBuf>> =
            vec![Vec::new(); super::VIDEO_EXTENSIONS.len()];

        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry_result in walker {
            let entry = entry_result.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                DiscoveryError::ReadDirectory {
                    path,
                    source: e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
                }
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            match self.filter.classify(path) {
                Some(ArtifactKind::Image) => images.push(path.to_path_buf()),
                Some(ArtifactKind::Video) => {
                    if let Some(group) = self.filter.video_group(path) {
                        video_groups[group].push(path.to_path_buf());
                    }
                }
                None => {}
            }
        }

        let artifacts = images
            .into_iter()
            .map(|path| Artifact {
                path,
                kind: ArtifactKind::Image,
            })
            .chain(video_groups.into_iter().flatten().map(|path| Artifact {
                path,
                kind: ArtifactKind::Video,
            }))
            .collect();

        Ok(artifacts)
    }
}

impl Default for DirectoryScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        File::create(&path).unwrap();
        path
    }

    fn names(artifacts: &[Artifact]) -> Vec<String> {
        artifacts
            .iter()
            .map(|a| a.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn images_sorted_then_videos() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir, "b.jpg");
        touch(&temp_dir, "clip.mp4");
        touch(&temp_dir, "a.jpg");

        let artifacts = DirectoryScanner::default().discover(temp_dir.path()).unwrap();

        assert_eq!(names(&artifacts), vec!["a.jpg", "b.jpg", "clip.mp4"]);
        assert_eq!(artifacts[0].kind, ArtifactKind::Image);
        assert_eq!(artifacts[2].kind, ArtifactKind::Video);
    }

    #[test]
    fn videos_grouped_by_container() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir, "a.mkv");
        touch(&temp_dir, "b.mov");
        touch(&temp_dir, "c.mp4");
        touch(&temp_dir, "d.avi");
        touch(&temp_dir, "e.mp4");

        let artifacts = DirectoryScanner::default().discover(temp_dir.path()).unwrap();

        assert_eq!(
            names(&artifacts),
            vec!["c.mp4", "e.mp4", "b.mov", "d.avi", "a.mkv"]
        );
    }

    #[test]
    fn single_file_is_its_own_batch() {
        let temp_dir = TempDir::new().unwrap();
        let path = touch(&temp_dir, "VID_0001.mov");

        let artifacts = DirectoryScanner::default().discover(&path).unwrap();

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].path, path);
        assert_eq!(artifacts[0].kind, ArtifactKind::Video);
    }

    #[test]
    fn unsupported_single_file_finds_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = touch(&temp_dir, "notes.txt");

        let result = DirectoryScanner::default().discover(&path);

        assert!(matches!(result, Err(DiscoveryError::NoArtifactsFound { .. })));
    }

    #[test]
    fn empty_directory_finds_nothing() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir, "notes.txt");

        let result = DirectoryScanner::default().discover(temp_dir.path());

        assert!(matches!(result, Err(DiscoveryError::NoArtifactsFound { .. })));
    }

    #[test]
    fn nested_directories_are_not_walked() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("pic_fail");
        fs::create_dir(&nested).unwrap();
        File::create(nested.join("old.jpg")).unwrap();
        touch(&temp_dir, "new.jpg");

        let artifacts = DirectoryScanner::default().discover(temp_dir.path()).unwrap();

        assert_eq!(names(&artifacts), vec!["new.jpg"]);
    }

    #[test]
    fn hidden_files_skipped_by_default() {
        let temp_dir = TempDir::new().unwrap();
        touch(&temp_dir, ".partial.jpg");
        touch(&temp_dir, "done.jpg");

        let artifacts = DirectoryScanner::default().discover(temp_dir.path()).unwrap();
        assert_eq!(names(&artifacts), vec!["done.jpg"]);

        let scanner = DirectoryScanner::new(ScanConfig {
            include_hidden: true,
        });
        assert_eq!(scanner.discover(temp_dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn missing_path_is_invalid() {
        let result = DirectoryScanner::default().discover(Path::new("/nonexistent/path/12345"));

        assert!(matches!(result, Err(DiscoveryError::InvalidPath { .. })));
    }
}
