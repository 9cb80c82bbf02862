//! # Quarantine Module
//!
//! Moves failing images into a dedicated directory so the evidence can be
//! inspected after the run.
//!
//! Files are moved, never copied: once an image fails, the only copy lives in
//! the quarantine directory and every failure description points there.

use crate::error::QuarantineError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extensions removed when a new session clears old evidence
const SESSION_EXTENSIONS: &[&str] = &["jpg", "mp4"];

/// Handle on the quarantine directory
#[derive(Debug, Clone)]
pub struct Quarantine {
    dir: PathBuf,
}

impl Quarantine {
    /// Create a handle. The directory is created lazily on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The quarantine directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if it does not exist yet
    pub fn ensure_dir(&self) -> Result<(), QuarantineError> {
        fs::create_dir_all(&self.dir).map_err(|e| QuarantineError::CreateDir {
            path: self.dir.clone(),
            source: e,
        })
    }

    /// Whether `path` already lives inside the quarantine directory
    pub fn contains(&self, path: &Path) -> bool {
        path.parent().is_some_and(|parent| parent == self.dir)
    }

    /// Move `path` into the quarantine directory, keeping its file name.
    ///
    /// Returns the new location. A file already in quarantine is returned
    /// unchanged. An existing file with the same name is replaced.
    pub fn relocate(&self, path: &Path) -> Result<PathBuf, QuarantineError> {
        if self.contains(path) {
            return Ok(path.to_path_buf());
        }

        self.ensure_dir()?;

        let file_name = path.file_name().ok_or_else(|| QuarantineError::Move {
            from: path.to_path_buf(),
            to: self.dir.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        })?;
        let dest = self.dir.join(file_name);

        move_file(path, &dest).map_err(|e| QuarantineError::Move {
            from: path.to_path_buf(),
            to: dest.clone(),
            source: e,
        })?;

        info!(from = %path.display(), to = %dest.display(), "quarantined");
        Ok(dest)
    }

    /// Remove evidence left over from a previous session.
    ///
    /// Only `.jpg` and `.mp4` files are removed. A file that cannot be
    /// removed is logged and skipped. Returns how many files were removed.
    pub fn clear_session(&self) -> Result<usize, QuarantineError> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| QuarantineError::Clear {
            path: self.dir.clone(),
            source: e,
        })?;

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || !has_session_extension(&path) {
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "removed old quarantined file");
                    removed += 1;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove old quarantined file"),
            }
        }

        info!(dir = %self.dir.display(), removed, "quarantine cleared");
        Ok(removed)
    }
}

fn has_session_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| SESSION_EXTENSIONS.contains(&e.as_str()))
}

/// Rename, falling back to copy-verify-delete across filesystems
fn move_file(source: &Path, dest: &Path) -> std::io::Result<()> {
    fs::rename(source, dest).or_else(|_| {
        let source_size = fs::metadata(source)?.len();
        fs::copy(source, dest)?;

        let dest_size = fs::metadata(dest)?.len();
        if dest_size != source_size {
            let _ = fs::remove_file(dest);
            return Err(std::io::Error::other(format!(
                "copy verification failed: source {} bytes, dest {} bytes",
                source_size, dest_size
            )));
        }

        fs::remove_file(source)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(b"test content").unwrap();
        path
    }

    #[test]
    fn relocate_moves_file_and_creates_dir() {
        let temp = TempDir::new().unwrap();
        let src = write_file(temp.path(), "IMG_0001.jpg");
        let quarantine = Quarantine::new(temp.path().join("pic_fail"));

        let dest = quarantine.relocate(&src).unwrap();

        assert_eq!(dest, temp.path().join("pic_fail").join("IMG_0001.jpg"));
        assert!(dest.exists());
        assert!(!src.exists());
    }

    #[test]
    fn relocate_is_a_no_op_inside_quarantine() {
        let temp = TempDir::new().unwrap();
        let src = write_file(temp.path(), "IMG_0001.jpg");
        let quarantine = Quarantine::new(temp.path().join("pic_fail"));

        let first = quarantine.relocate(&src).unwrap();
        let second = quarantine.relocate(&first).unwrap();

        assert_eq!(first, second);
        assert!(second.exists());
    }

    #[test]
    fn relocate_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let quarantine = Quarantine::new(temp.path().join("pic_fail"));

        let result = quarantine.relocate(&temp.path().join("gone.jpg"));

        assert!(matches!(result, Err(QuarantineError::Move { .. })));
    }

    #[test]
    fn relocate_fails_when_dir_cannot_be_created() {
        let temp = TempDir::new().unwrap();
        let src = write_file(temp.path(), "IMG_0001.jpg");
        // A regular file where the directory should be
        let blocker = write_file(temp.path(), "pic_fail");
        let quarantine = Quarantine::new(&blocker);

        let result = quarantine.relocate(&src);

        assert!(matches!(result, Err(QuarantineError::CreateDir { .. })));
        assert!(src.exists());
    }

    #[test]
    fn clear_session_removes_only_media() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("pic_fail");
        fs::create_dir(&dir).unwrap();
        write_file(&dir, "old.jpg");
        write_file(&dir, "old.MP4");
        let notes = write_file(&dir, "notes.txt");

        let removed = Quarantine::new(&dir).clear_session().unwrap();

        assert_eq!(removed, 2);
        assert!(notes.exists());
    }

    #[test]
    fn clear_session_without_dir_is_fine() {
        let temp = TempDir::new().unwrap();
        let removed = Quarantine::new(temp.path().join("missing")).clear_session().unwrap();
        assert_eq!(removed, 0);
    }
}
