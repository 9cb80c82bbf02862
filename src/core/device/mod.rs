//! # Device Module
//!
//! Fetches freshly captured media from the device under test.
//!
//! The [`MediaSource`] trait is the seam between the session runner and the
//! transport. [`AdbMediaSource`] drives the `adb` command line tool; tests
//! substitute an in-memory source.

use crate::error::DeviceError;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, info, warn};

/// Camera roll on stock Android builds
pub const DEFAULT_REMOTE_DIR: &str = "/sdcard/DCIM/Camera";

/// Somewhere media can be pulled from
pub trait MediaSource {
    /// Copy every `*.<extension>` file into `local_dir`.
    ///
    /// Returns the local paths of the files that actually arrived.
    fn pull(&self, extension: &str, local_dir: &Path) -> Result<Vec<PathBuf>, DeviceError>;

    /// Delete every `*.<extension>` file at the source
    fn clear(&self, extension: &str) -> Result<(), DeviceError>;
}

/// Pulls media from an Android device over `adb`
#[derive(Debug, Clone)]
pub struct AdbMediaSource {
    device_id: String,
    remote_dir: String,
    binary: String,
}

impl AdbMediaSource {
    pub fn new(device_id: impl Into<String>, remote_dir: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            remote_dir: remote_dir.into().trim_end_matches('/').to_string(),
            binary: "adb".to_string(),
        }
    }

    /// Use a specific `adb` executable
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn remote_dir(&self) -> &str {
        &self.remote_dir
    }

    fn remote_glob(&self, extension: &str) -> String {
        format!("{}/*.{}", self.remote_dir, extension)
    }

    /// Arguments for listing matching files on the device
    pub fn build_list_args(&self, extension: &str) -> Vec<String> {
        vec![
            "-s".to_string(),
            self.device_id.clone(),
            "shell".to_string(),
            "ls".to_string(),
            self.remote_glob(extension),
        ]
    }

    /// Arguments for pulling one remote file to a local path
    pub fn build_pull_args(&self, remote_file: &str, local_path: &Path) -> Vec<String> {
        vec![
            "-s".to_string(),
            self.device_id.clone(),
            "pull".to_string(),
            remote_file.to_string(),
            local_path.to_string_lossy().to_string(),
        ]
    }

    /// Arguments for deleting matching files on the device
    pub fn build_clear_args(&self, extension: &str) -> Vec<String> {
        vec![
            "-s".to_string(),
            self.device_id.clone(),
            "shell".to_string(),
            "rm".to_string(),
            self.remote_glob(extension),
        ]
    }

    fn run(&self, args: &[String]) -> Result<Output, DeviceError> {
        debug!(binary = %self.binary, args = ?args, "running adb");
        Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| DeviceError::CommandFailed {
                command: format!("{} {}", self.binary, args.join(" ")),
                reason: e.to_string(),
            })
    }
}

/// Remote paths from `adb shell ls` output.
///
/// `ls` reports a missing glob on stdout on some devices, so those lines are
/// dropped.
pub fn parse_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.contains("No such file or directory"))
        .map(String::from)
        .collect()
}

impl MediaSource for AdbMediaSource {
    fn pull(&self, extension: &str, local_dir: &Path) -> Result<Vec<PathBuf>, DeviceError> {
        let output = self.run(&self.build_list_args(extension))?;
        let remote_files = parse_listing(&String::from_utf8_lossy(&output.stdout));

        if remote_files.is_empty() {
            return Err(DeviceError::NoMediaOnDevice {
                remote_dir: self.remote_dir.clone(),
                extension: extension.to_string(),
            });
        }

        fs::create_dir_all(local_dir).map_err(|e| DeviceError::LocalDir {
            path: local_dir.to_path_buf(),
            source: e,
        })?;

        let mut local_files = Vec::with_capacity(remote_files.len());
        for remote_file in &remote_files {
            let Some(file_name) = Path::new(remote_file).file_name() else {
                warn!(remote = %remote_file, "skipping listing entry without a file name");
                continue;
            };
            let local_path = local_dir.join(file_name);

            info!(remote = %remote_file, local = %local_path.display(), "pulling");
            if let Err(e) = self.run(&self.build_pull_args(remote_file, &local_path)) {
                warn!(remote = %remote_file, error = %e, "pull failed");
            }

            if local_path.exists() {
                local_files.push(local_path);
            } else {
                warn!(remote = %remote_file, "file did not arrive");
            }
        }

        Ok(local_files)
    }

    fn clear(&self, extension: &str) -> Result<(), DeviceError> {
        let output = self.run(&self.build_clear_args(extension))?;
        if !output.status.success() {
            // Nothing to delete is not an error worth stopping for
            warn!(
                glob = %self.remote_glob(extension),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "adb rm reported a problem"
            );
        }
        Ok(())
    }
}

/// Delete local files whose extension is in `extensions`.
///
/// A missing directory is fine. Files that cannot be removed are logged and
/// skipped. Returns how many were removed.
pub fn clear_local_files(local_dir: &Path, extensions: &[&str]) -> Result<usize, DeviceError> {
    if !local_dir.exists() {
        return Ok(0);
    }

    let entries = fs::read_dir(local_dir).map_err(|e| DeviceError::LocalDir {
        path: local_dir.to_path_buf(),
        source: e,
    })?;

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)));
        if !path.is_file() || !matches {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove local file"),
        }
    }

    debug!(dir = %local_dir.display(), removed, "local media cleared");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source() -> AdbMediaSource {
        AdbMediaSource::new("R5CT1234", "/sdcard/DCIM/Camera/")
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(source().remote_dir(), "/sdcard/DCIM/Camera");
        assert_eq!(source().device_id(), "R5CT1234");
    }

    #[test]
    fn list_args_target_device_and_glob() {
        assert_eq!(
            source().build_list_args("jpg"),
            vec!["-s", "R5CT1234", "shell", "ls", "/sdcard/DCIM/Camera/*.jpg"]
        );
    }

    #[test]
    fn pull_args_name_local_path() {
        let args = source().build_pull_args(
            "/sdcard/DCIM/Camera/IMG_1.jpg",
            Path::new("/tmp/output/IMG_1.jpg"),
        );
        assert_eq!(
            args,
            vec![
                "-s",
                "R5CT1234",
                "pull",
                "/sdcard/DCIM/Camera/IMG_1.jpg",
                "/tmp/output/IMG_1.jpg"
            ]
        );
    }

    #[test]
    fn clear_args_use_rm() {
        assert_eq!(source().build_clear_args("mp4")[3], "rm");
        assert_eq!(source().build_clear_args("mp4")[4], "/sdcard/DCIM/Camera/*.mp4");
    }

    #[test]
    fn listing_drops_blanks_and_ls_errors() {
        let stdout = "/sdcard/DCIM/Camera/a.jpg\r\n\n/sdcard/DCIM/Camera/b.jpg\n";
        assert_eq!(
            parse_listing(stdout),
            vec!["/sdcard/DCIM/Camera/a.jpg", "/sdcard/DCIM/Camera/b.jpg"]
        );
        assert!(parse_listing("ls: /sdcard/DCIM/Camera/*.mp4: No such file or directory").is_empty());
    }

    #[test]
    fn missing_adb_binary_is_a_command_failure() {
        let temp = TempDir::new().unwrap();
        let source = source().with_binary("definitely-not-adb-binary");

        let result = source.pull("jpg", temp.path());

        assert!(matches!(result, Err(DeviceError::CommandFailed { .. })));
    }

    #[test]
    fn clear_local_files_matches_extensions() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.jpg"), b"x").unwrap();
        fs::write(temp.path().join("b.MP4"), b"x").unwrap();
        fs::write(temp.path().join("keep.txt"), b"x").unwrap();

        let removed = clear_local_files(temp.path(), &["jpg", "mp4"]).unwrap();

        assert_eq!(removed, 2);
        assert!(temp.path().join("keep.txt").exists());
    }

    #[test]
    fn clear_local_files_without_dir() {
        let temp = TempDir::new().unwrap();
        assert_eq!(clear_local_files(&temp.path().join("nope"), &["jpg"]).unwrap(), 0);
    }
}
