//! # Error Module
//!
//! Typed errors for the camera media validator.
//!
//! ## Design Principles
//! - **Never panic** on captured media - return errors instead
//! - **Include context** - paths, commands, what went wrong
//! - **Keep capture defects apart from quality defects** - a file that cannot
//!   be decoded is an error, not a FAIL verdict

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum QaError {
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Quarantine error: {0}")]
    Quarantine(#[from] QuarantineError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised while enumerating artifacts. These abort the whole batch.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Invalid path (neither a file nor a directory): {path}")]
    InvalidPath { path: PathBuf },

    #[error("No images or videos found in: {path}")]
    NoArtifactsFound { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while loading a single artifact
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Media file does not exist: {path}")]
    NotFound { path: PathBuf },

    #[error("Unable to decode {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Failed to open media file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while relocating a failing artifact
#[derive(Error, Debug)]
pub enum QuarantineError {
    #[error("Failed to create quarantine directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} into quarantine at {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to clear quarantine directory {path}: {source}")]
    Clear {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the session report writer
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to create report directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the device transport
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Failed to run `{command}`: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("No *.{extension} files found under {remote_dir} on the device")]
    NoMediaOnDevice {
        remote_dir: String,
        extension: String,
    },

    #[error("Failed to prepare local directory {path}: {source}")]
    LocalDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, QaError>;
