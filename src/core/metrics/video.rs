//! Basic video integrity: can the container be opened, and does the first
//! frame decode?
//!
//! Opening and decoding go through a [`VideoBackend`]. The default backend
//! shells out to `ffprobe` with JSON output. A handle is acquired per video,
//! read at most once, and dropped before the next artifact.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

use crate::error::MediaError;

/// Container-level facts about a video stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub fps: f64,
    pub frame_count: f64,
    pub width: u32,
    pub height: u32,
}

/// Result of the basic video checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoReport {
    /// Container opened and exposes a video stream
    pub open_ok: bool,
    /// First frame decoded. Always false when `open_ok` is false.
    pub read_ok: bool,
    pub fps: f64,
    pub frame_count: f64,
    pub width: u32,
    pub height: u32,
}

/// An opened video. Dropping it releases the underlying resources.
pub trait VideoHandle {
    /// Metadata reported by the container
    fn metadata(&self) -> VideoMetadata;

    /// Decode exactly one frame
    fn read_frame(&mut self) -> bool;
}

/// Something that can open video containers
///
/// Implement this to plug in another decoder, or a fake for tests.
pub trait VideoBackend {
    /// Open the container, or `None` if it cannot be opened
    fn open(&self, path: &Path) -> Option<Box<dyn VideoHandle + '_>>;
}

/// Open a video, read its first frame, and release it.
///
/// Fails with [`MediaError::NotFound`] when nothing exists at `path`. A video
/// that cannot be opened is not an error: it yields an all-false report.
pub fn check_video_basic(path: &Path, backend: &dyn VideoBackend) -> Result<VideoReport, MediaError> {
    if !path.exists() {
        return Err(MediaError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let Some(mut handle) = backend.open(path) else {
        debug!(path = %path.display(), "video could not be opened");
        return Ok(VideoReport::default());
    };

    let metadata = handle.metadata();
    let read_ok = handle.read_frame();
    drop(handle);

    debug!(
        path = %path.display(),
        read_ok,
        fps = metadata.fps,
        frame_count = metadata.frame_count,
        width = metadata.width,
        height = metadata.height,
        "video probed"
    );

    Ok(VideoReport {
        open_ok: true,
        read_ok,
        fps: metadata.fps,
        frame_count: metadata.frame_count,
        width: metadata.width,
        height: metadata.height,
    })
}

/// Video backend built on the `ffprobe` command-line tool
#[derive(Debug, Clone)]
pub struct FfprobeBackend {
    binary: PathBuf,
}

impl Default for FfprobeBackend {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffprobe"),
        }
    }
}

impl FfprobeBackend {
    /// Use a specific ffprobe executable
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run ffprobe and return stdout if it exited successfully
    fn run(&self, args: &[String]) -> Option<String> {
        let output = match Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                warn!(binary = %self.binary.display(), error = %e, "failed to execute ffprobe");
                return None;
            }
        };

        if !output.status.success() {
            debug!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "ffprobe rejected input"
            );
            return None;
        }

        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VideoBackend for FfprobeBackend {
    fn open(&self, path: &Path) -> Option<Box<dyn VideoHandle + '_>> {
        let json = self.run(&build_stream_probe_args(path))?;
        let metadata = parse_stream_probe(&json)?;
        Some(Box::new(FfprobeHandle {
            backend: self,
            path: path.to_path_buf(),
            metadata,
        }))
    }
}

struct FfprobeHandle<'a> {
    backend: &'a FfprobeBackend,
    path: PathBuf,
    metadata: VideoMetadata,
}

impl VideoHandle for FfprobeHandle<'_> {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    fn read_frame(&mut self) -> bool {
        self.backend
            .run(&build_frame_probe_args(&self.path))
            .is_some_and(|json| parse_frame_probe(&json))
    }
}

/// ffprobe arguments that describe the first video stream and the container
pub fn build_stream_probe_args(video_path: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-select_streams".to_string(),
        "v:0".to_string(),
        "-show_streams".to_string(),
        "-show_format".to_string(),
        "-of".to_string(),
        "json".to_string(),
        video_path.to_string_lossy().to_string(),
    ]
}

/// ffprobe arguments that decode exactly one frame of the first video stream
pub fn build_frame_probe_args(video_path: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-select_streams".to_string(),
        "v:0".to_string(),
        "-read_intervals".to_string(),
        "%+#1".to_string(),
        "-show_entries".to_string(),
        "frame=pict_type".to_string(),
        "-of".to_string(),
        "json".to_string(),
        video_path.to_string_lossy().to_string(),
    ]
}

/// Parse stream-probe JSON. `None` means there is no video stream to open.
///
/// When the container does not record a frame count it is estimated from
/// duration and frame rate.
pub fn parse_stream_probe(json: &str) -> Option<VideoMetadata> {
    let parsed: serde_json::Value = serde_json::from_str(json).ok()?;

    let stream = parsed
        .get("streams")?
        .as_array()?
        .iter()
        .find(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("video"))?;

    let dimension = |key: &str| {
        stream
            .get(key)
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0)
    };

    let fps = ["avg_frame_rate", "r_frame_rate"]
        .iter()
        .filter_map(|key| stream.get(*key).and_then(|v| v.as_str()))
        .map(parse_fps_fraction)
        .find(|fps| *fps > 0.0)
        .unwrap_or(0.0);

    let duration = stream
        .get("duration")
        .or_else(|| parsed.get("format").and_then(|f| f.get("duration")))
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<f64>().ok());

    let frame_count = stream
        .get("nb_frames")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| duration.map(|d| (d * fps).round()))
        .unwrap_or(0.0);

    Some(VideoMetadata {
        fps,
        frame_count,
        width: dimension("width"),
        height: dimension("height"),
    })
}

/// Parse frame-probe JSON: true when at least one frame was decoded
pub fn parse_frame_probe(json: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(json)
        .ok()
        .and_then(|v| v.get("frames").and_then(|f| f.as_array()).map(|f| !f.is_empty()))
        .unwrap_or(false)
}

/// Parse an FPS fraction string like "30/1" or "30000/1001"
fn parse_fps_fraction(fraction: &str) -> f64 {
    match fraction.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().unwrap_or(0.0);
            let den: f64 = den.parse().unwrap_or(0.0);
            if den > 0.0 {
                num / den
            } else {
                0.0
            }
        }
        None => fraction.parse().unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs::File;
    use tempfile::TempDir;

    struct FakeHandle<'a> {
        metadata: VideoMetadata,
        decodes: bool,
        reads: &'a Cell<usize>,
    }

    impl VideoHandle for FakeHandle<'_> {
        fn metadata(&self) -> VideoMetadata {
            self.metadata
        }

        fn read_frame(&mut self) -> bool {
            self.reads.set(self.reads.get() + 1);
            self.decodes
        }
    }

    struct FakeBackend {
        opens: bool,
        decodes: bool,
        reads: Cell<usize>,
    }

    impl FakeBackend {
        fn new(opens: bool, decodes: bool) -> Self {
            Self {
                opens,
                decodes,
                reads: Cell::new(0),
            }
        }
    }

    impl VideoBackend for FakeBackend {
        fn open(&self, _path: &Path) -> Option<Box<dyn VideoHandle + '_>> {
            self.opens.then(|| {
                Box::new(FakeHandle {
                    metadata: VideoMetadata {
                        fps: 30.0,
                        frame_count: 150.0,
                        width: 1920,
                        height: 1080,
                    },
                    decodes: self.decodes,
                    reads: &self.reads,
                }) as Box<dyn VideoHandle + '_>
            })
        }
    }

    fn video_file(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("VID_0001.mp4");
        File::create(&path).unwrap();
        path
    }

    #[test]
    fn missing_video_is_not_found() {
        let backend = FakeBackend::new(true, true);
        let result = check_video_basic(Path::new("/nonexistent/VID.mp4"), &backend);
        assert!(matches!(result, Err(MediaError::NotFound { .. })));
    }

    #[test]
    fn unopenable_video_reports_all_false_without_reading() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FakeBackend::new(false, true);

        let report = check_video_basic(&video_file(&temp_dir), &backend).unwrap();

        assert_eq!(report, VideoReport::default());
        assert_eq!(backend.reads.get(), 0);
    }

    #[test]
    fn healthy_video_reads_exactly_one_frame() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FakeBackend::new(true, true);

        let report = check_video_basic(&video_file(&temp_dir), &backend).unwrap();

        assert!(report.open_ok);
        assert!(report.read_ok);
        assert_eq!(report.width, 1920);
        assert_eq!(backend.reads.get(), 1);
    }

    #[test]
    fn metadata_survives_failed_decode() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FakeBackend::new(true, false);

        let report = check_video_basic(&video_file(&temp_dir), &backend).unwrap();

        assert!(report.open_ok);
        assert!(!report.read_ok);
        assert_eq!(report.fps, 30.0);
        assert_eq!(report.frame_count, 150.0);
    }

    #[test]
    fn missing_ffprobe_means_cannot_open() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FfprobeBackend::new("/nonexistent/bin/ffprobe-12345");

        let report = check_video_basic(&video_file(&temp_dir), &backend).unwrap();

        assert!(!report.open_ok);
        assert!(!report.read_ok);
    }

    #[test]
    fn stream_probe_args_end_with_path() {
        let args = build_stream_probe_args(Path::new("/tmp/video.mp4"));
        assert_eq!(args.len(), 9);
        assert_eq!(args[3], "v:0");
        assert_eq!(args.last().unwrap(), "/tmp/video.mp4");
    }

    #[test]
    fn frame_probe_reads_one_frame() {
        let args = build_frame_probe_args(Path::new("/tmp/video.mp4"));
        let pos = args.iter().position(|a| a == "-read_intervals").unwrap();
        assert_eq!(args[pos + 1], "%+#1");
    }

    #[test]
    fn parse_stream_probe_with_frame_count() {
        let json = r#"{
            "streams": [{
                "codec_type": "video",
                "width": 1920,
                "height": 1080,
                "avg_frame_rate": "30000/1001",
                "r_frame_rate": "30/1",
                "nb_frames": "299"
            }],
            "format": { "duration": "9.976" }
        }"#;

        let metadata = parse_stream_probe(json).unwrap();
        assert!((metadata.fps - 29.97).abs() < 0.01);
        assert_eq!(metadata.frame_count, 299.0);
        assert_eq!((metadata.width, metadata.height), (1920, 1080));
    }

    #[test]
    fn parse_stream_probe_estimates_frame_count() {
        let json = r#"{
            "streams": [{
                "codec_type": "video",
                "width": 1280,
                "height": 720,
                "avg_frame_rate": "0/0",
                "r_frame_rate": "25/1"
            }],
            "format": { "duration": "4.000000" }
        }"#;

        let metadata = parse_stream_probe(json).unwrap();
        assert_eq!(metadata.fps, 25.0);
        assert_eq!(metadata.frame_count, 100.0);
    }

    #[test]
    fn parse_stream_probe_without_video_stream() {
        let json = r#"{ "streams": [{ "codec_type": "audio" }], "format": {} }"#;
        assert!(parse_stream_probe(json).is_none());
        assert!(parse_stream_probe("not json").is_none());
    }

    #[test]
    fn parse_frame_probe_counts_frames() {
        assert!(parse_frame_probe(r#"{ "frames": [{ "pict_type": "I" }] }"#));
        assert!(!parse_frame_probe(r#"{ "frames": [] }"#));
        assert!(!parse_frame_probe("{}"));
    }

    #[test]
    fn fps_fraction_parsing() {
        assert_eq!(parse_fps_fraction("24/1"), 24.0);
        assert_eq!(parse_fps_fraction("0/0"), 0.0);
        assert_eq!(parse_fps_fraction("30"), 30.0);
    }
}
