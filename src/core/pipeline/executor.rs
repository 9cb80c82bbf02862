//! Batch validation implementation.

use super::ValidationConfig;
use crate::core::metrics::{
    check_video_basic, AbnormalDetector, AbnormalVerdict, FfprobeBackend, MetricReport,
    QualityAnalyzer, VideoBackend, VideoReport,
};
use crate::core::quarantine::Quarantine;
use crate::core::reporter::{Status, Verdict};
use crate::core::scanner::{Artifact, ArtifactKind, DirectoryScanner, ScanConfig};
use crate::error::QaError;
use crate::events::{
    null_sender, BatchEvent, BatchSummary, DiscoveryEvent, Event, EventSender, ValidationEvent,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Where an artifact is in its validation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactState {
    /// Not measured yet
    Pending,
    /// Measured, no failure so far
    Checked,
    /// All enabled checks passed
    Passed,
    /// Failed and moved into quarantine
    Quarantined,
    /// Failed, but moving it aside did not work
    QuarantineFailed,
}

/// Everything learned about one artifact, kept whether it passed or not
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactRecord {
    /// Where discovery found the file
    pub original_path: PathBuf,
    /// Where the file is now
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub state: ArtifactState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abnormal: Option<AbnormalVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoReport>,
    /// Failure descriptions for this artifact, in check order
    pub failures: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarantine_error: Option<String>,
}

impl ArtifactRecord {
    fn pending(artifact: &Artifact) -> Self {
        Self {
            original_path: artifact.path.clone(),
            path: artifact.path.clone(),
            kind: artifact.kind,
            state: ArtifactState::Pending,
            metrics: None,
            abnormal: None,
            video: None,
            failures: Vec::new(),
            quarantine_error: None,
        }
    }

    /// No enabled check failed
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Mark the artifact as measured
    fn checked(&mut self) {
        if self.state == ArtifactState::Pending {
            self.state = ArtifactState::Checked;
        }
    }

    /// Record an image failure, quarantining on the first one.
    ///
    /// Later failures describe the artifact at its quarantined location.
    fn fail_image(&mut self, reason: String, quarantine: &Quarantine, events: &EventSender) {
        self.checked();
        if self.state == ArtifactState::Checked {
            match quarantine.relocate(&self.path) {
                Ok(dest) => {
                    events.send(Event::Validation(ValidationEvent::Quarantined {
                        from: self.path.clone(),
                        to: dest.clone(),
                    }));
                    self.path = dest;
                    self.state = ArtifactState::Quarantined;
                }
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "quarantine failed, keeping evidence in place");
                    events.send(Event::Validation(ValidationEvent::QuarantineFailed {
                        path: self.path.clone(),
                        message: e.to_string(),
                    }));
                    self.quarantine_error = Some(e.to_string());
                    self.state = ArtifactState::QuarantineFailed;
                }
            }
        }

        self.record_failure(format!("{}: {}", reason, self.path.display()), events);
    }

    /// Record a video failure. Videos are never moved.
    fn fail_video(&mut self, reason: &str, events: &EventSender) {
        self.record_failure(format!("{} → {}", reason, self.path.display()), events);
    }

    fn record_failure(&mut self, description: String, events: &EventSender) {
        events.send(Event::Validation(ValidationEvent::CheckFailed {
            path: self.path.clone(),
            reason: description.clone(),
        }));
        self.failures.push(description);
    }

    fn finish(&mut self) {
        self.checked();
        if self.state == ArtifactState::Checked {
            self.state = ArtifactState::Passed;
        }
    }
}

/// Result of validating one batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// One record per artifact, in discovery order
    pub records: Vec<ArtifactRecord>,
    /// Every failure description, in the order it was found
    pub failures: Vec<String>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl BatchResult {
    /// FAIL iff any failure was recorded
    pub fn status(&self) -> Status {
        if self.failures.is_empty() {
            Status::Pass
        } else {
            Status::Fail
        }
    }

    /// Failure descriptions joined with `;`
    pub fn comments(&self) -> String {
        self.verdict().comments
    }

    /// The `(status, comments)` pair handed back to a test case
    pub fn verdict(&self) -> Verdict {
        Verdict::from_failures(&self.failures)
    }

    /// Images that ended up in quarantine
    pub fn quarantined(&self) -> impl Iterator<Item = &ArtifactRecord> {
        self.records
            .iter()
            .filter(|r| r.state == ArtifactState::Quarantined)
    }
}

/// Builder for a [`Validator`]
pub struct ValidatorBuilder {
    config: ValidationConfig,
    video_backend: Option<Box<dyn VideoBackend>>,
}

impl ValidatorBuilder {
    /// Create a builder with every check enabled
    pub fn new() -> Self {
        Self {
            config: ValidationConfig::default(),
            video_backend: None,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: ValidationConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the quarantine directory
    pub fn quarantine_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.quarantine_dir = dir.into();
        self
    }

    /// Enable or disable the 3A bundle
    pub fn check_quality(mut self, enabled: bool) -> Self {
        self.config.check_quality = enabled;
        self
    }

    pub fn check_exposure(mut self, enabled: bool) -> Self {
        self.config.check_exposure = enabled;
        self
    }

    pub fn check_white_balance(mut self, enabled: bool) -> Self {
        self.config.check_white_balance = enabled;
        self
    }

    pub fn check_focus(mut self, enabled: bool) -> Self {
        self.config.check_focus = enabled;
        self
    }

    pub fn check_abnormal_color(mut self, enabled: bool) -> Self {
        self.config.check_abnormal_color = enabled;
        self
    }

    pub fn check_video(mut self, enabled: bool) -> Self {
        self.config.check_video = enabled;
        self
    }

    /// Use a specific video backend instead of `ffprobe`
    pub fn video_backend(mut self, backend: Box<dyn VideoBackend>) -> Self {
        self.video_backend = Some(backend);
        self
    }

    /// Build the validator
    pub fn build(self) -> Validator {
        Validator {
            quality: QualityAnalyzer::new(self.config.quality),
            abnormal: AbnormalDetector::new(self.config.abnormal),
            quarantine: Quarantine::new(self.config.quarantine_dir.clone()),
            scanner: DirectoryScanner::new(ScanConfig {
                include_hidden: self.config.include_hidden,
            }),
            video_backend: self
                .video_backend
                .unwrap_or_else(|| Box::new(FfprobeBackend::default())),
            config: self.config,
        }
    }
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates batches of captured media
pub struct Validator {
    config: ValidationConfig,
    quality: QualityAnalyzer,
    abnormal: AbnormalDetector,
    quarantine: Quarantine,
    scanner: DirectoryScanner,
    video_backend: Box<dyn VideoBackend>,
}

impl Validator {
    /// Create a new validator builder
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    /// The active configuration
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a file or directory without events
    pub fn validate_batch(&self, path: &Path) -> Result<BatchResult, QaError> {
        self.validate_batch_with_events(path, &null_sender())
    }

    /// Validate a file or directory, reporting progress as events.
    ///
    /// Discovery errors and undecodable artifacts abort the batch. Quarantine
    /// failures are logged and recorded, and the batch carries on.
    pub fn validate_batch_with_events(
        &self,
        path: &Path,
        events: &EventSender,
    ) -> Result<BatchResult, QaError> {
        let result = self.run(path, events);
        if let Err(e) = &result {
            events.send(Event::Batch(BatchEvent::Error {
                message: e.to_string(),
            }));
        }
        result
    }

    fn run(&self, path: &Path, events: &EventSender) -> Result<BatchResult, QaError> {
        let start_time = Instant::now();
        events.send(Event::Batch(BatchEvent::Started {
            path: path.to_path_buf(),
        }));

        let artifacts = self.scanner.discover(path)?;
        let videos = artifacts
            .iter()
            .filter(|a| a.kind == ArtifactKind::Video)
            .count();
        events.send(Event::Discovery(DiscoveryEvent::Completed {
            images: artifacts.len() - videos,
            videos,
        }));

        let total = artifacts.len();
        let mut records = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for (index, artifact) in artifacts.iter().enumerate() {
            events.send(Event::Validation(ValidationEvent::ArtifactStarted {
                index,
                total,
                path: artifact.path.clone(),
            }));

            let record = match artifact.kind {
                ArtifactKind::Image => self.validate_image(artifact, events)?,
                ArtifactKind::Video => self.validate_video(artifact, events)?,
            };

            events.send(Event::Validation(ValidationEvent::ArtifactCompleted {
                index,
                total,
                path: record.path.clone(),
                passed: record.passed(),
            }));

            failures.extend(record.failures.iter().cloned());
            records.push(record);
        }

        let result = BatchResult {
            records,
            failures,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            path = %path.display(),
            artifacts = total,
            failures = result.failures.len(),
            status = %result.status(),
            "batch validated"
        );

        events.send(Event::Batch(BatchEvent::Completed {
            summary: BatchSummary {
                total_artifacts: total,
                failed_artifacts: result.records.iter().filter(|r| !r.passed()).count(),
                quarantined: result.quarantined().count(),
                failure_count: result.failures.len(),
                duration_ms: result.duration_ms,
            },
        }));

        Ok(result)
    }

    /// Run the image checks, always against the artifact's current path
    fn validate_image(
        &self,
        artifact: &Artifact,
        events: &EventSender,
    ) -> Result<ArtifactRecord, QaError> {
        let config = &self.config;
        let mut record = ArtifactRecord::pending(artifact);

        if config.check_quality {
            let report = self.quality.check_file(&record.path)?;
            record.metrics = Some(report);
            record.checked();

            if config.check_exposure && !report.exposure_ok() {
                record.fail_image(
                    format!("AE FAIL (brightness={:.2})", report.brightness()),
                    &self.quarantine,
                    events,
                );
            }

            if config.check_white_balance && !report.white_balance_ok() {
                record.fail_image(
                    format!("AWB FAIL (rgb={})", report.rgb_means()),
                    &self.quarantine,
                    events,
                );
            }

            if config.check_focus && !report.focus_ok() {
                record.fail_image(
                    format!("AF FAIL (sharpness={:.2})", report.sharpness()),
                    &self.quarantine,
                    events,
                );
            }
        }

        if config.check_abnormal_color {
            let verdict = self.abnormal.classify_file(&record.path)?;
            record.abnormal = Some(verdict);
            record.checked();

            if verdict.is_abnormal() {
                record.fail_image(
                    format!("Abnormal FAIL ({})", verdict),
                    &self.quarantine,
                    events,
                );
            }
        }

        record.finish();
        Ok(record)
    }

    /// Run the video checks. Failing videos stay where they are.
    fn validate_video(
        &self,
        artifact: &Artifact,
        events: &EventSender,
    ) -> Result<ArtifactRecord, QaError> {
        let mut record = ArtifactRecord::pending(artifact);

        if self.config.check_video {
            let report = check_video_basic(&record.path, self.video_backend.as_ref())?;
            record.video = Some(report);
            record.checked();

            if !report.open_ok {
                record.fail_video("VIDEO FAIL: cannot open", events);
            }
            if !report.read_ok {
                record.fail_video("VIDEO FAIL: cannot read first frame", events);
            }
        }

        record.finish();
        Ok(record)
    }
}
