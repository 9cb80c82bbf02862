//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted while validating a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Artifact discovery
    Discovery(DiscoveryEvent),
    /// Per-artifact checks
    Validation(ValidationEvent),
    /// Batch lifecycle
    Batch(BatchEvent),
}

/// Events during artifact discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DiscoveryEvent {
    /// Discovery completed
    Completed { images: usize, videos: usize },
}

/// Events for individual artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValidationEvent {
    /// Checks are about to run on an artifact
    ArtifactStarted {
        index: usize,
        total: usize,
        path: PathBuf,
    },
    /// A check failed
    CheckFailed { path: PathBuf, reason: String },
    /// A failing image was moved into the quarantine directory
    Quarantined { from: PathBuf, to: PathBuf },
    /// Moving a failing image aside did not work; the batch continues
    QuarantineFailed { path: PathBuf, message: String },
    /// All enabled checks ran on an artifact
    ArtifactCompleted {
        index: usize,
        total: usize,
        path: PathBuf,
        passed: bool,
    },
}

/// Batch-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BatchEvent {
    /// Validation of a path has started
    Started { path: PathBuf },
    /// Validation finished with a verdict
    Completed { summary: BatchSummary },
    /// Validation aborted
    Error { message: String },
}

/// Summary of a finished batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Artifacts checked
    pub total_artifacts: usize,
    /// Artifacts with at least one failure
    pub failed_artifacts: usize,
    /// Images moved into quarantine
    pub quarantined: usize,
    /// Number of failure descriptions
    pub failure_count: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Validation(ValidationEvent::Quarantined {
            from: PathBuf::from("/output/a.jpg"),
            to: PathBuf::from("/output/pic_fail/a.jpg"),
        });

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Validation(ValidationEvent::Quarantined { to, .. }) => {
                assert_eq!(to, PathBuf::from("/output/pic_fail/a.jpg"));
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn batch_summary_is_serializable() {
        let summary = BatchSummary {
            total_artifacts: 12,
            failed_artifacts: 2,
            quarantined: 1,
            failure_count: 3,
            duration_ms: 840,
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"failure_count\":3"));
    }
}
