//! # Core Module
//!
//! The headless media validation engine.
//!
//! ## Modules
//! - `scanner` - Finds images and videos to validate
//! - `metrics` - Exposure, white balance, focus, abnormal color and video checks
//! - `quarantine` - Moves failing images aside
//! - `pipeline` - Validates a batch and aggregates the verdict
//! - `reporter` - Verdicts, the session CSV report and JSON output
//! - `device` - Pulls captured media from the device under test
//! - `session` - Runs test cases against one report and quarantine

pub mod device;
pub mod metrics;
pub mod pipeline;
pub mod quarantine;
pub mod reporter;
pub mod scanner;
pub mod session;

// Re-export commonly used types
pub use pipeline::{BatchResult, ValidationConfig, Validator};
pub use reporter::{Status, Verdict};
pub use scanner::{Artifact, ArtifactKind};
pub use session::Session;
