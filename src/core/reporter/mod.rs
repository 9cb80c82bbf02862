//! # Reporter Module
//!
//! Turns a validated batch into something a test run can act on.
//!
//! ## Outputs
//! 1. **Verdict**: the `(status, comments)` pair handed back to the test case
//! 2. **Session report**: one CSV per session with a row per test case
//! 3. **JSON**: the full per-artifact record set for scripting

mod export;

pub use export::{batch_to_json, SessionReport, REPORT_HEADER};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between failure descriptions in [`Verdict::comments`]
pub const COMMENT_SEPARATOR: char = ';';

/// Two-valued outcome. There is no partial or unknown status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    pub fn is_pass(&self) -> bool {
        matches!(self, Status::Pass)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pass => write!(f, "PASS"),
            Status::Fail => write!(f, "FAIL"),
        }
    }
}

/// Status plus the semicolon-joined failure descriptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: Status,
    pub comments: String,
}

impl Verdict {
    /// Build a verdict from ordered failure descriptions.
    ///
    /// Status is FAIL exactly when there is at least one failure.
    pub fn from_failures<S: AsRef<str>>(failures: &[S]) -> Self {
        let status = if failures.is_empty() {
            Status::Pass
        } else {
            Status::Fail
        };
        let comments = failures
            .iter()
            .map(|f| f.as_ref())
            .collect::<Vec<_>>()
            .join(&COMMENT_SEPARATOR.to_string());

        Self { status, comments }
    }

    /// Split the comments back into individual failure descriptions.
    ///
    /// Lossy when a path itself contains `;`. `BatchResult::failures` keeps
    /// the exact list.
    pub fn failures(&self) -> Vec<&str> {
        if self.comments.is_empty() {
            return Vec::new();
        }
        self.comments.split(COMMENT_SEPARATOR).collect()
    }
}
