//! Export functionality for verdicts and batch results.
//!
//! The session report is a CSV file with one row per test case. JSON export
//! carries every per-artifact record.

use super::{Verdict, COMMENT_SEPARATOR};
use crate::core::pipeline::BatchResult;
use crate::error::ReportError;
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Header row of the session report
pub const REPORT_HEADER: [&str; 4] = ["Case_Name", "Loops", "Result", "Comments"];

/// The single report file of a test session.
///
/// Create it once when the session starts and pass it to every test case.
#[derive(Debug)]
pub struct SessionReport {
    path: PathBuf,
}

impl SessionReport {
    /// Create `test_report_<timestamp>.csv` in `report_dir` and write the header
    pub fn create(report_dir: &Path) -> Result<Self, ReportError> {
        fs::create_dir_all(report_dir).map_err(|e| ReportError::CreateDir {
            path: report_dir.to_path_buf(),
            source: e,
        })?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = report_dir.join(format!("test_report_{timestamp}.csv"));

        let write_header = || -> std::io::Result<()> {
            let mut file = File::create(&path)?;
            writeln!(file, "{}", REPORT_HEADER.join(","))
        };
        write_header().map_err(|e| ReportError::Write {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "session report created");
        Ok(Self { path })
    }

    /// Where the report lives
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one test case's verdict.
    ///
    /// Each failure description goes on its own line inside the Comments cell.
    pub fn add_result(&self, case_name: &str, loops: u32, verdict: &Verdict) -> Result<(), ReportError> {
        let comments = verdict.comments.replace(COMMENT_SEPARATOR, "\n");
        let row = [
            escape_csv(case_name),
            loops.to_string(),
            verdict.status.to_string(),
            escape_csv(&comments),
        ];

        let append = || -> std::io::Result<()> {
            let mut file = OpenOptions::new().append(true).open(&self.path)?;
            writeln!(file, "{}", row.join(","))
        };
        append().map_err(|e| ReportError::Write {
            path: self.path.clone(),
            source: e,
        })?;

        info!(case = case_name, loops, status = %verdict.status, "report updated");
        Ok(())
    }
}

/// Quote a CSV field when it contains a separator, quote or newline
fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render a batch result, including its verdict, as JSON
pub fn batch_to_json(result: &BatchResult) -> serde_json::Value {
    let verdict = result.verdict();
    serde_json::json!({
        "status": verdict.status,
        "comments": verdict.comments,
        "failures": result.failures,
        "duration_ms": result.duration_ms,
        "artifacts": result.records,
    })
}
