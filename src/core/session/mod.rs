//! # Session Module
//!
//! Ties a regression session together: one quarantine, one report, many
//! test cases. Putting the camera into the state a case needs is the
//! caller's job; a case here starts once the media has been captured.

use crate::core::device::{clear_local_files, MediaSource};
use crate::core::pipeline::{ValidationConfig, Validator};
use crate::core::quarantine::Quarantine;
use crate::core::reporter::{SessionReport, Verdict};
use crate::error::{DeviceError, Result};
use std::path::Path;
use tracing::{info, warn};

/// A running regression session
pub struct Session {
    validator: Validator,
    report: SessionReport,
}

impl Session {
    /// Clear evidence from earlier sessions and open a fresh report
    pub fn start(config: ValidationConfig, report_dir: &Path) -> Result<Self> {
        let validator = Validator::builder().config(config).build();
        Self::with_validator(validator, report_dir)
    }

    /// Start a session around an already configured validator
    pub fn with_validator(validator: Validator, report_dir: &Path) -> Result<Self> {
        let quarantine = Quarantine::new(validator.config().quarantine_dir.clone());
        let removed = quarantine.clear_session()?;
        let report = SessionReport::create(report_dir)?;

        info!(
            quarantine = %quarantine.dir().display(),
            removed,
            report = %report.path().display(),
            "session started"
        );
        Ok(Self { validator, report })
    }

    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Fetch the media for one case, validate it and record the verdict.
    ///
    /// Stale files with the given extensions are removed from `local_dir`
    /// first. An extension with nothing on the device is skipped; if no
    /// extension yields anything, validation reports that nothing was found.
    pub fn run_case(
        &self,
        case_name: &str,
        loops: u32,
        source: &dyn MediaSource,
        extensions: &[&str],
        local_dir: &Path,
    ) -> Result<Verdict> {
        clear_local_files(local_dir, extensions)?;

        let mut pulled = 0;
        for extension in extensions {
            match source.pull(extension, local_dir) {
                Ok(files) => pulled += files.len(),
                Err(e @ DeviceError::NoMediaOnDevice { .. }) => {
                    warn!(case = case_name, error = %e, "nothing to pull")
                }
                Err(e) => return Err(e.into()),
            }
        }
        info!(case = case_name, loops, pulled, "media pulled");

        let result = self.validator.validate_batch(local_dir)?;
        let verdict = result.verdict();
        self.report.add_result(case_name, loops, &verdict)?;

        info!(case = case_name, status = %verdict.status, "case finished");
        Ok(verdict)
    }
}
