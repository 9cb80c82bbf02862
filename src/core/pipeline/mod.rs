//! # Pipeline Module
//!
//! Orchestrates validation of a batch of captured artifacts.
//!
//! ## Pipeline Stages
//! 1. **Discover** - enumerate the file or directory in a fixed order
//! 2. **Measure** - run the enabled metric checks per artifact
//! 3. **Quarantine** - move failing images aside, once each
//! 4. **Verdict** - PASS iff no failure was recorded
//!
//! Runs on the calling thread. Each artifact is decoded, measured and possibly
//! moved before the next one is looked at.

mod config;
mod executor;

pub use config::{default_output_dir, ValidationConfig};
pub use executor::{
    ArtifactRecord, ArtifactState, BatchResult, Validator, ValidatorBuilder,
};
