//! # Camera Media QA
//!
//! Judges captured camera media by its pixels instead of trusting the camera
//! app's own status.
//!
//! ## Core Philosophy
//! - **Evidence over status** - every verdict comes from measuring the file
//! - **Keep the evidence** - failing photos are moved aside, never deleted
//! - **Explain failures** - every FAIL carries the metric that caused it
//!
//! ## Architecture
//! - `core` - Metric engine, discovery, quarantine and the validation pipeline
//! - `events` - Event-driven progress reporting
//! - `error` - Typed error taxonomy

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{QaError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
