//! # Events Module
//!
//! Progress events emitted while a batch is validated.
//!
//! ## Design
//! The pipeline never prints. It emits events through a channel and any
//! front end (the CLI progress bar, a test, a dashboard) subscribes.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Validation(ValidationEvent::Quarantined { to, .. }) = event {
//!             println!("moved aside: {}", to.display());
//!         }
//!     }
//! });
//!
//! validator.validate_batch_with_events(path, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
