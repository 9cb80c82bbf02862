//! # camqa CLI
//!
//! Command-line interface for the camera media validator.
//!
//! ## Usage
//! ```bash
//! camqa validate ./output --quarantine-dir ./output/pic_fail
//! camqa validate ./output/IMG_0001.jpg --no-focus --output json
//! camqa run-case test_take_picture --device emulator-5554
//! ```

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    camera_media_qa::init_tracing();

    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
