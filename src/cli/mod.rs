//! # CLI Module
//!
//! Command-line interface for the camera media validator.
//!
//! ## Usage
//! ```bash
//! # Validate a folder of captures
//! camqa validate ./output
//!
//! # Skip focus, loosen white balance
//! camqa validate ./output --no-focus --wb-tolerance 40
//!
//! # Record the verdict in a session report
//! camqa validate ./output --report-dir ./reports --case test_photo --loops 3
//!
//! # Pull from a device and validate
//! camqa run-case test_photo --device R5CT1234
//!
//! # JSON output
//! camqa validate ./output --output json
//! ```

use camera_media_qa::core::device::{clear_local_files, AdbMediaSource, MediaSource, DEFAULT_REMOTE_DIR};
use camera_media_qa::core::pipeline::{default_output_dir, BatchResult, ValidationConfig, Validator};
use camera_media_qa::core::quarantine::Quarantine;
use camera_media_qa::core::reporter::{batch_to_json, SessionReport, Status};
use camera_media_qa::core::session::Session;
use camera_media_qa::error::Result;
use camera_media_qa::events::{BatchEvent, DiscoveryEvent, Event, EventChannel, ValidationEvent};
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;

/// Camera media QA - validate what the camera captured
#[derive(Parser, Debug)]
#[command(name = "camqa")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an image, a video, or a directory of captures
    Validate {
        /// File or directory to validate
        path: PathBuf,

        #[command(flatten)]
        checks: CheckArgs,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Append the verdict to a new session report in this directory
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Case name for the report row
        #[arg(long, default_value = "validate")]
        case: String,

        /// Loop count for the report row
        #[arg(long, default_value = "1")]
        loops: u32,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Pull fresh captures from a device, validate them and record the verdict
    RunCase {
        /// Case name for the report row
        case: String,

        /// adb serial of the device under test
        #[arg(short, long)]
        device: String,

        /// Camera folder on the device
        #[arg(long, default_value = DEFAULT_REMOTE_DIR)]
        remote_dir: String,

        /// Local folder the captures are pulled into
        #[arg(long)]
        local_dir: Option<PathBuf>,

        /// Extensions to pull
        #[arg(long, value_delimiter = ',', default_value = "jpg,mp4")]
        extensions: Vec<String>,

        /// Loop count for the report row
        #[arg(long, default_value = "1")]
        loops: u32,

        /// Directory for the session report
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Delete the captures from the device afterwards
        #[arg(long)]
        clear_remote: bool,

        #[command(flatten)]
        checks: CheckArgs,
    },

    /// Remove quarantined evidence from earlier sessions
    Clean {
        /// Quarantine directory
        #[arg(long)]
        quarantine_dir: Option<PathBuf>,

        /// Also remove pulled captures from this folder
        #[arg(long)]
        local_dir: Option<PathBuf>,
    },
}

/// Flags shared by every command that validates
#[derive(Args, Debug)]
struct CheckArgs {
    /// Load settings from a JSON file; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where failing images are moved
    #[arg(long)]
    quarantine_dir: Option<PathBuf>,

    /// Skip exposure, white balance and focus
    #[arg(long)]
    no_quality: bool,

    /// Skip the exposure check
    #[arg(long)]
    no_exposure: bool,

    /// Skip the white balance check
    #[arg(long)]
    no_white_balance: bool,

    /// Skip the focus check
    #[arg(long)]
    no_focus: bool,

    /// Skip black frame and color cast detection
    #[arg(long)]
    no_abnormal: bool,

    /// Skip video checks
    #[arg(long)]
    no_video: bool,

    /// Lowest acceptable mean brightness
    #[arg(long)]
    min_brightness: Option<f64>,

    /// Highest acceptable mean brightness
    #[arg(long)]
    max_brightness: Option<f64>,

    /// Largest allowed difference between channel means
    #[arg(long)]
    wb_tolerance: Option<f64>,

    /// Lowest acceptable Laplacian variance
    #[arg(long)]
    sharpness: Option<f64>,

    /// Brightness below which a frame counts as black
    #[arg(long)]
    black_threshold: Option<f64>,

    /// How far one channel must dominate to count as a color cast
    #[arg(long)]
    color_ratio: Option<f64>,

    /// Include hidden files
    #[arg(long)]
    include_hidden: bool,
}

impl CheckArgs {
    /// Config file (or defaults) with the flags layered on top
    fn to_config(&self) -> Result<ValidationConfig> {
        let mut config = match &self.config {
            Some(path) => ValidationConfig::from_json_file(path)?,
            None => ValidationConfig::default(),
        };

        if let Some(dir) = &self.quarantine_dir {
            config.quarantine_dir = dir.clone();
        }
        config.check_quality &= !self.no_quality;
        config.check_exposure &= !self.no_exposure;
        config.check_white_balance &= !self.no_white_balance;
        config.check_focus &= !self.no_focus;
        config.check_abnormal_color &= !self.no_abnormal;
        config.check_video &= !self.no_video;
        config.include_hidden |= self.include_hidden;

        if let Some(min) = self.min_brightness {
            config.quality.brightness_range.0 = min;
        }
        if let Some(max) = self.max_brightness {
            config.quality.brightness_range.1 = max;
        }
        if let Some(tolerance) = self.wb_tolerance {
            config.quality.wb_tolerance = tolerance;
        }
        if let Some(sharpness) = self.sharpness {
            config.quality.sharpness_threshold = sharpness;
        }
        if let Some(threshold) = self.black_threshold {
            config.abnormal.brightness_threshold = threshold;
        }
        if let Some(ratio) = self.color_ratio {
            config.abnormal.color_ratio = ratio;
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (verdict and failures only)
    Minimal,
}

/// Run the CLI. The exit code is 0 on PASS and 1 on FAIL.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            path,
            checks,
            output,
            report_dir,
            case,
            loops,
            verbose,
        } => run_validate(&path, &checks, output, report_dir.as_deref(), &case, loops, verbose),
        Commands::RunCase {
            case,
            device,
            remote_dir,
            local_dir,
            extensions,
            loops,
            report_dir,
            clear_remote,
            checks,
        } => {
            let source = AdbMediaSource::new(device, remote_dir);
            let local_dir = local_dir.unwrap_or_else(|| default_output_dir().join("output"));
            let report_dir = report_dir.unwrap_or_else(default_report_dir);
            let extensions: Vec<&str> = extensions.iter().map(String::as_str).collect();
            run_case(&case, loops, &source, &extensions, &local_dir, &report_dir, clear_remote, &checks)
        }
        Commands::Clean {
            quarantine_dir,
            local_dir,
        } => run_clean(quarantine_dir, local_dir),
    }
}

fn default_report_dir() -> PathBuf {
    default_output_dir().join("reports")
}

fn exit_code(status: Status) -> ExitCode {
    if status.is_pass() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn run_validate(
    path: &Path,
    checks: &CheckArgs,
    output: OutputFormat,
    report_dir: Option<&Path>,
    case: &str,
    loops: u32,
    verbose: bool,
) -> Result<ExitCode> {
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Camera Media QA").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let validator = Validator::builder().config(checks.to_config()?).build();

    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Discovery(DiscoveryEvent::Completed { images, videos }) => {
                    pb.set_length((images + videos) as u64);
                }
                Event::Validation(ValidationEvent::ArtifactStarted { path, .. }) => {
                    if verbose {
                        pb.set_message(path.file_name().unwrap_or_default().to_string_lossy().into_owned());
                    }
                }
                Event::Validation(ValidationEvent::CheckFailed { reason, .. }) => {
                    if verbose {
                        pb.println(format!("  {} {}", style("✗").red(), reason));
                    }
                }
                Event::Validation(ValidationEvent::ArtifactCompleted { index, .. }) => {
                    pb.set_position(index as u64 + 1);
                }
                Event::Batch(BatchEvent::Completed { .. }) | Event::Batch(BatchEvent::Error { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = validator.validate_batch_with_events(path, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    let result = result?;

    if let Some(dir) = report_dir {
        let report = SessionReport::create(dir)?;
        report.add_result(case, loops, &result.verdict())?;
        if matches!(output, OutputFormat::Pretty) {
            term.write_line(&format!(
                "  {} {}",
                style("Report:").dim(),
                report.path().display()
            ))
            .ok();
        }
    }

    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &result, validator.config(), verbose),
        OutputFormat::Json => print_json_results(&result),
        OutputFormat::Minimal => print_minimal_results(&result),
    }

    Ok(exit_code(result.status()))
}

#[allow(clippy::too_many_arguments)]
fn run_case(
    case: &str,
    loops: u32,
    source: &AdbMediaSource,
    extensions: &[&str],
    local_dir: &Path,
    report_dir: &Path,
    clear_remote: bool,
    checks: &CheckArgs,
) -> Result<ExitCode> {
    let term = Term::stderr();
    let session = Session::start(checks.to_config()?, report_dir)?;

    let verdict = session.run_case(case, loops, source, extensions, local_dir)?;

    if clear_remote {
        for extension in extensions {
            source.clear(extension)?;
        }
    }

    let marker = if verdict.status.is_pass() {
        style(verdict.status.to_string()).green().bold()
    } else {
        style(verdict.status.to_string()).red().bold()
    };
    term.write_line(&format!("{} {}", marker, case)).ok();
    for failure in verdict.failures() {
        term.write_line(&format!("  {} {}", style("✗").red(), failure)).ok();
    }
    term.write_line(&format!(
        "  {} {}",
        style("Report:").dim(),
        session.report().path().display()
    ))
    .ok();

    Ok(exit_code(verdict.status))
}

fn run_clean(quarantine_dir: Option<PathBuf>, local_dir: Option<PathBuf>) -> Result<ExitCode> {
    let term = Term::stderr();
    let quarantine_dir = quarantine_dir.unwrap_or_else(|| ValidationConfig::default().quarantine_dir);

    let removed = Quarantine::new(&quarantine_dir).clear_session()?;
    term.write_line(&format!(
        "{} Removed {} file(s) from {}",
        style("✓").green().bold(),
        style(removed).cyan(),
        quarantine_dir.display()
    ))
    .ok();

    if let Some(dir) = local_dir {
        let removed = clear_local_files(&dir, &["jpg", "mp4"])?;
        term.write_line(&format!(
            "{} Removed {} file(s) from {}",
            style("✓").green().bold(),
            style(removed).cyan(),
            dir.display()
        ))
        .ok();
    }

    Ok(ExitCode::SUCCESS)
}

fn print_pretty_results(term: &Term, result: &BatchResult, config: &ValidationConfig, verbose: bool) {
    let failed = result.records.iter().filter(|r| !r.passed()).count();

    term.write_line("").ok();
    term.write_line(&format!(
        "  {} artifacts checked in {:.1}s",
        style(result.records.len()).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!("  {} failed", style(failed).cyan())).ok();

    let quarantined = result.quarantined().count();
    if quarantined > 0 {
        term.write_line(&format!(
            "  {} moved to {}",
            style(quarantined).yellow(),
            config.quarantine_dir.display()
        ))
        .ok();
    }
    term.write_line("").ok();

    for record in &result.records {
        if record.passed() && !verbose {
            continue;
        }

        let marker = if record.passed() {
            style("✓").green().to_string()
        } else {
            style("✗").red().to_string()
        };
        term.write_line(&format!("  {} {}", marker, display_path(&record.original_path)))
            .ok();

        if verbose {
            if let Some(metrics) = &record.metrics {
                term.write_line(&format!(
                    "      {}",
                    style(format!(
                        "brightness={:.2} rgb={} sharpness={:.2}",
                        metrics.brightness(),
                        metrics.rgb_means(),
                        metrics.sharpness()
                    ))
                    .dim()
                ))
                .ok();
            }
            if let Some(video) = &record.video {
                term.write_line(&format!(
                    "      {}",
                    style(format!(
                        "{}x{} @ {:.2} fps, {} frames",
                        video.width, video.height, video.fps, video.frame_count
                    ))
                    .dim()
                ))
                .ok();
            }
        }

        for failure in &record.failures {
            term.write_line(&format!("      {}", style(failure).red())).ok();
        }
        if let Some(error) = &record.quarantine_error {
            term.write_line(&format!("      {} {}", style("not moved:").yellow(), error))
                .ok();
        }
    }

    term.write_line("").ok();
    let status = result.status();
    let status_text = match status {
        Status::Pass => style(status.to_string()).green().bold(),
        Status::Fail => style(status.to_string()).red().bold(),
    };
    term.write_line(&format!("{} {}", style("Result:").bold(), status_text))
        .ok();
}

fn print_json_results(result: &BatchResult) {
    match serde_json::to_string_pretty(&batch_to_json(result)) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("error: failed to render JSON: {e}"),
    }
}

fn print_minimal_results(result: &BatchResult) {
    println!("{}", result.status());
    for failure in &result.failures {
        println!("{}", failure);
    }
}

fn display_path(path: &Path) -> String {
    let home = dirs::home_dir().unwrap_or_default();
    match path.strip_prefix(&home) {
        Ok(rest) if !home.as_os_str().is_empty() => format!("~/{}", rest.display()),
        _ => path.display().to_string(),
    }
}
