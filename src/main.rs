// camsnap command-line tool: capture one webcam frame and save it as JPEG or BMP
//
// Exit codes: 0 success, 1 capture failure, 2 output failure. Command-line
// usage errors are reported by clap and also exit with 2.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use camsnap::output::{self, OutputFormat, DEFAULT_NAME_BUDGET};
use camsnap::{capture, image, pipeline};

#[derive(Parser, Debug)]
#[command(author, version, about = "Capture a single frame from the first webcam", long_about = None)]
struct Args {
    /// JPEG quality, clamped to 0-100
    #[arg(short, long, default_value_t = 85, allow_hyphen_values = true)]
    quality: i64,

    /// Output file; defaults to capture_YYYYMMDD_HHMMSS.<ext>. Written as JPEG
    /// unless the extension is .bmp (or --format says otherwise)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format when the file name does not carry a known extension
    #[arg(short, long, default_value = "jpg", value_parser = parse_format)]
    format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    OutputFormat::from_extension(value)
        .ok_or_else(|| format!("unsupported format '{value}' (expected jpg or bmp)"))
}

/// Failure tagged with the stage it came from.
#[derive(Debug)]
enum Failure {
    Capture(anyhow::Error),
    Output(anyhow::Error),
}

impl Failure {
    fn exit_code(&self) -> u8 {
        match self {
            Self::Capture(_) => 1,
            Self::Output(_) => 2,
        }
    }

    fn error(&self) -> &anyhow::Error {
        match self {
            Self::Capture(err) | Self::Output(err) => err,
        }
    }
}

/// Tears the capture subsystem down when dropped.
struct Subsystem;

impl Subsystem {
    fn start() -> anyhow::Result<Self> {
        capture::initialize().context("failed to initialize the capture subsystem")?;
        Ok(Self)
    }
}

impl Drop for Subsystem {
    fn drop(&mut self) {
        capture::teardown();
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(failure) => {
            eprintln!("Error: {:#}", failure.error());
            ExitCode::from(failure.exit_code())
        }
    }
}

/// Output path and the format it is written in, settled before the camera is
/// touched.
fn resolve_output(args: &Args) -> Result<(PathBuf, OutputFormat), Failure> {
    match &args.output {
        Some(path) => {
            let format = OutputFormat::from_path(path).unwrap_or_else(|| {
                tracing::debug!(
                    "no known extension on {}, writing {:?}",
                    path.display(),
                    args.format
                );
                args.format
            });
            Ok((path.clone(), format))
        }
        None => {
            let name = output::generate_filename(args.format, DEFAULT_NAME_BUDGET)
                .context("failed to generate an output file name")
                .map_err(Failure::Output)?;
            Ok((name.into(), args.format))
        }
    }
}

fn run(args: &Args) -> Result<PathBuf, Failure> {
    let (path, format) = resolve_output(args)?;
    let quality = args.quality.clamp(0, 100) as u8;
    tracing::debug!("output {} as {format:?} (quality {quality})", path.display());

    let _subsystem = Subsystem::start().map_err(Failure::Capture)?;

    let frame = pipeline::capture()
        .context("failed to capture a frame")
        .map_err(Failure::Capture)?;

    save(&path, &frame, format, quality).map_err(Failure::Output)?;
    pipeline::release_image(frame);
    Ok(path)
}

fn save(
    path: &Path,
    frame: &pipeline::CanonicalImage,
    format: OutputFormat,
    quality: u8,
) -> anyhow::Result<()> {
    image::save_as(path, frame, format, quality)
        .with_context(|| format!("failed to save image to {}", path.display()))
}
