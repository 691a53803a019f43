// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// inksign CLI — scan photographed pages, place signatures, and export PDFs.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use inksign_core::human_errors::humanize_error;
use inksign_core::types::{PaperSize, Point, Quadrilateral};
use inksign_core::{AppConfig, InksignError};
use inksign_document::image::codec;
use inksign_document::{DocumentScanner, PdfExporter, Placement, composite_signature, integrity};
use tracing::info;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "inksign")]
#[command(about = "Flatten photographed documents, sign them, and export signed PDFs")]
#[command(version)]
struct Cli {
    /// Settings file (JSON): detection tuning, default paper size, export DPI.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the page in a photo and write the flattened result.
    Scan(ScanArgs),

    /// Print the detected (or fallback) page corners as JSON.
    Detect(DetectArgs),

    /// Place a signature image onto a page.
    Sign(SignArgs),

    /// Package page images into a PDF and print its SHA-256 digest.
    Export(ExportArgs),

    /// Check a file against a recorded SHA-256 digest.
    Verify {
        /// File to check.
        #[arg(long)]
        file: PathBuf,

        /// Expected digest (hex).
        #[arg(long)]
        digest: String,
    },
}

#[derive(Debug, Clone, Args)]
struct ScanArgs {
    /// Photograph to scan.
    #[arg(long)]
    input: PathBuf,

    /// Where to write the flattened page; the format follows the extension.
    #[arg(long)]
    output: PathBuf,

    /// Corners as x1,y1,...,x4,y4 in order top-left, top-right,
    /// bottom-right, bottom-left. Skips detection.
    #[arg(long, value_parser = parse_corners)]
    corners: Option<Quadrilateral>,

    /// Output size as WxH (defaults to the page's longer edges).
    #[arg(long, value_parser = parse_size)]
    size: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Args)]
struct DetectArgs {
    /// Photograph to inspect.
    #[arg(long)]
    input: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct SignArgs {
    /// Page image to sign.
    #[arg(long)]
    page: PathBuf,

    /// Signature image, ideally with a transparent background.
    #[arg(long)]
    signature: PathBuf,

    /// Where to write the signed page.
    #[arg(long)]
    output: PathBuf,

    /// Top-left position of the signature as X,Y (may be negative).
    #[arg(long, value_parser = parse_offset, allow_hyphen_values = true)]
    at: (i64, i64),

    /// Scale applied to the signature.
    #[arg(long, default_value = "1.0")]
    scale: f32,
}

#[derive(Debug, Clone, Args)]
struct ExportArgs {
    /// Where to write the PDF.
    #[arg(long)]
    output: PathBuf,

    /// Paper size: a4, a5, letter, or legal (defaults to the config's).
    #[arg(long)]
    paper: Option<PaperSize>,

    /// Document title metadata.
    #[arg(long)]
    title: Option<String>,

    /// Resolution at which page images are placed (defaults to the config's).
    #[arg(long)]
    dpi: Option<u32>,

    /// Page images, in order.
    #[arg(required = true)]
    pages: Vec<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(err.as_ref());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Scan(args) => run_scan(&args, &config),
        Commands::Detect(args) => run_detect(&args, &config),
        Commands::Sign(args) => run_sign(&args),
        Commands::Export(args) => run_export(&args, &config),
        Commands::Verify { file, digest } => run_verify(&file, &digest),
    }
}

/// Print pipeline failures in plain language; anything else as-is.
fn report(err: &(dyn std::error::Error + 'static)) {
    match err.downcast_ref::<InksignError>() {
        Some(inksign_err) => {
            let human = humanize_error(inksign_err);
            eprintln!("error: {}", human.message);
            eprintln!("  {}", human.suggestion);
        }
        None => eprintln!("error: {err}"),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<AppConfig> {
    match path {
        Some(path) => Ok(AppConfig::load(path)?),
        None => Ok(AppConfig::default()),
    }
}

fn run_scan(args: &ScanArgs, config: &AppConfig) -> CliResult<()> {
    let photo = codec::open(&args.input)?;
    let scanner = DocumentScanner::from_image(photo, config.scan.clone())?;

    let outcome = match args.corners {
        Some(quad) => scanner.rectify_user_corners(quad, args.size)?,
        None if args.size.is_some() => {
            let detection = scanner.corners_or_default()?;
            let image = scanner.rectify(&detection.quad, args.size)?;
            inksign_document::ScanOutcome { image, detection }
        }
        None => scanner.scan()?,
    };

    codec::save(&outcome.image, &args.output)?;
    info!(
        output = %args.output.display(),
        width = outcome.image.width(),
        height = outcome.image.height(),
        source = ?outcome.detection.source,
        "Scanned page written"
    );
    Ok(())
}

fn run_detect(args: &DetectArgs, config: &AppConfig) -> CliResult<()> {
    let photo = codec::open(&args.input)?;
    let scanner = DocumentScanner::from_image(photo, config.scan.clone())?;
    let detection = scanner.corners_or_default()?;
    println!("{}", serde_json::to_string_pretty(&detection)?);
    Ok(())
}

fn run_sign(args: &SignArgs) -> CliResult<()> {
    let page = codec::open(&args.page)?;
    let signature = codec::open(&args.signature)?;
    let (x, y) = args.at;
    let signed = composite_signature(&page, &signature, Placement::at(x, y).with_scale(args.scale))?;
    codec::save(&signed, &args.output)?;
    info!(output = %args.output.display(), x, y, scale = args.scale, "Signed page written");
    Ok(())
}

/// Paper and DPI for an export: flags first, then the config file.
fn export_settings(args: &ExportArgs, config: &AppConfig) -> (PaperSize, u32) {
    (
        args.paper.unwrap_or(config.default_paper_size),
        args.dpi.unwrap_or(config.export_dpi),
    )
}

fn run_export(args: &ExportArgs, config: &AppConfig) -> CliResult<()> {
    let pages = args
        .pages
        .iter()
        .map(codec::open)
        .collect::<Result<Vec<_>, _>>()?;

    let (paper, dpi) = export_settings(args, config);
    let mut exporter = PdfExporter::new(paper);
    if let Some(title) = &args.title {
        exporter.set_title(title.as_str());
    }
    exporter.set_dpi(dpi);

    let bytes = exporter.write_to_file(&pages, &args.output)?;
    println!("{}", integrity::digest_hex(&bytes));
    Ok(())
}

fn run_verify(file: &Path, digest: &str) -> CliResult<()> {
    let bytes = std::fs::read(file)?;
    integrity::verify_digest(&bytes, digest)?;
    println!("OK: {}", file.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Argument parsers
// ---------------------------------------------------------------------------

fn parse_numbers<T: std::str::FromStr>(s: &str, expected: usize) -> Result<Vec<T>, String> {
    let values = s
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<T>()
                .map_err(|_| format!("'{}' is not a number", part.trim()))
        })
        .collect::<Result<Vec<T>, String>>()?;
    if values.len() != expected {
        return Err(format!("expected {expected} comma-separated values, got {}", values.len()));
    }
    Ok(values)
}

/// `x1,y1,x2,y2,x3,y3,x4,y4` → corners in the given order.
fn parse_corners(s: &str) -> Result<Quadrilateral, String> {
    let v = parse_numbers::<f64>(s, 8)?;
    if v.iter().any(|c| !c.is_finite()) {
        return Err("corner coordinates must be finite".into());
    }
    Ok(Quadrilateral::new([
        Point::new(v[0], v[1]),
        Point::new(v[2], v[3]),
        Point::new(v[4], v[5]),
        Point::new(v[6], v[7]),
    ]))
}

/// `WxH` → (width, height), both non-zero.
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let width: u32 = w.trim().parse().map_err(|_| format!("bad width '{w}'"))?;
    let height: u32 = h.trim().parse().map_err(|_| format!("bad height '{h}'"))?;
    if width == 0 || height == 0 {
        return Err("output size must be non-zero".into());
    }
    Ok((width, height))
}

/// `X,Y` → signed pixel offset.
fn parse_offset(s: &str) -> Result<(i64, i64), String> {
    let v = parse_numbers::<i64>(s, 2)?;
    Ok((v[0], v[1]))
}
