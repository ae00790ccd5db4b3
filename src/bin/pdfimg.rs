//! CLI binary for edgequake-pdfimg.
//!
//! A thin shim over the library crate: `to-images` maps flags to a
//! `RasterizeConfig`, `to-pdf` to an `AssembleConfig`, and both print a
//! short summary (or JSON with `--json`).

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdfimg::{
    archive_name, assemble_async, rasterize_async, read_images, read_pdf, write_atomic, zip_pages,
    AssembleConfig, AssembleOutcome, ConversionProgressCallback, ImageCompression, OutputFormat,
    PdfImgError, ProgressCallback, RasterizeConfig, DEFAULT_PDF_NAME,
};
use edgequake_pdfimg::pipeline::input::has_pdf_header;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per item.
struct CliProgressCallback {
    bar: ProgressBar,
    /// "pages" or "images".
    unit: &'static str,
    /// When the previous item finished, for per-item timings.
    last: Mutex<Instant>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_conversion_start` reports the item count.
    fn new_dynamic(unit: &'static str, message: &str) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            unit,
            last: Mutex::new(Instant::now()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let template = format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  \
             [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {}  \
             ⏱ {{elapsed_precise}}  ETA {{eta_precise}}",
            self.unit
        );
        let progress_style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    /// Seconds since the previous item finished.
    fn lap(&self) -> f64 {
        match self.last.lock() {
            Ok(mut last) => {
                let secs = last.elapsed().as_secs_f64();
                *last = Instant::now();
                secs
            }
            Err(_) => 0.0,
        }
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total: usize) {
        self.activate_bar(total);
        self.lap();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total} {}…", self.unit))
        ));
    }

    fn on_item_complete(&self, item_num: usize, total: usize, bytes: usize) {
        let secs = self.lap();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            item_num,
            total,
            dim(&format!("{:>8} bytes", bytes)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_item_error(&self, item_num: usize, total: usize, error: &str) {
        let secs = self.lap();
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            item_num,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total: usize, success_count: usize) {
        let failed = total.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} {} processed",
                green("✔"),
                bold(&success_count.to_string()),
                self.unit
            );
        } else {
            eprintln!(
                "{} {}/{} {} processed  ({} skipped)",
                yellow("⚠"),
                bold(&success_count.to_string()),
                total,
                self.unit,
                red(&failed.to_string()),
            );
        }
    }
}

impl Drop for CliProgressCallback {
    // An aborted rasterisation never reaches `on_conversion_complete`.
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Every page as PNG at 200 DPI, zipped to report_images.zip
  pdfimg to-images report.pdf

  # JPEG pages at 300 DPI into a directory
  pdfimg to-images report.pdf --format jpg --dpi 300 --out-dir pages/

  # Merge a folder of scans (sorted by file name) into one PDF
  pdfimg to-pdf scans/ -o scans.pdf

  # Lossless page images, JSON summary on stdout
  pdfimg to-pdf a.png b.png --compression flate --json

ENVIRONMENT VARIABLES:
  PDFIMG_*                Every flag, e.g. PDFIMG_DPI=300, PDFIMG_FORMAT=jpg
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Log filter, overrides --verbose / --quiet

  PDFium (~30 MB) is downloaded automatically the first time `to-images`
  runs and cached in ~/.cache/pdfimg/pdfium-7690/. `to-pdf` never needs it.
"#;

/// Convert PDF pages to images and merge images into a PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pdfimg",
    version,
    about = "Convert PDF pages to PNG/JPEG images, or merge images into one PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFIMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDFIMG_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "PDFIMG_NO_PROGRESS")]
    no_progress: bool,

    /// Print a JSON summary on stdout instead of human-readable text.
    #[arg(long, global = true, env = "PDFIMG_JSON")]
    json: bool,
}

impl CommonArgs {
    fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress && !self.json
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every page of a PDF as an image.
    ToImages(ToImagesArgs),
    /// Merge images into one PDF, one page per image, ordered by file name.
    ToPdf(ToPdfArgs),
}

#[derive(Args, Debug)]
struct ToImagesArgs {
    /// PDF file to rasterise.
    input: PathBuf,

    /// Page image format: png or jpg.
    #[arg(long, env = "PDFIMG_FORMAT", default_value = "png", value_parser = parse_format)]
    format: OutputFormat,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDFIMG_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// JPEG quality (1–100); ignored for PNG.
    #[arg(long, env = "PDFIMG_JPEG_QUALITY", default_value_t = 95,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Zip archive to write. Default: `{input stem}_images.zip`.
    #[arg(short, long, env = "PDFIMG_OUTPUT", conflicts_with = "out_dir")]
    output: Option<PathBuf>,

    /// Write loose page files into this directory instead of a zip.
    #[arg(long, env = "PDFIMG_OUT_DIR")]
    out_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ToPdfArgs {
    /// Image files (png, jpg, jpeg) or directories containing them.
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// PDF file to write.
    #[arg(short, long, env = "PDFIMG_PDF_OUTPUT", default_value = DEFAULT_PDF_NAME)]
    output: PathBuf,

    /// Resolution tag in DPI; a page measures pixels × 72 / resolution points.
    #[arg(long, env = "PDFIMG_RESOLUTION", default_value_t = 100.0)]
    resolution: f32,

    /// How page images are stored in the PDF.
    #[arg(long, env = "PDFIMG_COMPRESSION", value_enum, default_value = "jpeg")]
    compression: CompressionArg,

    /// JPEG quality (1–100) for `--compression jpeg`.
    #[arg(long, env = "PDFIMG_QUALITY", default_value_t = 75,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Document title.
    #[arg(long, env = "PDFIMG_TITLE")]
    title: Option<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CompressionArg {
    Flate,
    Jpeg,
}

fn parse_format(s: &str) -> Result<OutputFormat, PdfImgError> {
    s.parse()
}

/// JSON summary: where the result went, plus the library's own summary.
#[derive(Serialize)]
struct Report<'a, T: Serialize> {
    output: &'a Path,
    #[serde(flatten)]
    result: &'a T,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let common = &cli.common;

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let filter = if common.verbose {
        "debug"
    } else if common.quiet || common.show_progress() {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::ToImages(args) => to_images(args, common).await,
        Command::ToPdf(args) => to_pdf(args, common).await,
    }
}

/// Read the input and reject non-PDF bytes, so a bad argument fails before
/// any pdfium download.
fn load_pdf(path: &Path) -> Result<Vec<u8>> {
    let pdf = read_pdf(path).context("Failed to read input PDF")?;
    if !has_pdf_header(&pdf) {
        return Err(PdfImgError::DocumentOpen {
            detail: format!("'{}' has no %PDF header", path.display()),
        })
        .context("Not a PDF document");
    }
    Ok(pdf)
}

async fn to_images(args: &ToImagesArgs, common: &CommonArgs) -> Result<()> {
    let pdf = load_pdf(&args.input)?;
    ensure_pdfium(common.quiet)?;

    let mut builder = RasterizeConfig::builder()
        .format(args.format)
        .dpi(args.dpi)
        .jpeg_quality(args.jpeg_quality);
    if common.show_progress() {
        let cb: ProgressCallback = CliProgressCallback::new_dynamic("pages", "Opening PDF…");
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    let output = rasterize_async(pdf, config)
        .await
        .context("Conversion failed")?;

    let target = if let Some(dir) = &args.out_dir {
        output
            .write_to_dir(dir)
            .context("Failed to write page images")?;
        dir.clone()
    } else {
        let path = args.output.clone().unwrap_or_else(|| {
            let name = args
                .input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            PathBuf::from(archive_name(&name))
        });
        let archive = zip_pages(&output.pages).context("Failed to build zip archive")?;
        write_atomic(&path, &archive).context("Failed to write zip archive")?;
        path
    };

    if common.json {
        let report = Report {
            output: &target,
            result: &output,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise output")?
        );
    } else if !common.quiet {
        eprintln!(
            "{}  {} {} pages at {} DPI  {}ms  →  {}",
            green("✔"),
            output.stats.page_count,
            output.format,
            output.stats.dpi,
            output.stats.duration_ms,
            bold(&target.display().to_string()),
        );
    }

    Ok(())
}

async fn to_pdf(args: &ToPdfArgs, common: &CommonArgs) -> Result<()> {
    let images = read_images(&args.inputs).context("Failed to read input images")?;

    if !common.quiet && !common.json && !images.is_empty() {
        let mut order: Vec<&str> = images.iter().map(|i| i.name.as_str()).collect();
        order.sort();
        eprintln!("{} Merge order (by file name):", cyan("◆"));
        for (i, name) in order.iter().enumerate() {
            eprintln!("  {:>3}. {}", i + 1, name);
        }
    }

    let compression = match args.compression {
        CompressionArg::Flate => ImageCompression::Flate,
        CompressionArg::Jpeg => ImageCompression::Jpeg {
            quality: args.quality,
        },
    };
    let mut builder = AssembleConfig::builder()
        .resolution(args.resolution)
        .compression(compression);
    if let Some(title) = &args.title {
        builder = builder.title(title.clone());
    }
    if common.show_progress() {
        let cb: ProgressCallback = CliProgressCallback::new_dynamic("images", "Decoding images…");
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    let pdf = match assemble_async(images, config)
        .await
        .context("Merging images failed")?
    {
        AssembleOutcome::NoInput => {
            eprintln!(
                "{} No images found in the given paths; nothing to do.",
                yellow("⚠")
            );
            return Ok(());
        }
        AssembleOutcome::Assembled(pdf) => pdf,
    };

    pdf.write_to(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    if common.json {
        let report = Report {
            output: &args.output,
            result: &pdf,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise output")?
        );
        return Ok(());
    }

    if !common.quiet {
        for skipped in &pdf.skipped {
            eprintln!("  {} {}", red("✗"), skipped);
        }
        eprintln!(
            "{}  {}/{} images  {}ms  →  {}",
            if pdf.skipped.is_empty() {
                green("✔")
            } else {
                yellow("⚠")
            },
            pdf.stats.page_count,
            pdf.stats.input_count,
            pdf.stats.duration_ms,
            bold(&args.output.display().to_string()),
        );
    }

    Ok(())
}

/// Make sure a pdfium library is on disk before rasterising, downloading it
/// behind a progress bar on first run.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }

    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    // block_in_place lets the callback borrow `bar` without a 'static bound.
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}
