//! # edgequake-pdfimg
//!
//! Convert PDF documents to page images, and merge images back into a PDF.
//!
//! ## Two directions
//!
//! ```text
//! rasterize   PDF bytes ──▶ page_1.png, page_2.png, …     (pdfium)
//! assemble    a.png, b.jpg, … ──▶ one PDF, page per image  (lopdf)
//! ```
//!
//! * **Rasterize** renders every page at a chosen DPI and encodes it as PNG
//!   or JPEG. It is all-or-nothing: any failing page fails the whole call.
//! * **Assemble** sorts images by name, flattens every colour mode to RGB and
//!   writes one page per image. Undecodable images are skipped and reported;
//!   the call only fails when none are left.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfimg::{assemble, rasterize, AssembleConfig, NamedImage, RasterizeConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pdf = std::fs::read("document.pdf")?;
//!     let pages = rasterize(&pdf, &RasterizeConfig::default())?;
//!
//!     let images = pages
//!         .files()
//!         .map(|(name, bytes)| NamedImage::new(name, bytes))
//!         .collect();
//!     if let Some(merged) = assemble(images, &AssembleConfig::default())?.into_pdf() {
//!         merged.write_to("combined_images.pdf")?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfimg` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdfimg = { version = "0.1", default-features = false }
//! ```
//!
//! ## PDFium
//!
//! Rasterisation needs the native pdfium library. It is downloaded once into
//! the user cache on first use; set `PDFIUM_LIB_PATH` to use an existing copy.
//! Assembly is pure Rust and never touches pdfium.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod assemble;
pub mod config;
pub mod error;
pub mod output;
pub mod package;
pub mod pipeline;
pub mod progress;
pub mod rasterize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use assemble::{assemble, assemble_async, assemble_files};
pub use config::{
    AssembleConfig, AssembleConfigBuilder, ImageCompression, OutputFormat, RasterizeConfig,
    RasterizeConfigBuilder,
};
pub use error::{AssetError, PdfImgError};
pub use output::{
    write_atomic, AssembleOutcome, AssembleStats, AssembledPdf, NamedImage, RasterOutput,
    RasterStats, RasterizedPage,
};
pub use package::{archive_name, zip_pages, DEFAULT_PDF_NAME};
pub use pipeline::input::{read_images, read_pdf};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use rasterize::{rasterize, rasterize_async, rasterize_file, rasterize_with};
