//! Input and output value types for both conversion directions.
//!
//! Every type here is plain data owned by the caller once a call returns.
//! Raw bytes are skipped when serialising so `--json` summaries stay small.

use crate::config::OutputFormat;
use crate::error::{AssetError, PdfImgError};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

// ── Rasterize ────────────────────────────────────────────────────────────

/// One encoded page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterizedPage {
    /// 1-indexed physical page number.
    pub page_num: usize,
    /// `page_{n}.png` or `page_{n}.jpg`.
    pub filename: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Timings and sizes for a rasterize call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RasterStats {
    pub page_count: usize,
    pub dpi: u32,
    pub total_bytes: usize,
    pub duration_ms: u64,
}

/// Every page of a document, in physical order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterOutput {
    pub format: OutputFormat,
    pub pages: Vec<RasterizedPage>,
    pub stats: RasterStats,
}

impl RasterOutput {
    /// `(filename, bytes)` pairs in page order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.pages
            .iter()
            .map(|p| (p.filename.as_str(), p.bytes.as_slice()))
    }

    /// Write each page into `dir` (created if missing) and return the paths.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, PdfImgError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| PdfImgError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        self.pages
            .iter()
            .map(|page| {
                let path = dir.join(&page.filename);
                write_atomic(&path, &page.bytes)?;
                Ok(path)
            })
            .collect()
    }
}

// ── Assemble ─────────────────────────────────────────────────────────────

/// A named, still-encoded input image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedImage {
    /// Sort key; normally the file name.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl NamedImage {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Timings and counts for an assemble call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssembleStats {
    pub input_count: usize,
    pub page_count: usize,
    pub skipped_count: usize,
    pub total_bytes: usize,
    pub duration_ms: u64,
}

/// The merged document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledPdf {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Names of the images that became pages, in page order.
    pub page_order: Vec<String>,
    /// Inputs that could not be decoded and were left out.
    pub skipped: Vec<AssetError>,
    pub stats: AssembleStats,
}

impl AssembledPdf {
    /// Write the PDF to `path` atomically.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), PdfImgError> {
        write_atomic(path.as_ref(), &self.bytes)
    }
}

/// Result of [`crate::assemble`].
#[derive(Debug, Clone)]
pub enum AssembleOutcome {
    /// No images were supplied; nothing was produced.
    NoInput,
    /// At least one image was usable.
    Assembled(AssembledPdf),
}

impl AssembleOutcome {
    /// The PDF, if one was produced.
    pub fn into_pdf(self) -> Option<AssembledPdf> {
        match self {
            AssembleOutcome::NoInput => None,
            AssembleOutcome::Assembled(pdf) => Some(pdf),
        }
    }

    pub fn is_no_input(&self) -> bool {
        matches!(self, AssembleOutcome::NoInput)
    }
}

// ── Files ────────────────────────────────────────────────────────────────

/// Write `bytes` to `path` via a temp file in the same directory plus rename,
/// so a failed write never leaves a truncated file behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PdfImgError> {
    let write_err = |source: std::io::Error| PdfImgError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!("Wrote {} bytes → {}", bytes.len(), path.display());
    Ok(())
}
