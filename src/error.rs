//! Error types for the edgequake-pdfimg library.
//!
//! Two error types reflect two failure modes:
//!
//! * [`PdfImgError`] — **Fatal**: the call produced nothing (malformed PDF,
//!   unsupported format literal, every image unreadable, codec failure).
//!   Rasterization is all-or-nothing, so any page failure lands here too.
//!
//! * [`AssetError`] — **Non-fatal**: one input image could not be decoded and
//!   was skipped. Stored in [`crate::output::AssembledPdf::skipped`] so callers
//!   can report it while still using the PDF built from the remaining images.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdfimg library.
#[derive(Debug, Error)]
pub enum PdfImgError {
    // ── Usage errors ──────────────────────────────────────────────────────
    /// Output format literal was neither `png` nor `jpg`.
    #[error("Unsupported output format '{format}' (expected 'png' or 'jpg')")]
    UnsupportedFormat { format: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading an input.
    #[error("Failed to read '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Rasterization errors ──────────────────────────────────────────────
    /// The buffer is not a PDF, or pdfium could not parse it.
    #[error("Cannot open PDF document: {detail}")]
    DocumentOpen { detail: String },

    /// pdfium failed to render a page.
    #[error("Rendering failed for page {page}: {detail}")]
    PageRender { page: usize, detail: String },

    /// The image codec failed to encode a rendered page.
    #[error("Encoding page {page} as {format} failed: {detail}")]
    PageEncode {
        page: usize,
        format: String,
        detail: String,
    },

    // ── Assembly errors ───────────────────────────────────────────────────
    /// No input image could be decoded.
    #[error("None of the {total} images could be read.\nFirst error: {first_error}")]
    NoValidImages { total: usize, first_error: String },

    /// Writing the PDF structure failed.
    #[error("Failed to serialise PDF: {detail}")]
    PdfSerialize { detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Building the zip archive of rendered pages failed.
    #[error("Failed to build zip archive: {detail}")]
    ArchiveFailed { detail: String },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<pdfium_auto::PdfiumAutoError> for PdfImgError {
    fn from(e: pdfium_auto::PdfiumAutoError) -> Self {
        PdfImgError::PdfiumBindingFailed(e.to_string())
    }
}

/// A non-fatal error for a single input image.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum AssetError {
    /// The bytes could not be decoded by the image codec.
    #[error("Cannot read image '{name}': {detail}")]
    Decode { name: String, detail: String },
}

impl AssetError {
    /// Name of the input the error refers to.
    pub fn name(&self) -> &str {
        match self {
            AssetError::Decode { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_display() {
        let e = PdfImgError::UnsupportedFormat {
            format: "gif".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("'gif'"), "got: {msg}");
        assert!(msg.contains("png"));
    }

    #[test]
    fn no_valid_images_display() {
        let e = PdfImgError::NoValidImages {
            total: 3,
            first_error: "bad header".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("3 images"), "got: {msg}");
        assert!(msg.contains("bad header"));
    }

    #[test]
    fn page_render_display() {
        let e = PdfImgError::PageRender {
            page: 4,
            detail: "out of memory".into(),
        };
        assert!(e.to_string().contains("page 4"));
    }

    #[test]
    fn binding_error_converts() {
        let e: PdfImgError = pdfium_auto::PdfiumAutoError::Download("offline".into()).into();
        assert!(matches!(e, PdfImgError::PdfiumBindingFailed(ref s) if s.contains("offline")));
    }

    #[test]
    fn asset_error_name() {
        let e = AssetError::Decode {
            name: "scan.png".into(),
            detail: "truncated".into(),
        };
        assert_eq!(e.name(), "scan.png");
        assert!(e.to_string().contains("scan.png"));
    }
}
