//! PDF → images.
//!
//! The conversion is all-or-nothing: pages are rendered and encoded in
//! physical order into an internal buffer, and the buffer is only handed to
//! the caller once every page succeeded. The first failing page aborts the
//! call and its error is returned instead.

use crate::config::RasterizeConfig;
use crate::error::PdfImgError;
use crate::output::{RasterOutput, RasterStats, RasterizedPage};
use crate::pipeline::{encode, input, normalize, render};
use pdfium_render::prelude::Pdfium;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Rasterise every page of an in-memory PDF.
///
/// Binds pdfium through [`pdfium_auto`] (downloading it on first use). Use
/// [`rasterize_with`] to reuse an existing binding.
///
/// # Errors
/// - [`PdfImgError::DocumentOpen`] — not a PDF, or pdfium cannot parse it
/// - [`PdfImgError::PageRender`] / [`PdfImgError::PageEncode`] — a page failed
/// - [`PdfImgError::PdfiumBindingFailed`] — no usable pdfium library
/// - [`PdfImgError::InvalidConfig`] — `dpi` is zero
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdfimg::{rasterize, RasterizeConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pdf = std::fs::read("report.pdf")?;
/// let config = RasterizeConfig::builder().format("jpg".parse()?).dpi(150).build()?;
/// for (name, bytes) in rasterize(&pdf, &config)?.files() {
///     std::fs::write(name, bytes)?;
/// }
/// # Ok(())
/// # }
/// ```
pub fn rasterize(pdf_bytes: &[u8], config: &RasterizeConfig) -> Result<RasterOutput, PdfImgError> {
    validate(config)?;

    // Reject non-PDF input before paying for the pdfium binding.
    if !input::has_pdf_header(pdf_bytes) {
        return Err(PdfImgError::DocumentOpen {
            detail: "no %PDF header found in the first 1024 bytes".into(),
        });
    }

    let pdfium = pdfium_auto::bind_pdfium_silent()?;
    rasterize_with(&pdfium, pdf_bytes, config)
}

/// [`rasterize`] with a caller-provided pdfium binding.
pub fn rasterize_with(
    pdfium: &Pdfium,
    pdf_bytes: &[u8],
    config: &RasterizeConfig,
) -> Result<RasterOutput, PdfImgError> {
    validate(config)?;
    let start = Instant::now();
    let scale = config.scale_factor();
    let cb = config.progress_callback.as_deref();

    let document = render::open_document(pdfium, pdf_bytes)?;
    let total = document.pages().len() as usize;
    if let Some(cb) = cb {
        cb.on_conversion_start(total);
    }

    let mut pages = Vec::with_capacity(total);
    for (index, page) in document.pages().iter().enumerate() {
        let page_num = index + 1;

        let result = render::render_page(&page, page_num, scale).and_then(|image| {
            let rgb = normalize::to_rgb8(image, [255, 255, 255]);
            let bytes = encode::encode_page(&rgb, config.format, config.jpeg_quality).map_err(
                |e| PdfImgError::PageEncode {
                    page: page_num,
                    format: config.format.to_string(),
                    detail: e.to_string(),
                },
            )?;
            Ok(RasterizedPage {
                page_num,
                filename: config.format.page_filename(page_num),
                width: rgb.width(),
                height: rgb.height(),
                bytes,
            })
        });

        match result {
            Ok(rasterized) => {
                if let Some(cb) = cb {
                    cb.on_item_complete(page_num, total, rasterized.bytes.len());
                }
                pages.push(rasterized);
            }
            Err(e) => {
                warn!("Aborting: page {}/{} failed: {}", page_num, total, e);
                if let Some(cb) = cb {
                    cb.on_item_error(page_num, total, &e.to_string());
                }
                return Err(e);
            }
        }
    }

    let stats = RasterStats {
        page_count: pages.len(),
        dpi: config.dpi,
        total_bytes: pages.iter().map(|p| p.bytes.len()).sum(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Rasterised {} pages as {} at {} DPI in {}ms",
        stats.page_count, config.format, config.dpi, stats.duration_ms
    );
    if let Some(cb) = cb {
        cb.on_conversion_complete(total, pages.len());
    }

    Ok(RasterOutput {
        format: config.format,
        pages,
        stats,
    })
}

/// Read a PDF from disk and rasterise it.
pub fn rasterize_file(
    path: impl AsRef<Path>,
    config: &RasterizeConfig,
) -> Result<RasterOutput, PdfImgError> {
    let bytes = input::read_pdf(path)?;
    rasterize(&bytes, config)
}

/// Run [`rasterize`] on tokio's blocking pool.
///
/// pdfium is CPU-bound and not async-aware; calling it directly from an
/// async task would stall a runtime worker for the whole document.
pub async fn rasterize_async(
    pdf_bytes: Vec<u8>,
    config: RasterizeConfig,
) -> Result<RasterOutput, PdfImgError> {
    tokio::task::spawn_blocking(move || rasterize(&pdf_bytes, &config))
        .await
        .map_err(|e| PdfImgError::Internal(format!("Rasterize task panicked: {}", e)))?
}

fn validate(config: &RasterizeConfig) -> Result<(), PdfImgError> {
    if config.dpi == 0 {
        return Err(PdfImgError::InvalidConfig("DPI must be positive".into()));
    }
    Ok(())
}
