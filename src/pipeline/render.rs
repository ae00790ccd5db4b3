//! PDF rasterisation: open a document from memory and render single pages.
//!
//! Pages are rendered to an explicit pixel size rather than through pdfium's
//! page-scale option: `round(points × dpi / 72)` per axis, floored at one
//! pixel. Computing the size here keeps it a pure function of page size and
//! DPI, so raising the DPI can never shrink a raster.

use crate::error::PdfImgError;
use crate::pipeline::input::has_pdf_header;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Pixel size of a page measuring `width_pt × height_pt` points at `scale`.
pub fn target_size(width_pt: f32, height_pt: f32, scale: f32) -> (i32, i32) {
    let px = |pt: f32| (pt * scale).round().max(1.0) as i32;
    (px(width_pt), px(height_pt))
}

/// Open `bytes` as a PDF document.
///
/// The returned document borrows both the binding and the buffer, and is
/// closed when dropped, on success and error paths alike.
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    bytes: &'a [u8],
) -> Result<PdfDocument<'a>, PdfImgError> {
    if !has_pdf_header(bytes) {
        return Err(PdfImgError::DocumentOpen {
            detail: "no %PDF header found in the first 1024 bytes".into(),
        });
    }

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| PdfImgError::DocumentOpen {
            detail: format!("{:?}", e),
        })?;

    info!("PDF loaded: {} pages", document.pages().len());
    Ok(document)
}

/// Render one page at `scale` (pixels per point).
///
/// `page_num` is 1-indexed and only used for error context and logging.
pub fn render_page(
    page: &PdfPage,
    page_num: usize,
    scale: f32,
) -> Result<DynamicImage, PdfImgError> {
    let (width, height) = target_size(page.width().value, page.height().value, scale);

    let render_config = PdfRenderConfig::new()
        .set_target_width(width)
        .set_target_height(height);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| PdfImgError::PageRender {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_num,
        image.width(),
        image.height()
    );

    Ok(image)
}
