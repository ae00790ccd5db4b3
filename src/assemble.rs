//! Images → PDF.
//!
//! Inputs are ordered by a stable lexicographic sort on their names, so
//! `page_10.png` sorts before `page_2.png`. Each image is decoded, flattened
//! to RGB and appended as one page sized `pixels × 72 / resolution` points.
//!
//! An image that fails to decode is skipped with an [`AssetError`]; the call
//! only fails when *no* image survives.

use crate::config::AssembleConfig;
use crate::error::{AssetError, PdfImgError};
use crate::output::{AssembleOutcome, AssembleStats, AssembledPdf, NamedImage};
use crate::pipeline::{input, normalize, pdf::PdfWriter};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Merge `images` into a single PDF, one page per decodable image.
///
/// Returns [`AssembleOutcome::NoInput`] for an empty list rather than an
/// empty document.
///
/// # Errors
/// - [`PdfImgError::NoValidImages`] — every image failed to decode
/// - [`PdfImgError::PdfSerialize`] — the PDF could not be written
/// - [`PdfImgError::InvalidConfig`] — resolution is not a positive number
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdfimg::{assemble, AssembleConfig, NamedImage};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let images = vec![
///     NamedImage::new("b.png", std::fs::read("b.png")?),
///     NamedImage::new("a.png", std::fs::read("a.png")?),
/// ];
/// if let Some(pdf) = assemble(images, &AssembleConfig::default())?.into_pdf() {
///     assert_eq!(pdf.page_order, ["a.png", "b.png"]);
///     pdf.write_to("combined_images.pdf")?;
/// }
/// # Ok(())
/// # }
/// ```
pub fn assemble(
    mut images: Vec<NamedImage>,
    config: &AssembleConfig,
) -> Result<AssembleOutcome, PdfImgError> {
    if !config.resolution.is_finite() || config.resolution <= 0.0 {
        return Err(PdfImgError::InvalidConfig(format!(
            "Resolution must be a positive number, got {}",
            config.resolution
        )));
    }

    if images.is_empty() {
        warn!("No images supplied; nothing to assemble");
        return Ok(AssembleOutcome::NoInput);
    }

    let start = Instant::now();
    let total = images.len();
    let cb = config.progress_callback.as_deref();

    // `sort_by` is stable: equal names keep their input order.
    images.sort_by(|a, b| a.name.cmp(&b.name));
    info!(
        "Assembling {} images: {}",
        total,
        images
            .iter()
            .map(|i| i.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    if let Some(cb) = cb {
        cb.on_conversion_start(total);
    }

    let mut writer = PdfWriter::new(config);
    let mut page_order = Vec::with_capacity(total);
    let mut skipped = Vec::new();

    for (index, image) in images.into_iter().enumerate() {
        let item_num = index + 1;
        let rgb = match normalize::decode_rgb8(&image.bytes, config.background) {
            Ok(rgb) => rgb,
            Err(e) => {
                let err = AssetError::Decode {
                    name: image.name,
                    detail: e.to_string(),
                };
                warn!("Skipping: {}", err);
                if let Some(cb) = cb {
                    cb.on_item_error(item_num, total, &err.to_string());
                }
                skipped.push(err);
                continue;
            }
        };

        writer.add_page(&rgb)?;
        if let Some(cb) = cb {
            cb.on_item_complete(item_num, total, rgb.as_raw().len());
        }
        page_order.push(image.name);
    }

    if writer.page_count() == 0 {
        let first_error = skipped
            .first()
            .map(|e| e.to_string())
            .unwrap_or_default();
        return Err(PdfImgError::NoValidImages { total, first_error });
    }

    let bytes = writer.finish()?;
    let stats = AssembleStats {
        input_count: total,
        page_count: page_order.len(),
        skipped_count: skipped.len(),
        total_bytes: bytes.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Assembled {} pages ({} skipped) → {} bytes in {}ms",
        stats.page_count, stats.skipped_count, stats.total_bytes, stats.duration_ms
    );
    if let Some(cb) = cb {
        cb.on_conversion_complete(total, stats.page_count);
    }

    Ok(AssembleOutcome::Assembled(AssembledPdf {
        bytes,
        page_order,
        skipped,
        stats,
    }))
}

/// Read images from files and directories, then [`assemble`] them.
///
/// Directories contribute their `.png`, `.jpg` and `.jpeg` files.
pub fn assemble_files(
    paths: &[PathBuf],
    config: &AssembleConfig,
) -> Result<AssembleOutcome, PdfImgError> {
    let images = input::read_images(paths)?;
    assemble(images, config)
}

/// Run [`assemble`] on tokio's blocking pool.
pub async fn assemble_async(
    images: Vec<NamedImage>,
    config: AssembleConfig,
) -> Result<AssembleOutcome, PdfImgError> {
    tokio::task::spawn_blocking(move || assemble(images, &config))
        .await
        .map_err(|e| PdfImgError::Internal(format!("Assemble task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageCompression;
    use crate::pipeline::encode::encode_page;
    use crate::OutputFormat;
    use image::{Rgb, RgbImage};
    use lopdf::Document;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([0, 128, 255]));
        encode_page(&img, OutputFormat::Png, 95).unwrap()
    }

    fn page_widths(bytes: &[u8]) -> Vec<f32> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|id| {
                let dict = doc.get_dictionary(*id).unwrap();
                let mb = dict.get(b"MediaBox").unwrap().as_array().unwrap();
                mb[2].as_float().unwrap()
            })
            .collect()
    }

    #[test]
    fn pages_follow_name_order() {
        let images = vec![
            NamedImage::new("b.png", png(200, 10)),
            NamedImage::new("a.png", png(100, 10)),
        ];
        let pdf = assemble(images, &AssembleConfig::default())
            .unwrap()
            .into_pdf()
            .unwrap();
        assert_eq!(pdf.page_order, ["a.png", "b.png"]);

        // a.png (100 px → 72 pt) must be page 1
        let widths = page_widths(&pdf.bytes);
        assert!((widths[0] - 72.0).abs() < 1e-3, "{widths:?}");
        assert!((widths[1] - 144.0).abs() < 1e-3, "{widths:?}");
    }

    #[test]
    fn ordering_is_lexicographic_not_numeric() {
        let images = ["page_2.png", "page_10.png", "page_1.png"]
            .into_iter()
            .map(|n| NamedImage::new(n, png(4, 4)))
            .collect();
        let pdf = assemble(images, &AssembleConfig::default())
            .unwrap()
            .into_pdf()
            .unwrap();
        assert_eq!(pdf.page_order, ["page_1.png", "page_10.png", "page_2.png"]);
    }

    #[test]
    fn empty_input_is_no_input() {
        let outcome = assemble(Vec::new(), &AssembleConfig::default()).unwrap();
        assert!(outcome.is_no_input());
    }

    #[test]
    fn undecodable_image_is_skipped() {
        let images = vec![
            NamedImage::new("1.png", png(8, 8)),
            NamedImage::new("2.png", b"not an image".to_vec()),
            NamedImage::new("3.png", png(8, 8)),
        ];
        let pdf = assemble(images, &AssembleConfig::default())
            .unwrap()
            .into_pdf()
            .unwrap();

        assert_eq!(pdf.page_order, ["1.png", "3.png"]);
        assert_eq!(pdf.skipped.len(), 1);
        assert_eq!(pdf.skipped[0].name(), "2.png");
        assert_eq!(pdf.stats.input_count, 3);
        assert_eq!(pdf.stats.skipped_count, 1);
        assert_eq!(Document::load_mem(&pdf.bytes).unwrap().get_pages().len(), 2);
    }

    #[test]
    fn all_invalid_is_an_error() {
        let images = vec![
            NamedImage::new("x.png", b"junk".to_vec()),
            NamedImage::new("y.jpg", Vec::new()),
        ];
        let err = assemble(images, &AssembleConfig::default()).unwrap_err();
        match err {
            PdfImgError::NoValidImages { total, first_error } => {
                assert_eq!(total, 2);
                assert!(first_error.contains("x.png"), "{first_error}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn mixed_colour_modes_are_accepted() {
        let mut gray = Vec::new();
        image::GrayImage::from_pixel(5, 5, image::Luma([90]))
            .write_to(&mut std::io::Cursor::new(&mut gray), image::ImageFormat::Png)
            .unwrap();
        let mut rgba = Vec::new();
        image::RgbaImage::from_pixel(5, 5, image::Rgba([10, 20, 30, 0]))
            .write_to(&mut std::io::Cursor::new(&mut rgba), image::ImageFormat::Png)
            .unwrap();
        let jpeg = encode_page(&RgbImage::new(5, 5), OutputFormat::Jpg, 90).unwrap();

        let images = vec![
            NamedImage::new("a_gray.png", gray),
            NamedImage::new("b_rgba.png", rgba),
            NamedImage::new("c.jpg", jpeg),
        ];
        for compression in [ImageCompression::Flate, ImageCompression::default()] {
            let config = AssembleConfig::builder().compression(compression).build().unwrap();
            let pdf = assemble(images.clone(), &config).unwrap().into_pdf().unwrap();
            assert!(pdf.skipped.is_empty());
            assert_eq!(Document::load_mem(&pdf.bytes).unwrap().get_pages().len(), 3);
        }
    }

    #[test]
    fn invalid_resolution_is_rejected() {
        let mut config = AssembleConfig::default();
        config.resolution = 0.0;
        let err = assemble(vec![NamedImage::new("a.png", png(1, 1))], &config).unwrap_err();
        assert!(matches!(err, PdfImgError::InvalidConfig(_)));
    }

    #[test]
    fn assemble_files_reads_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), png(3, 3)).unwrap();
        std::fs::write(dir.path().join("a.png"), png(3, 3)).unwrap();
        let pdf = assemble_files(&[dir.path().to_path_buf()], &AssembleConfig::default())
            .unwrap()
            .into_pdf()
            .unwrap();
        assert_eq!(pdf.page_order, ["a.png", "b.png"]);
    }

    #[tokio::test]
    async fn async_wrapper_matches_sync() {
        let images = vec![NamedImage::new("only.png", png(2, 2))];
        let pdf = assemble_async(images, AssembleConfig::default())
            .await
            .unwrap()
            .into_pdf()
            .unwrap();
        assert_eq!(pdf.stats.page_count, 1);
    }
}
