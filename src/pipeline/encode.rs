//! Page encoding: RGB8 raster → PNG or JPEG bytes.
//!
//! Rasters arrive here already flattened to RGB, so neither encoder ever
//! sees an alpha channel. PNG is lossless and takes no quality parameter.

use crate::config::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ImageResult, RgbImage};
use tracing::debug;

/// Encode a rendered page in `format`. `jpeg_quality` only applies to JPEG.
pub fn encode_page(
    image: &RgbImage,
    format: OutputFormat,
    jpeg_quality: u8,
) -> ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::Png => image.write_with_encoder(PngEncoder::new(&mut buf))?,
        OutputFormat::Jpg => {
            image.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, jpeg_quality))?
        }
    }

    debug!(
        "Encoded {}x{} raster → {} bytes {}",
        image.width(),
        image.height(),
        buf.len(),
        format
    );
    Ok(buf)
}
