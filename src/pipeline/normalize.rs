//! Colour-mode normalisation: any decoded image → 8-bit RGB.
//!
//! Both directions need a single channel layout. JPEG has no alpha channel,
//! and the PDF writer embeds every page as `/DeviceRGB` with 8 bits per
//! component. Normalisation rules:
//!
//! | Source                | Result                                        |
//! |-----------------------|-----------------------------------------------|
//! | RGB8                  | unchanged                                     |
//! | Luma8 / Luma16        | grey replicated into R, G and B               |
//! | any mode with alpha   | composited onto an opaque background colour   |
//! | 16-bit / float        | reduced to 8 bits per channel                 |
//!
//! Palette PNGs never reach this module as palettes: the `image` PNG decoder
//! expands them to RGB or RGBA during decoding.

use image::{DynamicImage, ImageResult, RgbImage};

/// Decode an encoded image (format sniffed from its magic bytes).
pub fn decode(bytes: &[u8]) -> ImageResult<DynamicImage> {
    image::load_from_memory(bytes)
}

/// Convert `image` to RGB8, compositing any alpha onto `background`.
pub fn to_rgb8(image: DynamicImage, background: [u8; 3]) -> RgbImage {
    if !image.color().has_alpha() {
        return image.into_rgb8();
    }

    let rgba = image.into_rgba8();
    let (width, height) = rgba.dimensions();
    let mut out = RgbImage::new(width, height);

    for (src, dst) in rgba.pixels().zip(out.pixels_mut()) {
        let [r, g, b, a] = src.0;
        dst.0 = [
            blend(r, background[0], a),
            blend(g, background[1], a),
            blend(b, background[2], a),
        ];
    }

    out
}

/// `fg` over `bg` with coverage `alpha`, rounded to nearest.
fn blend(fg: u8, bg: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((fg as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8
}

/// Decode and normalise in one step.
pub fn decode_rgb8(bytes: &[u8], background: [u8; 3]) -> ImageResult<RgbImage> {
    decode(bytes).map(|img| to_rgb8(img, background))
}
