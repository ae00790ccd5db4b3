//! Configuration types for both conversion directions.
//!
//! [`RasterizeConfig`] controls PDF → images, [`AssembleConfig`] controls
//! images → PDF. Both are built through a builder that validates on
//! [`build`](RasterizeConfigBuilder::build), and both carry an optional
//! progress callback. Every value is an explicit parameter of the call; there
//! is no global state.

use crate::error::PdfImgError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PDF base resolution: one point is 1/72 inch.
pub const PDF_POINTS_PER_INCH: f32 = 72.0;

// ── Output format ────────────────────────────────────────────────────────

/// Encoding used for rasterized pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless PNG. (default)
    #[default]
    Png,
    /// Lossy JPEG at [`RasterizeConfig::jpeg_quality`].
    Jpg,
}

impl OutputFormat {
    /// File extension without the dot; also the accepted format literal.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
        }
    }

    /// `page_{n}.{ext}` with `page_num` 1-indexed.
    pub fn page_filename(self, page_num: usize) -> String {
        format!("page_{}.{}", page_num, self.extension())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = PdfImgError;

    /// Accepts `png` and `jpg`, case-insensitively. Anything else is a usage
    /// error, including `jpeg`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" => Ok(OutputFormat::Jpg),
            _ => Err(PdfImgError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

// ── Rasterize ────────────────────────────────────────────────────────────

/// Configuration for PDF → images.
///
/// # Example
/// ```rust
/// use edgequake_pdfimg::{OutputFormat, RasterizeConfig};
///
/// let config = RasterizeConfig::builder()
///     .format(OutputFormat::Jpg)
///     .dpi(300)
///     .build()
///     .unwrap();
/// assert_eq!(config.scale_factor(), 300.0 / 72.0);
/// ```
#[derive(Clone)]
pub struct RasterizeConfig {
    /// Page encoding. Default: PNG.
    pub format: OutputFormat,

    /// Rendering resolution in dots per inch. Any positive value is accepted;
    /// the CLI limits it to 72–600. Default: 200.
    pub dpi: u32,

    /// JPEG quality, 1–100. Ignored for PNG. Default: 95.
    pub jpeg_quality: u8,

    /// Per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RasterizeConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            dpi: 200,
            jpeg_quality: 95,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RasterizeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterizeConfig")
            .field("format", &self.format)
            .field("dpi", &self.dpi)
            .field("jpeg_quality", &self.jpeg_quality)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl RasterizeConfig {
    pub fn builder() -> RasterizeConfigBuilder {
        RasterizeConfigBuilder {
            config: Self::default(),
        }
    }

    /// Linear zoom applied to both page axes: `dpi / 72`.
    pub fn scale_factor(&self) -> f32 {
        self.dpi as f32 / PDF_POINTS_PER_INCH
    }
}

/// Builder for [`RasterizeConfig`].
#[derive(Debug)]
pub struct RasterizeConfigBuilder {
    config: RasterizeConfig,
}

impl RasterizeConfigBuilder {
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn build(self) -> Result<RasterizeConfig, PdfImgError> {
        if self.config.dpi == 0 {
            return Err(PdfImgError::InvalidConfig("DPI must be positive".into()));
        }
        Ok(self.config)
    }
}

// ── Assemble ─────────────────────────────────────────────────────────────

/// How images are stored inside the assembled PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageCompression {
    /// Lossless zlib (`/FlateDecode`).
    Flate,
    /// Baseline JPEG (`/DCTDecode`) at the given quality, 1–100.
    Jpeg { quality: u8 },
}

impl Default for ImageCompression {
    fn default() -> Self {
        ImageCompression::Jpeg { quality: 75 }
    }
}

/// Configuration for images → PDF.
#[derive(Clone)]
pub struct AssembleConfig {
    /// Resolution tag in DPI used to size each page: a page measures
    /// `pixels × 72 / resolution` points. Pixel data is never resampled.
    /// Default: 100.
    pub resolution: f32,

    /// Image stream encoding. Default: JPEG quality 75.
    pub compression: ImageCompression,

    /// Opaque colour that transparent pixels are composited onto.
    /// Default: white.
    pub background: [u8; 3],

    /// Document `/Title`, if any.
    pub title: Option<String>,

    /// Per-image progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AssembleConfig {
    fn default() -> Self {
        Self {
            resolution: 100.0,
            compression: ImageCompression::default(),
            background: [255, 255, 255],
            title: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AssembleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssembleConfig")
            .field("resolution", &self.resolution)
            .field("compression", &self.compression)
            .field("background", &self.background)
            .field("title", &self.title)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl AssembleConfig {
    pub fn builder() -> AssembleConfigBuilder {
        AssembleConfigBuilder {
            config: Self::default(),
        }
    }

    /// Page size in points for an image of `width × height` pixels.
    pub fn page_size_points(&self, width: u32, height: u32) -> (f32, f32) {
        let k = PDF_POINTS_PER_INCH / self.resolution;
        (width as f32 * k, height as f32 * k)
    }
}

/// Builder for [`AssembleConfig`].
#[derive(Debug)]
pub struct AssembleConfigBuilder {
    config: AssembleConfig,
}

impl AssembleConfigBuilder {
    pub fn resolution(mut self, dpi: f32) -> Self {
        self.config.resolution = dpi;
        self
    }

    pub fn compression(mut self, compression: ImageCompression) -> Self {
        self.config.compression = match compression {
            ImageCompression::Jpeg { quality } => ImageCompression::Jpeg {
                quality: quality.clamp(1, 100),
            },
            other => other,
        };
        self
    }

    pub fn background(mut self, rgb: [u8; 3]) -> Self {
        self.config.background = rgb;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn build(self) -> Result<AssembleConfig, PdfImgError> {
        let r = self.config.resolution;
        if !r.is_finite() || r <= 0.0 {
            return Err(PdfImgError::InvalidConfig(format!(
                "Resolution must be a positive number, got {r}"
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_format_literals() {
        assert_eq!("png".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpg);
        assert_eq!(" jpg ".parse::<OutputFormat>().unwrap(), OutputFormat::Jpg);
    }

    #[test]
    fn parse_rejects_other_literals() {
        for bad in ["jpeg", "gif", "", "pdf"] {
            let err = bad.parse::<OutputFormat>().unwrap_err();
            assert!(
                matches!(err, PdfImgError::UnsupportedFormat { ref format } if format == bad),
                "{bad:?} → {err:?}"
            );
        }
    }

    #[test]
    fn page_filenames_are_one_based() {
        assert_eq!(OutputFormat::Png.page_filename(1), "page_1.png");
        assert_eq!(OutputFormat::Jpg.page_filename(12), "page_12.jpg");
    }

    #[test]
    fn rasterize_defaults() {
        let c = RasterizeConfig::default();
        assert_eq!(c.format, OutputFormat::Png);
        assert_eq!(c.dpi, 200);
        assert_eq!(c.jpeg_quality, 95);
        assert!(c.progress_callback.is_none());
    }

    #[test]
    fn scale_factor_is_dpi_over_72() {
        let c = RasterizeConfig::builder().dpi(144).build().unwrap();
        assert_eq!(c.scale_factor(), 2.0);
        let c = RasterizeConfig::builder().dpi(72).build().unwrap();
        assert_eq!(c.scale_factor(), 1.0);
    }

    #[test]
    fn zero_dpi_is_rejected() {
        let err = RasterizeConfig::builder().dpi(0).build().unwrap_err();
        assert!(matches!(err, PdfImgError::InvalidConfig(_)));
    }

    #[test]
    fn dpi_outside_ui_range_is_accepted() {
        assert_eq!(RasterizeConfig::builder().dpi(1200).build().unwrap().dpi, 1200);
        assert_eq!(RasterizeConfig::builder().dpi(10).build().unwrap().dpi, 10);
    }

    #[test]
    fn jpeg_quality_is_clamped() {
        let c = RasterizeConfig::builder().jpeg_quality(0).build().unwrap();
        assert_eq!(c.jpeg_quality, 1);
        let c = RasterizeConfig::builder().jpeg_quality(200).build().unwrap();
        assert_eq!(c.jpeg_quality, 100);
    }

    #[test]
    fn assemble_page_size_uses_resolution_tag() {
        let c = AssembleConfig::default();
        assert_eq!(c.page_size_points(100, 200), (72.0, 144.0));
        let c = AssembleConfig::builder().resolution(72.0).build().unwrap();
        assert_eq!(c.page_size_points(640, 480), (640.0, 480.0));
    }

    #[test]
    fn assemble_rejects_bad_resolution() {
        for r in [0.0, -5.0, f32::NAN, f32::INFINITY] {
            assert!(AssembleConfig::builder().resolution(r).build().is_err());
        }
    }

    #[test]
    fn debug_hides_callback() {
        let cb: ProgressCallback = std::sync::Arc::new(crate::progress::NoopProgressCallback);
        let c = AssembleConfig::builder().progress_callback(cb).build().unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn ConversionProgressCallback>"));
    }
}
