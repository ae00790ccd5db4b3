//! PDF writing: one RGB8 raster per page, built with `lopdf`.
//!
//! Each page is an image XObject drawn over the full media box:
//!
//! ```text
//! q  W 0 0 H 0 0 cm  /Im0 Do  Q
//! ```
//!
//! where `W × H` is the page size in points (`pixels × 72 / resolution`).
//! The page tree object id is reserved up front so pages can point at their
//! parent before the tree itself is written in [`PdfWriter::finish`].

use crate::config::{AssembleConfig, ImageCompression};
use crate::error::PdfImgError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;
use tracing::debug;

const IMAGE_NAME: &str = "Im0";
const PRODUCER: &str = concat!("edgequake-pdfimg ", env!("CARGO_PKG_VERSION"));

/// Incremental builder for an image-only PDF.
pub struct PdfWriter {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    config: AssembleConfig,
}

impl PdfWriter {
    pub fn new(config: &AssembleConfig) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            config: config.clone(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append `image` as a new last page.
    pub fn add_page(&mut self, image: &RgbImage) -> Result<(), PdfImgError> {
        let (width, height) = image.dimensions();
        let (page_w, page_h) = self.config.page_size_points(width, height);

        let image_id = self.doc.add_object(self.image_stream(image)?);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        page_w.into(),
                        0.into(),
                        0.into(),
                        page_h.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content.encode().map_err(serialize_err)?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content_bytes));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page_w.into(), page_h.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_NAME => image_id,
                },
            },
        });
        self.kids.push(page_id.into());

        debug!(
            "Page {}: {}x{} px → {:.1}x{:.1} pt",
            self.kids.len(),
            width,
            height,
            page_w,
            page_h
        );
        Ok(())
    }

    fn image_stream(&self, image: &RgbImage) -> Result<Stream, PdfImgError> {
        let (width, height) = image.dimensions();
        let (filter, data) = match self.config.compression {
            ImageCompression::Flate => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(image.as_raw()).map_err(serialize_err)?;
                ("FlateDecode", encoder.finish().map_err(serialize_err)?)
            }
            ImageCompression::Jpeg { quality } => {
                let mut buf = Vec::new();
                image
                    .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
                    .map_err(serialize_err)?;
                ("DCTDecode", buf)
            }
        };

        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => filter,
        };
        // Already encoded; keep lopdf from compressing it a second time.
        Ok(Stream::new(dict, data).with_compression(false))
    }

    /// Write the page tree, catalog and info dictionary, then serialise.
    pub fn finish(mut self) -> Result<Vec<u8>, PdfImgError> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Producer" => Object::string_literal(PRODUCER),
        };
        if let Some(title) = self.config.title.as_deref() {
            info.set("Title", Object::string_literal(title));
        }
        let info_id = self.doc.add_object(info);
        self.doc.trailer.set("Info", info_id);

        let mut buf = Vec::new();
        self.doc.save_to(&mut buf).map_err(serialize_err)?;
        Ok(buf)
    }
}

fn serialize_err(e: impl std::fmt::Display) -> PdfImgError {
    PdfImgError::PdfSerialize {
        detail: e.to_string(),
    }
}
