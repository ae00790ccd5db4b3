//! Packaging of rasterised pages for download.

use crate::error::PdfImgError;
use crate::output::RasterizedPage;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Default file name for an assembled PDF.
pub const DEFAULT_PDF_NAME: &str = "combined_images.pdf";

/// Download name for the page archive of `pdf_name`: `{stem}_images.zip`.
pub fn archive_name(pdf_name: &str) -> String {
    let stem = Path::new(pdf_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string());
    format!("{}_images.zip", stem)
}

/// Zip `pages` into an in-memory archive, one deflated entry per page in
/// the given order.
pub fn zip_pages(pages: &[RasterizedPage]) -> Result<Vec<u8>, PdfImgError> {
    let archive_err = |e: zip::result::ZipError| PdfImgError::ArchiveFailed {
        detail: e.to_string(),
    };

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for page in pages {
        zip.start_file(page.filename.as_str(), options)
            .map_err(archive_err)?;
        zip.write_all(&page.bytes)
            .map_err(|e| PdfImgError::ArchiveFailed {
                detail: format!("{}: {}", page.filename, e),
            })?;
    }

    let cursor = zip.finish().map_err(archive_err)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn page(n: usize, bytes: &[u8]) -> RasterizedPage {
        RasterizedPage {
            page_num: n,
            filename: format!("page_{n}.png"),
            width: 1,
            height: 1,
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn archive_name_uses_stem() {
        assert_eq!(archive_name("report.pdf"), "report_images.zip");
        assert_eq!(archive_name("dir/v1.2.pdf"), "v1.2_images.zip");
        assert_eq!(archive_name(""), "document_images.zip");
    }

    #[test]
    fn zip_keeps_page_order_and_contents() {
        let pages = [page(1, b"first"), page(2, b"second"), page(3, &[0u8; 4096])];
        let bytes = zip_pages(&pages).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);
        for (i, expected) in pages.iter().enumerate() {
            let mut entry = archive.by_index(i).unwrap();
            assert_eq!(entry.name(), expected.filename);
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            assert_eq!(data, expected.bytes);
        }
    }

    #[test]
    fn empty_archive_is_valid() {
        let bytes = zip_pages(&[]).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
