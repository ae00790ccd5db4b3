//! Input loading: read a PDF or a set of images from the file system.
//!
//! The core conversions work on byte buffers; this module is the thin layer
//! that turns paths into those buffers with meaningful errors.

use crate::error::PdfImgError;
use crate::output::NamedImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extensions picked up when a directory is passed to [`read_images`].
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// How far into the buffer the `%PDF-` marker may appear.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// `true` if `bytes` carries a `%PDF-` marker within the first 1024 bytes.
///
/// Readers tolerate a little junk before the header, so the marker is not
/// required at offset 0.
pub fn has_pdf_header(bytes: &[u8]) -> bool {
    bytes
        .windows(5)
        .take(HEADER_SEARCH_WINDOW)
        .any(|w| w == b"%PDF-")
}

/// Read a file, mapping I/O failures onto the library's error variants.
fn read_file(path: &Path) -> Result<Vec<u8>, PdfImgError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PdfImgError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => PdfImgError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => PdfImgError::InputReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

/// Read a PDF from disk.
///
/// Header validation is left to [`crate::rasterize`] so that byte-buffer
/// callers and file callers see the same `DocumentOpen` error.
pub fn read_pdf(path: impl AsRef<Path>) -> Result<Vec<u8>, PdfImgError> {
    let path = path.as_ref();
    let bytes = read_file(path)?;
    debug!("Read PDF {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// `true` if the path's extension is one of [`IMAGE_EXTENSIONS`].
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| e.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Expand directories (non-recursively) into their image files.
///
/// Plain file paths are passed through whatever their extension, so a
/// mislabelled file still reaches the decoder and gets a proper diagnostic.
pub fn expand_image_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>, PdfImgError> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let entries = std::fs::read_dir(path).map_err(|e| PdfImgError::InputReadFailed {
            path: path.clone(),
            source: e,
        })?;
        let mut found = 0;
        for entry in entries {
            let entry = entry.map_err(|e| PdfImgError::InputReadFailed {
                path: path.clone(),
                source: e,
            })?;
            let p = entry.path();
            if p.is_file() && is_image_path(&p) {
                files.push(p);
                found += 1;
            }
        }
        debug!("{}: {} image files", path.display(), found);
    }

    Ok(files)
}

/// Read every image under `paths` as a [`NamedImage`] keyed by file name.
///
/// Order is not significant: [`crate::assemble`] sorts by name.
pub fn read_images(paths: &[PathBuf]) -> Result<Vec<NamedImage>, PdfImgError> {
    let files = expand_image_paths(paths)?;
    let images = files
        .iter()
        .map(|p| {
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.to_string_lossy().into_owned());
            Ok(NamedImage::new(name, read_file(p)?))
        })
        .collect::<Result<Vec<_>, PdfImgError>>()?;

    info!("Read {} image files", images.len());
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_at_start_and_after_junk() {
        assert!(has_pdf_header(b"%PDF-1.7\n..."));
        let mut junk = vec![b' '; 300];
        junk.extend_from_slice(b"%PDF-1.4");
        assert!(has_pdf_header(&junk));
    }

    #[test]
    fn header_missing_or_too_late() {
        assert!(!has_pdf_header(b""));
        assert!(!has_pdf_header(b"%PD"));
        assert!(!has_pdf_header(b"\x89PNG\r\n\x1a\n"));
        let mut late = vec![0u8; 2048];
        late.extend_from_slice(b"%PDF-1.4");
        assert!(!has_pdf_header(&late));
    }

    #[test]
    fn image_extensions_case_insensitive() {
        assert!(is_image_path(Path::new("a.PNG")));
        assert!(is_image_path(Path::new("dir/b.jpeg")));
        assert!(!is_image_path(Path::new("c.gif")));
        assert!(!is_image_path(Path::new("noext")));
    }

    #[test]
    fn read_pdf_missing_file() {
        let err = read_pdf("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, PdfImgError::FileNotFound { .. }));
    }

    #[test]
    fn read_images_expands_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"b").unwrap();
        std::fs::write(dir.path().join("a.JPG"), b"a").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip me").unwrap();
        let loose = dir.path().join("loose.bin");
        std::fs::write(&loose, b"x").unwrap();

        let mut images = read_images(&[dir.path().to_path_buf(), loose]).unwrap();
        images.sort_by(|a, b| a.name.cmp(&b.name));
        let names: Vec<&str> = images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["a.JPG", "b.png", "loose.bin"]);
        assert_eq!(images[1].bytes, b"b");
    }
}
