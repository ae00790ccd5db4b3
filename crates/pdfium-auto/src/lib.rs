//! # pdfium-auto
//!
//! Locate, cache and bind a [PDFium](https://pdfium.googlesource.com/pdfium/)
//! shared library for `pdfium-render`, downloading it on first use.
//!
//! Resolution order used by [`ensure_pdfium_library`]:
//!
//! 1. `PDFIUM_LIB_PATH` if it names an existing file.
//! 2. `{cache}/pdfimg/pdfium-{VERSION}/{lib}` if already extracted.
//! 3. Download the platform `.tgz` from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries)
//!    and extract the library into the cache directory.
//!
//! The resolved path is memoised for the lifetime of the process.
//!
//! ```rust,no_run
//! let pdfium = pdfium_auto::bind_pdfium_silent().expect("PDFium unavailable");
//! let doc = pdfium.load_pdf_from_byte_slice(b"%PDF-1.7 ...", None);
//! ```
//!
//! ## Environment variable overrides
//!
//! - `PDFIUM_LIB_PATH` — path to an existing pdfium library; skips download.
//! - `PDFIUM_AUTO_CACHE_DIR` — override the default cache directory.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

// ── Public constants ─────────────────────────────────────────────────────────

/// The pdfium-binaries release tag used for downloads.
pub const PDFIUM_VERSION: &str = "7690";

const BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Application directory name under the platform cache root.
const CACHE_APP_DIR: &str = "pdfimg";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned while locating or binding PDFium.
#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Archive extraction failed: {0}")]
    Extract(String),

    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

// ── Platform table ───────────────────────────────────────────────────────────

struct PlatformInfo {
    /// Release asset, e.g. `pdfium-linux-x64.tgz`.
    archive_name: &'static str,
    /// Member path inside the archive.
    lib_path_in_archive: &'static str,
    /// File name written to the cache directory.
    lib_name: &'static str,
}

const UNIX_SO: (&str, &str) = ("lib/libpdfium.so", "libpdfium.so");
const MAC_DYLIB: (&str, &str) = ("lib/libpdfium.dylib", "libpdfium.dylib");
const WIN_DLL: (&str, &str) = ("bin/pdfium.dll", "pdfium.dll");

fn detect_platform() -> Result<PlatformInfo, PdfiumAutoError> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;

    let (archive_name, (lib_path_in_archive, lib_name)) = match (os, arch) {
        ("macos", "aarch64") => ("pdfium-mac-arm64.tgz", MAC_DYLIB),
        ("macos", "x86_64") => ("pdfium-mac-x64.tgz", MAC_DYLIB),
        ("linux", "x86_64") => ("pdfium-linux-x64.tgz", UNIX_SO),
        ("linux", "aarch64") => ("pdfium-linux-arm64.tgz", UNIX_SO),
        ("windows", "x86_64") => ("pdfium-win-x64.tgz", WIN_DLL),
        ("windows", "aarch64") => ("pdfium-win-arm64.tgz", WIN_DLL),
        ("windows", "x86") => ("pdfium-win-x86.tgz", WIN_DLL),
        (os, arch) => {
            return Err(PdfiumAutoError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            })
        }
    };

    Ok(PlatformInfo {
        archive_name,
        lib_path_in_archive,
        lib_name,
    })
}

// ── Cache directory ──────────────────────────────────────────────────────────

/// Per-version cache directory for the PDFium library.
///
/// Defaults to `{platform cache}/pdfimg/pdfium-{VERSION}/`, e.g.
/// `~/.cache/pdfimg/pdfium-7690/` on Linux. `PDFIUM_AUTO_CACHE_DIR` replaces
/// the `{platform cache}/pdfimg` prefix.
pub fn pdfium_cache_dir() -> PathBuf {
    let versioned = format!("pdfium-{PDFIUM_VERSION}");

    if let Ok(override_dir) = std::env::var("PDFIUM_AUTO_CACHE_DIR") {
        return PathBuf::from(override_dir).join(versioned);
    }

    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_APP_DIR)
        .join(versioned)
}

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Path of a PDFium library that can be bound without touching the network.
pub fn cached_pdfium_path() -> Option<PathBuf> {
    if let Some(p) = env_lib_path() {
        return Some(p);
    }
    let info = detect_platform().ok()?;
    let p = pdfium_cache_dir().join(info.lib_name);
    p.exists().then_some(p)
}

/// `true` when [`cached_pdfium_path`] would succeed.
pub fn is_pdfium_cached() -> bool {
    cached_pdfium_path().is_some()
}

/// Make sure a PDFium library exists locally and return its path.
///
/// `on_progress` receives `(bytes_downloaded, total_size)` while downloading.
/// Safe to call from several threads; the resolved path is memoised.
pub fn ensure_pdfium_library(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, PdfiumAutoError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = resolve_or_download(on_progress)?;

    // A racing thread may have set it first; both resolved the same file.
    let _ = RESOLVED_PATH.set(path.clone());

    Ok(path)
}

/// Bind to PDFium, downloading it first if necessary.
pub fn bind_pdfium(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<Pdfium, PdfiumAutoError> {
    let lib_path = ensure_pdfium_library(on_progress)?;
    bind_pdfium_from_path(&lib_path)
}

/// [`bind_pdfium`] without progress reporting.
pub fn bind_pdfium_silent() -> Result<Pdfium, PdfiumAutoError> {
    bind_pdfium(None)
}

/// Bind to the library at `path`, bypassing the cache layer.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    debug!("Binding PDFium from {}", path.display());
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn env_lib_path() -> Option<PathBuf> {
    let p = PathBuf::from(std::env::var_os("PDFIUM_LIB_PATH")?);
    p.exists().then_some(p)
}

fn resolve_or_download(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, PdfiumAutoError> {
    if let Some(p) = env_lib_path() {
        return Ok(p);
    }
    if let Some(p) = std::env::var_os("PDFIUM_LIB_PATH") {
        warn!(
            "PDFIUM_LIB_PATH '{}' does not exist; falling back to the cache",
            PathBuf::from(p).display()
        );
    }

    let info = detect_platform()?;
    let cache_dir = pdfium_cache_dir();
    let lib_path = cache_dir.join(info.lib_name);

    if lib_path.exists() {
        return Ok(lib_path);
    }

    let url = format!(
        "{}/chromium%2F{}/{}",
        BASE_URL, PDFIUM_VERSION, info.archive_name
    );
    info!("Downloading PDFium {} from {}", PDFIUM_VERSION, url);

    std::fs::create_dir_all(&cache_dir).map_err(PdfiumAutoError::CacheDir)?;

    let archive_bytes = download_bytes(&url, on_progress)?;
    extract_library(&archive_bytes, info.lib_path_in_archive, &lib_path)?;

    info!("PDFium cached at {}", lib_path.display());
    Ok(lib_path)
}

/// Read the response body in 64 KiB chunks, reporting progress per chunk.
fn download_bytes(
    url: &str,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<Vec<u8>, PdfiumAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumAutoError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumAutoError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PdfiumAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut buf = Vec::with_capacity(total.unwrap_or(32 * 1024 * 1024) as usize);
    let mut chunk = vec![0u8; 64 * 1024];
    let mut downloaded: u64 = 0;

    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                downloaded += n as u64;
                if let Some(cb) = on_progress {
                    cb(downloaded, total);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PdfiumAutoError::Download(format!("Read error: {e}"))),
        }
    }

    Ok(buf)
}

/// Unpack the single member `lib_path_in_archive` of a `.tgz` to `dest_path`.
fn extract_library(
    archive_bytes: &[u8],
    lib_path_in_archive: &str,
    dest_path: &Path,
) -> Result<(), PdfiumAutoError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let extract_err = |e: std::io::Error| PdfiumAutoError::Extract(e.to_string());
    let mut archive = Archive::new(GzDecoder::new(archive_bytes));

    for entry in archive.entries().map_err(extract_err)? {
        let mut entry = entry.map_err(extract_err)?;
        let is_target = entry.path().map_err(extract_err)?.to_string_lossy() == lib_path_in_archive;
        if is_target {
            entry
                .unpack(dest_path)
                .map_err(|e| PdfiumAutoError::Extract(format!("Unpack failed: {e}")))?;
            return Ok(());
        }
    }

    Err(PdfiumAutoError::Extract(format!(
        "Library '{lib_path_in_archive}' not found in archive"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_platform_is_supported() {
        let info = detect_platform().expect("current platform should be supported");
        assert!(info.archive_name.ends_with(".tgz"));
        assert!(info.lib_path_in_archive.ends_with(info.lib_name));
    }

    #[test]
    fn cache_dir_names_app_and_version() {
        let d = pdfium_cache_dir();
        assert!(d.to_string_lossy().contains(PDFIUM_VERSION));
        assert!(d.ends_with(format!("pdfium-{PDFIUM_VERSION}")));
    }

    #[test]
    fn cache_dir_override_via_env() {
        std::env::set_var("PDFIUM_AUTO_CACHE_DIR", "/tmp/test_pdfimg_override");
        let d = pdfium_cache_dir();
        std::env::remove_var("PDFIUM_AUTO_CACHE_DIR");
        assert_eq!(
            d,
            PathBuf::from("/tmp/test_pdfimg_override").join(format!("pdfium-{PDFIUM_VERSION}"))
        );
    }

    #[test]
    fn extract_rejects_garbage_archive() {
        let err = extract_library(b"not a tarball", "lib/libpdfium.so", Path::new("/nonexistent"))
            .unwrap_err();
        assert!(matches!(err, PdfiumAutoError::Extract(_)));
    }
}
