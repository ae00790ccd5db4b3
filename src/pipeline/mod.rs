//! Pipeline stages shared by the rasterizer and the assembler.
//!
//! ## Data Flow
//!
//! ```text
//! rasterize:  input ──▶ render ──▶ normalize ──▶ encode
//!            (bytes)   (pdfium)    (RGB8)       (PNG/JPEG)
//!
//! assemble:   input ──▶ normalize ──▶ pdf
//!            (files)   (decode, RGB8)  (lopdf pages)
//! ```
//!
//! 1. [`input`]     — read PDFs and images from disk, check the PDF header
//! 2. [`render`]    — open a document with pdfium and rasterise one page
//! 3. [`normalize`] — decode images and flatten any colour mode to RGB8
//! 4. [`encode`]    — PNG/JPEG-encode a rendered page
//! 5. [`pdf`]       — write RGB8 rasters as pages of a new PDF

pub mod encode;
pub mod input;
pub mod normalize;
pub mod pdf;
pub mod render;
