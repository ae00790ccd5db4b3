//! Progress-callback trait for per-item conversion events.
//!
//! An "item" is a page when rasterizing and an input image when assembling.
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::RasterizeConfigBuilder::progress_callback`] or
//! [`crate::config::AssembleConfigBuilder::progress_callback`].
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfimg::{ConversionProgressCallback, RasterizeConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_item_complete(&self, item_num: usize, total: usize, bytes: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} done ({} bytes)", item_num, total, bytes);
//!     }
//! }
//!
//! let config = RasterizeConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the rasterizer and the assembler as they process each item.
///
/// All methods default to no-ops, so implementors only override what they
/// need. Calls arrive on the thread running the conversion; the trait is
/// `Send + Sync` because the async wrappers move the config onto a blocking
/// worker thread.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first item, with the number of items.
    fn on_conversion_start(&self, total: usize) {
        let _ = total;
    }

    /// Called when an item succeeded.
    ///
    /// * `item_num` — 1-indexed position (page number, or position in the
    ///   sorted image list)
    /// * `bytes` — encoded size of the page image, or decoded RGB size of
    ///   the input image
    fn on_item_complete(&self, item_num: usize, total: usize, bytes: usize) {
        let _ = (item_num, total, bytes);
    }

    /// Called when an item failed. For rasterization this is followed by the
    /// call returning an error; for assembly the item is skipped.
    fn on_item_error(&self, item_num: usize, total: usize, error: &str) {
        let _ = (item_num, total, error);
    }

    /// Called once after a conversion finished without a fatal error.
    fn on_conversion_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Type stored in the config structs.
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        success: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_conversion_start(&self, total: usize) {
            self.started_total.store(total, Ordering::SeqCst);
        }

        fn on_item_complete(&self, _item_num: usize, _total: usize, _bytes: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_item_error(&self, _item_num: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, _total: usize, success_count: usize) {
            self.success.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(5);
        cb.on_item_complete(1, 5, 42);
        cb.on_item_error(2, 5, "some error");
        cb.on_conversion_complete(5, 4);
    }

    #[test]
    fn tracking_callback_through_arc_dyn() {
        let tracker = Arc::new(TrackingCallback::default());
        let cb: ProgressCallback = tracker.clone();

        cb.on_conversion_start(3);
        cb.on_item_complete(1, 3, 100);
        cb.on_item_error(2, 3, "cannot decode");
        cb.on_item_complete(3, 3, 300);
        cb.on_conversion_complete(3, 2);

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.success.load(Ordering::SeqCst), 2);
    }
}
