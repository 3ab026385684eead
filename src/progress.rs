//! Progress-callback trait for per-document analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to observe a
//! batch as it runs: forward events to a WebSocket, a job table, or a
//! terminal, without the library knowing how the host application reports
//! progress.
//!
//! Documents are analysed concurrently, so `on_document_*` methods may be
//! called from several tasks at once and in completion order, not
//! submission order. `index` is always the 0-based submission position.

use std::sync::Arc;

/// Called by the orchestrator as it processes each document.
///
/// All methods default to no-ops so callers only override what they need.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called once before any document is processed.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called just before a document is rasterised.
    fn on_document_start(&self, index: usize, category: &str) {
        let _ = (index, category);
    }

    /// Called when a document produced a result.
    ///
    /// `field_count` is the number of top-level keys extracted.
    fn on_document_complete(&self, index: usize, category: &str, field_count: usize) {
        let _ = (index, category, field_count);
    }

    /// Called when a document was skipped; `reason` is human-readable.
    fn on_document_skipped(&self, index: usize, category: &str, reason: &str) {
        let _ = (index, category, reason);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation, used when no callback is configured.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        completes: AtomicUsize,
        skips: AtomicUsize,
        started_total: AtomicUsize,
    }

    impl AnalysisProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_documents: usize) {
            self.started_total.store(total_documents, Ordering::SeqCst);
        }

        fn on_document_complete(&self, _index: usize, _category: &str, _field_count: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_skipped(&self, _index: usize, _category: &str, _reason: &str) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_document_start(0, "passportFile");
        cb.on_document_complete(0, "passportFile", 7);
        cb.on_document_skipped(1, "notesFile", "No fields registered");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_batch_start(3);
        tracker.on_document_complete(0, "passportFile", 5);
        tracker.on_document_complete(2, "addressProofFile", 1);
        tracker.on_document_skipped(1, "birthCertificateFile", "timed out");

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skips.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn AnalysisProgressCallback>();
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(1);
    }
}
