//! Progress-callback trait for per-chunk deck-building events.
//!
//! Inject an [`Arc<dyn DeckProgressCallback>`] via
//! [`crate::config::DeckConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline processes each chunk.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a channel, a WebSocket, a database record, or a
//! terminal progress bar — without the library knowing anything about how
//! the host application communicates. The trait is `Send + Sync` because
//! chunks are processed concurrently.

use std::sync::Arc;

/// Called by the pipeline as it processes each chunk.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `on_chunk_start`, `on_chunk_complete`, and
/// `on_chunk_error` may be called concurrently from different tasks;
/// implementations must protect shared mutable state accordingly.
pub trait DeckProgressCallback: Send + Sync {
    /// Called once after chunking, before any generation call.
    ///
    /// # Arguments
    /// * `total_chunks` — number of chunks that will be submitted
    fn on_deck_start(&self, total_chunks: usize) {
        let _ = total_chunks;
    }

    /// Called just before a chunk's generation call is sent.
    ///
    /// # Arguments
    /// * `index`        — 0-based chunk index
    /// * `total_chunks` — total chunks in this build
    /// * `page_label`   — human-readable page range, e.g. `pp.4–9`
    fn on_chunk_start(&self, index: usize, total_chunks: usize, page_label: &str) {
        let _ = (index, total_chunks, page_label);
    }

    /// Called when a chunk's generation call completed and parsed.
    ///
    /// # Arguments
    /// * `index`        — 0-based chunk index
    /// * `total_chunks` — total chunks
    /// * `card_count`   — card candidates parsed from this chunk's reply
    fn on_chunk_complete(&self, index: usize, total_chunks: usize, card_count: usize) {
        let _ = (index, total_chunks, card_count);
    }

    /// Called when a chunk's generation call failed or timed out.
    fn on_chunk_error(&self, index: usize, total_chunks: usize, error: &str) {
        let _ = (index, total_chunks, error);
    }

    /// Called once after every chunk has been attempted, before filtering.
    ///
    /// # Arguments
    /// * `total_chunks`  — total chunks in this build
    /// * `success_count` — chunks that completed without error
    fn on_deck_complete(&self, total_chunks: usize, success_count: usize) {
        let _ = (total_chunks, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl DeckProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::DeckConfig`].
pub type ProgressCallback = Arc<dyn DeckProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl DeckProgressCallback for TrackingCallback {
        fn on_chunk_start(&self, _index: usize, _total: usize, _label: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn on_chunk_complete(&self, _index: usize, _total: usize, _cards: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }
        fn on_chunk_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_deck_start(3);
        cb.on_chunk_start(0, 3, "p.1");
        cb.on_chunk_complete(0, 3, 12);
        cb.on_chunk_error(1, 3, "rate limited");
        cb.on_deck_complete(3, 2);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        };

        tracker.on_chunk_start(0, 2, "p.1");
        tracker.on_chunk_complete(0, 2, 9);
        tracker.on_chunk_start(1, 2, "pp.2–3");
        tracker.on_chunk_error(1, 2, "timeout");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn DeckProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_deck_start(10);
        cb.on_chunk_complete(1, 10, 5);
    }
}
