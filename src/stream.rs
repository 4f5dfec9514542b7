//! Streaming deck building: emit chunk results as they complete.
//!
//! ## Why stream?
//!
//! A large document takes minutes to process. A stream-based API lets
//! callers show live card counts, persist partial progress, or abandon the
//! build early, instead of staring at an opaque future.
//!
//! Unlike the eager [`crate::deck::build_deck`], which filters across all
//! chunks before returning, the stream yields each [`ChunkResult`]'s raw
//! card candidates as its generation call finishes. Cross-chunk
//! deduplication inherently needs every chunk, so the caller collects the
//! stream and runs [`crate::pipeline::quality::filter_and_deduplicate`]
//! (re-exported as [`crate::filter_and_deduplicate`]) over the
//! concatenation — in chunk-index order, so earlier pages keep dedup
//! priority.

use crate::config::DeckConfig;
use crate::error::Pdf2AnkiError;
use crate::output::ChunkResult;
use crate::pipeline::chunk::chunk_pages;
use crate::pipeline::{extract, generate, input};
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of chunk results.
pub type ChunkStream = Pin<Box<dyn Stream<Item = ChunkResult> + Send>>;

/// Build a deck, streaming chunk results as they are ready.
///
/// Results are emitted in completion order (not necessarily chunk order);
/// each carries its `index` for re-sorting. Failed chunks are emitted too,
/// with `error: Some(..)` and no cards, so the consumer sees the whole
/// picture.
///
/// # Returns
/// - `Ok(ChunkStream)` — a stream of [`ChunkResult`]
/// - `Err(Pdf2AnkiError)` — fatal error (file not found, no provider,
///   no usable text)
pub async fn build_deck_stream(
    input_str: impl AsRef<str>,
    config: &DeckConfig,
) -> Result<ChunkStream, Pdf2AnkiError> {
    let input_str = input_str.as_ref();
    info!("Starting streaming deck build: {}", input_str);

    // ── Resolve input ────────────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Get provider ─────────────────────────────────────────────────────
    let provider = crate::deck::resolve_provider(config)?;

    // ── Extract and chunk up front; only generation is streamed ──────────
    let extracted = extract::extract_pages(&pdf_path, config).await?;
    let chunks = chunk_pages(&extracted.pages, config.max_words_per_chunk);
    info!("Streaming {} chunks", chunks.len());

    if let Some(ref cb) = config.progress_callback {
        cb.on_deck_start(chunks.len());
    }

    let total_chunks = chunks.len();
    let concurrency = config.concurrency;
    let config = config.clone();

    let s = stream::iter(chunks.into_iter().enumerate().map(move |(index, chunk)| {
        let provider = Arc::clone(&provider);
        let config = config.clone();
        async move {
            if let Some(ref cb) = config.progress_callback {
                cb.on_chunk_start(index, total_chunks, &chunk.page_label());
            }
            let result = generate::generate_for_chunk(&provider, index, &chunk, &config).await;
            if let Some(ref cb) = config.progress_callback {
                match &result.error {
                    None => cb.on_chunk_complete(index, total_chunks, result.cards.len()),
                    Some(e) => cb.on_chunk_error(index, total_chunks, &e.to_string()),
                }
            }
            result
        }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}
