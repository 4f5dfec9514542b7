//! Eager (full-document) deck-building entry points.
//!
//! This module provides the simpler API: wait for every chunk, filter, then
//! return the finished deck. Use [`crate::stream::build_deck_stream`]
//! instead when you want per-chunk results progressively (live card counts
//! in a UI, incremental persistence) — with the caveat that cross-chunk
//! deduplication can only run once all chunks are in.

use crate::card::Card;
use crate::config::DeckConfig;
use crate::error::Pdf2AnkiError;
use crate::llm::{self, LlmProvider};
use crate::output::{ChunkResult, DeckOutput, DeckStats, DocumentMetadata};
use crate::pipeline::chunk::{chunk_pages, Chunk};
use crate::pipeline::{extract, generate, input, quality};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Build a flashcard deck from a PDF file or URL.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Deck-building configuration
///
/// # Returns
/// `Ok(DeckOutput)` on success, even if some chunks failed
/// (check `output.stats.failed_chunks`).
///
/// # Errors
/// Returns `Err(Pdf2AnkiError)` only for fatal conditions:
/// - File not found / not a valid PDF / wrong password
/// - No LLM provider configured
/// - No usable text in the document
/// - Every generation call failed, or no card survived filtering
pub async fn build_deck(
    input_str: impl AsRef<str>,
    config: &DeckConfig,
) -> Result<DeckOutput, Pdf2AnkiError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting deck build: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Step 2: Get/create provider ──────────────────────────────────────
    let provider = resolve_provider(config)?;

    // ── Step 3: Extract metadata ─────────────────────────────────────────
    let metadata = extract::extract_metadata(&pdf_path, config.password.as_deref()).await?;
    info!("PDF has {} pages", metadata.page_count);

    // ── Step 4: Extract per-page text (with OCR fallback) ────────────────
    let extract_start = Instant::now();
    let extracted = extract::extract_pages(&pdf_path, config).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    info!(
        "Extracted {} usable pages ({} via OCR) in {}ms",
        extracted.pages.len(),
        extracted.ocr_pages,
        extract_duration_ms
    );

    // ── Step 5: Chunk ────────────────────────────────────────────────────
    let chunks = chunk_pages(&extracted.pages, config.max_words_per_chunk);
    debug!("Grouped {} pages into {} chunks", extracted.pages.len(), chunks.len());

    if let Some(ref cb) = config.progress_callback {
        cb.on_deck_start(chunks.len());
    }

    // ── Step 6: Generate cards per chunk ─────────────────────────────────
    info!(
        "Generating {} cards ({} answers) in {}",
        config.card_kind.as_str(),
        config.answer_format.as_str(),
        config.language
    );
    let generation_start = Instant::now();
    let chunk_results = process_chunks(&provider, &chunks, config).await;
    let generation_duration_ms = generation_start.elapsed().as_millis() as u64;

    let succeeded = chunk_results.iter().filter(|r| r.error.is_none()).count();
    let failed = chunk_results.len() - succeeded;

    if let Some(ref cb) = config.progress_callback {
        cb.on_deck_complete(chunk_results.len(), succeeded);
    }

    if succeeded == 0 {
        let first_error = chunk_results
            .iter()
            .find_map(|r| r.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(Pdf2AnkiError::AllChunksFailed {
            total: chunk_results.len(),
            first_error,
        });
    }

    // ── Step 7: Validate and deduplicate across chunks ───────────────────
    let candidates: Vec<Card> = chunk_results
        .iter()
        .flat_map(|r| r.cards.iter().cloned())
        .collect();
    let raw_cards = candidates.len();

    let cards = quality::filter_and_deduplicate(candidates, config.similarity_threshold);
    if cards.is_empty() {
        return Err(Pdf2AnkiError::NoCardsProduced {
            chunks: chunk_results.len(),
            raw_cards,
        });
    }
    info!(
        "Kept {}/{} cards after filtering ({} chunks, {} failed)",
        cards.len(),
        raw_cards,
        chunk_results.len(),
        failed
    );

    // ── Step 8: Compute stats ────────────────────────────────────────────
    let stats = DeckStats {
        total_pages: extracted.total_pages,
        text_pages: extracted.text_pages,
        ocr_pages: extracted.ocr_pages,
        skipped_pages: extracted
            .total_pages
            .saturating_sub(extracted.text_pages + extracted.ocr_pages),
        chunk_count: chunk_results.len(),
        failed_chunks: failed,
        raw_cards,
        kept_cards: cards.len(),
        basic_cards: cards.iter().filter(|c| c.is_basic()).count(),
        cloze_cards: cards.iter().filter(|c| c.is_cloze()).count(),
        total_input_tokens: chunk_results.iter().map(|r| r.input_tokens).sum(),
        total_output_tokens: chunk_results.iter().map(|r| r.output_tokens).sum(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        extract_duration_ms,
        generation_duration_ms,
    };

    Ok(DeckOutput {
        cards,
        chunks: chunk_results,
        metadata,
        stats,
    })
}

/// Build a deck from PDF bytes in memory.
///
/// Avoids the need for the caller to create a temporary file: the bytes are
/// written to a managed [`tempfile`] that is cleaned up automatically on
/// return or panic. Recommended when PDF data comes from a database, an
/// upload, or a network stream rather than a file on disk.
pub async fn build_deck_from_bytes(
    bytes: &[u8],
    config: &DeckConfig,
) -> Result<DeckOutput, Pdf2AnkiError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| Pdf2AnkiError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Pdf2AnkiError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `build_deck` returns
    build_deck(&path, config).await
}

/// Synchronous wrapper around [`build_deck`].
///
/// Creates a temporary tokio runtime internally.
pub fn build_deck_sync(
    input_str: impl AsRef<str>,
    config: &DeckConfig,
) -> Result<DeckOutput, Pdf2AnkiError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2AnkiError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(build_deck(input_str, config))
}

/// Extract PDF metadata without building anything.
///
/// Does not require an LLM provider or API key.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, Pdf2AnkiError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    let pdf_path = resolved.path().to_path_buf();
    extract::extract_metadata(&pdf_path, None).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Run the generation calls for all chunks, bounded by `config.concurrency`.
///
/// Chunks are independent, so calls overlap freely; results are re-sorted
/// by chunk index afterwards so card priority (and therefore dedup
/// outcomes) never depends on completion order.
async fn process_chunks(
    provider: &Arc<dyn LlmProvider>,
    chunks: &[Chunk],
    config: &DeckConfig,
) -> Vec<ChunkResult> {
    let total_chunks = chunks.len();
    let mut results: Vec<ChunkResult> = stream::iter(chunks.iter().enumerate().map(|(index, chunk)| {
        let provider = Arc::clone(provider);
        let config = config.clone();
        async move {
            if let Some(ref cb) = config.progress_callback {
                cb.on_chunk_start(index, total_chunks, &chunk.page_label());
            }
            let result = generate::generate_for_chunk(&provider, index, chunk, &config).await;
            if let Some(ref cb) = config.progress_callback {
                match &result.error {
                    None => cb.on_chunk_complete(index, total_chunks, result.cards.len()),
                    Some(e) => cb.on_chunk_error(index, total_chunks, &e.to_string()),
                }
            }
            result
        }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    results.sort_by_key(|r| r.index);
    results
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// The four-level fallback chain lets library users and CLI users each set
/// exactly as much or as little as they need:
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed
///    and configured the provider entirely; we use it as-is. Useful in
///    tests or when the caller needs custom middleware.
///
/// 2. **Named provider + model** (`config.provider_name`) — the caller
///    named an endpoint (e.g. `"openai"`). [`llm::provider_from_name`]
///    reads the corresponding API key (`OPENAI_API_KEY`, etc.) from the
///    environment.
///
/// 3. **Environment pair** (`PDF2ANKI_LLM_PROVIDER` + `PDF2ANKI_MODEL`) —
///    both env vars set means the execution environment (Makefile, CI)
///    chose; checked before full auto-detection so the model choice is
///    honoured even when multiple API keys are present.
///
/// 4. **Full auto-detection** ([`llm::provider_from_env`]) — scans known
///    API key variables and picks the first available provider, preferring
///    OpenAI when `OPENAI_API_KEY` is set.
pub(crate) fn resolve_provider(config: &DeckConfig) -> Result<Arc<dyn LlmProvider>, Pdf2AnkiError> {
    // 1) User-provided provider takes priority
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(llm::DEFAULT_MODEL);

    // 2) Provider name + model
    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    // 3) Environment pair
    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("PDF2ANKI_LLM_PROVIDER"),
        std::env::var("PDF2ANKI_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    // 4) Auto-detect
    llm::provider_from_env(model).map_err(|e| Pdf2AnkiError::ProviderNotConfigured {
        provider: "auto".to_string(),
        hint: format!(
            "No LLM provider could be auto-detected from environment.\n\
             Set OPENAI_API_KEY or OPENROUTER_API_KEY, or configure a provider.\n\
             Error: {}",
            e
        ),
    })
}

/// Instantiate a named provider with the given model.
fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LlmProvider>, Pdf2AnkiError> {
    llm::provider_from_name(provider_name, model).map_err(|e| {
        Pdf2AnkiError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
