//! Error types for the pdf2anki library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2AnkiError`] — **Fatal**: the deck build cannot proceed at all
//!   (bad input file, provider not configured, no usable text in the PDF,
//!   nothing survived filtering). Returned as `Err(Pdf2AnkiError)` from the
//!   top-level `build_deck*` functions.
//!
//! * [`ChunkError`] — **Non-fatal**: a single chunk's generation call failed
//!   (auth rejection, rate limit, transport error, timeout) but all other
//!   chunks are fine. Stored inside [`crate::output::ChunkResult`] so callers
//!   can inspect partial success rather than losing the whole deck to one bad
//!   chunk.
//!
//! The separation lets callers decide their own tolerance: abort when any
//! chunk fails, log and continue, or collect all chunk errors for a post-run
//! report. Note that "the model produced nothing parseable" is *not* an
//! error at all — an unparseable reply simply yields zero cards for that
//! chunk.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2anki library.
///
/// Chunk-level failures use [`ChunkError`] and are stored in
/// [`crate::output::ChunkResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2AnkiError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    // ── Content errors ────────────────────────────────────────────────────
    /// No page produced usable text, so there is nothing to build cards from.
    ///
    /// `scanned_pages` counts pages that looked like scans (images, no text
    /// layer). When it is non-zero and no OCR engine was configured, wiring
    /// one up via `DeckConfigBuilder::ocr_engine` is the fix.
    #[error(
        "No text could be extracted from '{path}' \
         ({scanned_pages} of {total_pages} pages look like scans).\n\
         Configure an OCR engine to process scanned pages."
    )]
    NoTextExtracted {
        path: PathBuf,
        total_pages: usize,
        scanned_pages: usize,
    },

    /// Every generation call returned cards, but none survived validation
    /// and deduplication. Surfaced as a named condition so callers never
    /// silently ship an empty deck.
    #[error(
        "No cards survived quality filtering ({raw_cards} candidates from {chunks} chunks).\n\
         The material may be too sparse, or the similarity threshold too aggressive."
    )]
    NoCardsProduced { chunks: usize, raw_cards: usize },

    /// All chunk generation calls failed; there is nothing to filter.
    #[error("All {total} generation calls failed.\nFirst error: {first_error}")]
    AllChunksFailed { total: usize, first_error: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output deck file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
         Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single chunk's generation call.
///
/// Stored alongside [`crate::output::ChunkResult`] when a chunk fails.
/// The overall build continues unless ALL chunks fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ChunkError {
    /// The provider rejected the credentials. Later chunks will almost
    /// certainly fail the same way, but the classification is left to the
    /// caller; the pipeline itself keeps going.
    #[error("Chunk {pages}: authentication rejected by '{provider}': {detail}")]
    Auth {
        pages: String,
        provider: String,
        detail: String,
    },

    /// The provider returned a rate-limit response for this chunk.
    #[error("Chunk {pages}: rate limited by '{provider}'")]
    RateLimited { pages: String, provider: String },

    /// The generation call failed for any other reason (5xx, network, ...).
    #[error("Chunk {pages}: generation call failed: {detail}")]
    Generation { pages: String, detail: String },

    /// The generation call exceeded the configured timeout.
    #[error("Chunk {pages}: generation call timed out after {secs}s")]
    Timeout { pages: String, secs: u64 },
}

impl ChunkError {
    /// Classify a provider error string into an auth / rate-limit / generic
    /// chunk error. Providers surface errors as display strings
    /// ([`crate::llm::LlmError`]), so classification is textual.
    pub(crate) fn classify(pages: &str, provider: &str, detail: String) -> Self {
        let lower = detail.to_lowercase();
        if lower.contains("401") || lower.contains("403") || lower.contains("unauthorized")
            || lower.contains("api key") || lower.contains("authentication")
        {
            ChunkError::Auth {
                pages: pages.to_string(),
                provider: provider.to_string(),
                detail,
            }
        } else if lower.contains("429") || lower.contains("rate limit") || lower.contains("quota") {
            ChunkError::RateLimited {
                pages: pages.to_string(),
                provider: provider.to_string(),
            }
        } else {
            ChunkError::Generation {
                pages: pages.to_string(),
                detail,
            }
        }
    }
}
