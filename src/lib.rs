//! # pdf2anki
//!
//! Turn PDF documents into Anki flashcard decks using LLM card generation.
//!
//! ## Why this crate?
//!
//! Making good flashcards from a textbook chapter is slow, and naive
//! automation produces bad ones: vague questions, near-duplicates, cards
//! generated from page-number noise. This crate does the unglamorous parts
//! properly — page text extraction with an OCR path for scans, word-bounded
//! chunking with page provenance, defensive parsing of model replies, and a
//! validation/deduplication pass — so what comes out is an importable deck
//! rather than a JSON dump of whatever the model said.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Extract   per-page text via pdfium; scans rendered + OCR'd,
//!  │               detections reassembled into reading order
//!  ├─ 3. Chunk     word-bounded page batches with page-range provenance
//!  ├─ 4. Generate  concurrent LLM calls, one per chunk
//!  ├─ 5. Parse     tolerant JSON → basic / cloze card candidates
//!  ├─ 6. Quality   length validation + Jaccard near-duplicate removal
//!  └─ 7. Output    filtered cards + per-chunk results + stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2anki::{build_deck, DeckConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / OPENROUTER_API_KEY
//!     let config = DeckConfig::default();
//!     let output = build_deck("lecture_notes.pdf", &config).await?;
//!     println!("{} cards from {} chunks",
//!         output.cards.len(),
//!         output.stats.chunk_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2anki` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2anki = { version = "0.3", default-features = false }
//! ```
//!
//! ## Scanned documents
//!
//! Pages without a usable text layer are rendered and handed to an
//! [`OcrEngine`] you construct and inject — the crate ships the seam and
//! the reading-order assembly, not a recognition backend. Without an
//! engine, scanned pages are skipped with a warning.
//!
//! ## Deck packaging
//!
//! The pipeline ends at a clean card list (plus per-topic grouping when
//! topic-aware generation is on). Producing an `.apkg` file is the job of a
//! [`DeckWriter`] implementation supplied by the embedding application.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod card;
pub mod config;
pub mod deck;
pub mod error;
pub mod export;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use card::{dedup_topics, has_cloze_marker, strip_cloze_markers, Card, Topic};
pub use config::{AnswerFormat, CardKind, DeckConfig, DeckConfigBuilder};
pub use deck::{build_deck, build_deck_from_bytes, build_deck_sync, inspect};
pub use error::{ChunkError, Pdf2AnkiError};
pub use export::{group_by_topic, DeckWriteError, DeckWriter, TopicDeck, TopicGrouping};
pub use llm::{
    provider_from_env, provider_from_name, ChatMessage, ChatResponse, CompletionOptions,
    LlmError, LlmProvider, OpenAiProvider,
};
pub use output::{ChunkResult, DeckOutput, DeckStats, DocumentMetadata};
pub use pipeline::assemble::assemble_text;
pub use pipeline::chunk::{chunk_pages, Chunk, Page};
pub use pipeline::normalize::normalize;
pub use pipeline::ocr::{Detection, OcrEngine, OcrEngineError};
pub use pipeline::parse::parse_cards;
pub use pipeline::quality::filter_and_deduplicate;
pub use pipeline::similarity::jaccard;
pub use progress::{DeckProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{build_deck_stream, ChunkStream};
