//! Output types returned by the deck-building entry points.
//!
//! [`DeckOutput`] is the aggregate result: the final filtered cards plus the
//! per-chunk results they came from, document metadata, and run statistics.
//! Per-chunk results are kept (rather than discarded after filtering) so
//! callers can report partial failures precisely: which page ranges failed,
//! how many candidates each chunk contributed, and how long each call took.

use crate::card::Card;
use crate::error::ChunkError;
use serde::{Deserialize, Serialize};

/// Result of a flashcard deck build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckOutput {
    /// The validated, deduplicated cards, question/answer cards first, then
    /// cloze cards, each group in generation order.
    pub cards: Vec<Card>,
    /// Per-chunk outcomes in chunk order, including failed chunks.
    pub chunks: Vec<ChunkResult>,
    /// Document metadata read from the PDF.
    pub metadata: DocumentMetadata,
    /// Aggregate statistics for the run.
    pub stats: DeckStats,
}

/// The outcome of one chunk's generation call.
///
/// A failed call yields `error: Some(..)` and an empty card list; the rest
/// of the build continues without it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    /// 0-based chunk index (chunks are numbered in page order).
    pub index: usize,
    /// 1-indexed page numbers covered by this chunk.
    pub pages: Vec<u32>,
    /// Card candidates parsed from the model reply, before validation and
    /// cross-chunk deduplication.
    pub cards: Vec<Card>,
    /// Prompt tokens consumed by this chunk's call.
    pub input_tokens: u64,
    /// Completion tokens consumed by this chunk's call.
    pub output_tokens: u64,
    /// Wall-clock duration of the call in milliseconds.
    pub duration_ms: u64,
    /// The failure, if the generation call did not complete.
    pub error: Option<ChunkError>,
}

impl ChunkResult {
    /// Human-readable page range, e.g. `p.3` or `pp.4–9`.
    pub fn page_label(&self) -> String {
        crate::pipeline::chunk::page_label(&self.pages)
    }
}

/// Aggregate statistics for a deck build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckStats {
    /// Pages in the source document.
    pub total_pages: usize,
    /// Pages whose embedded text layer was usable.
    pub text_pages: usize,
    /// Pages recovered through OCR.
    pub ocr_pages: usize,
    /// Pages skipped (near-empty, or scans with no OCR engine configured).
    pub skipped_pages: usize,
    /// Chunks submitted for generation.
    pub chunk_count: usize,
    /// Chunks whose generation call failed.
    pub failed_chunks: usize,
    /// Card candidates parsed across all chunks, before filtering.
    pub raw_cards: usize,
    /// Cards that survived validation and deduplication.
    pub kept_cards: usize,
    /// Question/answer cards among the kept cards.
    pub basic_cards: usize,
    /// Cloze cards among the kept cards.
    pub cloze_cards: usize,
    /// Total prompt tokens across all generation calls.
    pub total_input_tokens: u64,
    /// Total completion tokens across all generation calls.
    pub total_output_tokens: u64,
    /// End-to-end wall-clock duration in milliseconds.
    pub total_duration_ms: u64,
    /// Time spent extracting text (including OCR) in milliseconds.
    pub extract_duration_ms: u64,
    /// Time spent in generation calls in milliseconds.
    pub generation_duration_ms: u64,
}

/// Document metadata extracted from the PDF catalogue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_result_page_label() {
        let single = ChunkResult {
            index: 0,
            pages: vec![3],
            cards: vec![],
            input_tokens: 0,
            output_tokens: 0,
            duration_ms: 0,
            error: None,
        };
        assert_eq!(single.page_label(), "p.3");

        let range = ChunkResult { pages: vec![4, 5, 6], ..single };
        assert_eq!(range.page_label(), "pp.4–6");
    }

    #[test]
    fn deck_output_serialises() {
        let output = DeckOutput {
            cards: vec![Card::Basic {
                front: "Who elects the European Parliament?".into(),
                back: "Directly by EU citizens.".into(),
                topic: None,
            }],
            chunks: vec![],
            metadata: DocumentMetadata::default(),
            stats: DeckStats::default(),
        };
        let json = serde_json::to_string_pretty(&output).unwrap();
        assert!(json.contains("European Parliament"));
    }
}
