//! Chunking: group consecutive pages into word-bounded generation batches.
//!
//! One generation call per page wastes money (prompt overhead dominates) and
//! starves the model of context; one call for the whole document exceeds
//! sensible completion budgets. Chunks of a few thousand words are the
//! middle ground, and carrying the covered page numbers on each chunk keeps
//! provenance: every card batch can be traced back to the page range it was
//! generated from.

use serde::{Deserialize, Serialize};

/// One page of normalized document text.
///
/// Produced by extraction (or OCR) with 1-indexed page numbers; `text` is
/// already normalized and non-empty by the time the chunker sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub text: String,
}

/// A batch of consecutive pages submitted as one generation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// 1-indexed page numbers, strictly increasing, contiguous in source
    /// order.
    pub pages: Vec<u32>,
    /// The member pages' text joined with blank lines, in page order.
    pub text: String,
}

impl Chunk {
    fn from_pages(pages: &[Page]) -> Self {
        Chunk {
            pages: pages.iter().map(|p| p.number).collect(),
            text: pages
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }

    /// Human-readable page range, e.g. `p.3` or `pp.4–9`.
    pub fn page_label(&self) -> String {
        page_label(&self.pages)
    }

    /// Whitespace-token count of the chunk text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Format a page-number list as `p.N` / `pp.N–M`.
pub(crate) fn page_label(pages: &[u32]) -> String {
    match (pages.first(), pages.last()) {
        (Some(first), Some(last)) if first != last => format!("pp.{first}–{last}"),
        (Some(first), _) => format!("p.{first}"),
        (None, _) => String::from("p.?"),
    }
}

/// Group pages into chunks whose summed word count stays under `max_words`.
///
/// Walks the pages in order with an accumulator: when appending the next
/// page would push the accumulated word count over the limit and the
/// accumulator already holds at least one page, the accumulator is flushed
/// as a chunk first; the page is then always appended. The trailing
/// accumulator is flushed at the end.
///
/// Consequences of the "and the accumulator is non-empty" guard:
/// - a single page whose own word count exceeds `max_words` becomes its own
///   one-page chunk (pages are never split, and the walk never stalls);
/// - every chunk with two or more pages respects the bound.
///
/// Every input page appears in exactly one output chunk, in source order.
/// Total over any input; empty input yields no chunks.
pub fn chunk_pages(pages: &[Page], max_words: usize) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current: Vec<Page> = Vec::new();
    let mut current_words = 0usize;

    for page in pages {
        let word_count = page.text.split_whitespace().count();

        if current_words + word_count > max_words && !current.is_empty() {
            chunks.push(Chunk::from_pages(&current));
            current.clear();
            current_words = 0;
        }

        current.push(page.clone());
        current_words += word_count;
    }

    if !current.is_empty() {
        chunks.push(Chunk::from_pages(&current));
    }

    chunks
}
