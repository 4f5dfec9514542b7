//! Pipeline stages for PDF-to-flashcard conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch OCR backend) without touching other
//! stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ chunk ──▶ generate ──▶ parse ──▶ quality
//! (URL/path)  (pdfium     (word-    (LLM call   (tolerant  (validate +
//!             + OCR +     bounded    per chunk)  JSON)      dedup)
//!             normalize)  batches)
//! ```
//!
//! 1. [`input`]      — canonicalise the user-supplied path or URL to a local file
//! 2. [`extract`]    — per-page text via pdfium; scans are rendered and handed
//!    to the OCR engine, whose detections [`assemble`] orders into lines;
//!    everything passes through [`normalize`]. Runs in `spawn_blocking`
//!    because pdfium is not async-safe.
//! 3. [`chunk`]      — group pages into word-bounded, page-tagged batches
//! 4. [`generate`]   — drive the LLM call per chunk; the only stage with
//!    network I/O
//! 5. [`parse`]      — recover a card list from the free-form model reply
//! 6. [`quality`]    — enforce card invariants and drop near-duplicates via
//!    [`similarity`]

pub mod assemble;
pub mod chunk;
pub mod extract;
pub mod generate;
pub mod input;
pub mod normalize;
pub mod ocr;
pub mod parse;
pub mod quality;
pub mod similarity;
