//! Configuration types for deck building.
//!
//! All pipeline behaviour is controlled through [`DeckConfig`], built via its
//! [`DeckConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share configs across threads, log them, and diff two runs to understand
//! why their decks differ.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::Pdf2AnkiError;
use crate::llm::LlmProvider;
use crate::pipeline::ocr::OcrEngine;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which card shapes the model is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    /// Question/answer cards only. (default)
    #[default]
    Basic,
    /// Fill-in-the-blank cards only.
    Cloze,
    /// Mixed: the model picks the better shape per piece of content.
    Both,
}

impl CardKind {
    /// Lowercase name as used in prompts and on the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            CardKind::Basic => "basic",
            CardKind::Cloze => "cloze",
            CardKind::Both => "both",
        }
    }
}

/// How answers on question/answer cards should be formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerFormat {
    /// One to two concise sentences. (default)
    #[default]
    Sentences,
    /// Mandatory bullet points, one tight fact per bullet.
    Bullets,
}

impl AnswerFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerFormat::Sentences => "sentences",
            AnswerFormat::Bullets => "bullets",
        }
    }
}

/// Configuration for building a flashcard deck from a PDF.
///
/// Built via [`DeckConfig::builder()`] or using [`DeckConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2anki::{CardKind, DeckConfig};
///
/// let config = DeckConfig::builder()
///     .card_kind(CardKind::Both)
///     .language("German")
///     .max_words_per_chunk(1500)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct DeckConfig {
    /// Upper bound on the summed word count of the pages grouped into one
    /// chunk (one generation call). Default: 2000.
    ///
    /// Larger chunks mean fewer API calls but give the model more material
    /// than it can cover exhaustively; 2000 words (4–5 dense pages) is the
    /// point where card yield per page stops degrading. A single page whose
    /// own word count exceeds the bound still becomes a (one-page) chunk —
    /// pages are never split.
    pub max_words_per_chunk: usize,

    /// Jaccard similarity at or above which a card is considered a
    /// near-duplicate of an earlier one and dropped. Range: 0.0–1.0.
    /// Default: 0.72.
    ///
    /// 0.72 tolerates rewording ("What is X?" vs "What's X?") while keeping
    /// genuinely distinct questions about the same term. Raise it towards
    /// 0.9 to keep more cards, lower it towards 0.5 for aggressive pruning.
    pub similarity_threshold: f64,

    /// Card shapes to generate. Default: [`CardKind::Basic`].
    pub card_kind: CardKind,

    /// Answer formatting for question/answer cards. Default:
    /// [`AnswerFormat::Sentences`].
    pub answer_format: AnswerFormat,

    /// Natural language all card content must be written in.
    /// Default: "English".
    pub language: String,

    /// Allowed topic names for topic-aware generation.
    ///
    /// When set, every generation call is constrained to this list, each
    /// card carries a `topic` field, and [`crate::export::group_by_topic`]
    /// can split the result into per-topic sub-decks. When `None` (default),
    /// generation is unconstrained and topics are ignored.
    pub topics: Option<Vec<String>>,

    /// LLM model identifier, e.g. "gpt-4o-mini". If None, uses the provider
    /// default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "openrouter", "ollama").
    /// If None along with `provider`, the provider is auto-detected via
    /// [`crate::llm::provider_from_env`].
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LlmProvider>>,

    /// Sampling temperature for generation calls. Default: 0.25.
    ///
    /// Slightly above zero: card phrasing benefits from mild variation, but
    /// high temperatures produce cards that drift from the source text.
    pub temperature: f32,

    /// Maximum tokens the model may generate per chunk. Default: 4096.
    ///
    /// An exhaustive pass over a 2000-word chunk produces 15–25 cards,
    /// which fits comfortably; setting this lower truncates the reply
    /// mid-JSON and costs the whole chunk.
    pub max_tokens: usize,

    /// Number of concurrent generation calls. Default: 4.
    ///
    /// Chunks have no data dependency on each other, so calls can overlap
    /// freely; the bound exists to respect provider rate limits. Results
    /// are re-ordered by chunk index afterwards, so concurrency never
    /// affects which card wins deduplication.
    pub concurrency: usize,

    /// Render resolution for pages sent to OCR, in DPI. Range: 72–600.
    /// Default: 300.
    ///
    /// 300 DPI is adequate for most print; 400+ helps very small or very
    /// dense text at the cost of recognition time.
    pub dpi: u32,

    /// Minimum character count for a page's normalized text to be kept.
    /// Default: 80.
    ///
    /// Filters cover pages, section dividers, and pages whose text layer is
    /// only a page number. A page below the floor that carries embedded
    /// images is treated as a scan and queued for OCR instead.
    pub min_page_chars: usize,

    /// OCR engine used for scanned pages.
    ///
    /// OCR model loading is expensive (typically a one-time multi-hundred-MB
    /// model load), so the engine is constructed once by the caller and
    /// shared here rather than materialised on demand inside the pipeline.
    /// When `None` (default), scanned pages are skipped with a warning.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Deck name passed through to the package writer and used for output
    /// file naming. Default: "PDF Anki Cards".
    pub deck_name: String,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-generation-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Optional progress callback receiving per-chunk events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            max_words_per_chunk: 2000,
            similarity_threshold: 0.72,
            card_kind: CardKind::default(),
            answer_format: AnswerFormat::default(),
            language: "English".to_string(),
            topics: None,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.25,
            max_tokens: 4096,
            concurrency: 4,
            dpi: 300,
            min_page_chars: 80,
            ocr_engine: None,
            password: None,
            deck_name: "PDF Anki Cards".to_string(),
            download_timeout_secs: 120,
            api_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for DeckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckConfig")
            .field("max_words_per_chunk", &self.max_words_per_chunk)
            .field("similarity_threshold", &self.similarity_threshold)
            .field("card_kind", &self.card_kind)
            .field("answer_format", &self.answer_format)
            .field("language", &self.language)
            .field("topics", &self.topics)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LlmProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("concurrency", &self.concurrency)
            .field("dpi", &self.dpi)
            .field("min_page_chars", &self.min_page_chars)
            .field("ocr_engine", &self.ocr_engine.as_ref().map(|_| "<dyn OcrEngine>"))
            .field("deck_name", &self.deck_name)
            .finish()
    }
}

impl DeckConfig {
    /// Create a new builder for `DeckConfig`.
    pub fn builder() -> DeckConfigBuilder {
        DeckConfigBuilder {
            config: Self::default(),
        }
    }

    /// True when topic-aware generation is enabled (a non-empty topic list
    /// was configured).
    pub fn topic_aware(&self) -> bool {
        self.topics.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// Builder for [`DeckConfig`].
#[derive(Debug)]
pub struct DeckConfigBuilder {
    config: DeckConfig,
}

impl DeckConfigBuilder {
    pub fn max_words_per_chunk(mut self, words: usize) -> Self {
        self.config.max_words_per_chunk = words.max(1);
        self
    }

    pub fn similarity_threshold(mut self, t: f64) -> Self {
        self.config.similarity_threshold = t.clamp(0.0, 1.0);
        self
    }

    pub fn card_kind(mut self, kind: CardKind) -> Self {
        self.config.card_kind = kind;
        self
    }

    pub fn answer_format(mut self, format: AnswerFormat) -> Self {
        self.config.answer_format = format;
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    pub fn topics(mut self, topics: Vec<String>) -> Self {
        self.config.topics = Some(topics);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn min_page_chars(mut self, chars: usize) -> Self {
        self.config.min_page_chars = chars;
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn deck_name(mut self, name: impl Into<String>) -> Self {
        self.config.deck_name = name.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DeckConfig, Pdf2AnkiError> {
        let c = &self.config;
        if c.max_words_per_chunk == 0 {
            return Err(Pdf2AnkiError::InvalidConfig(
                "max_words_per_chunk must be ≥ 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&c.similarity_threshold) {
            return Err(Pdf2AnkiError::InvalidConfig(format!(
                "similarity_threshold must be within 0.0–1.0, got {}",
                c.similarity_threshold
            )));
        }
        if c.concurrency == 0 {
            return Err(Pdf2AnkiError::InvalidConfig("concurrency must be ≥ 1".into()));
        }
        if c.dpi < 72 || c.dpi > 600 {
            return Err(Pdf2AnkiError::InvalidConfig(format!(
                "dpi must be 72–600, got {}",
                c.dpi
            )));
        }
        if let Some(ref topics) = c.topics {
            if topics.iter().any(|t| t.trim().is_empty()) {
                return Err(Pdf2AnkiError::InvalidConfig(
                    "topic names must be non-empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DeckConfig::builder().build().unwrap();
        assert_eq!(config.max_words_per_chunk, 2000);
        assert_eq!(config.similarity_threshold, 0.72);
        assert_eq!(config.dpi, 300);
        assert!(!config.topic_aware());
    }

    #[test]
    fn builder_clamps_out_of_range_values() {
        let config = DeckConfig::builder()
            .similarity_threshold(3.0)
            .dpi(10_000)
            .concurrency(0)
            .max_words_per_chunk(0)
            .build()
            .unwrap();
        assert_eq!(config.similarity_threshold, 1.0);
        assert_eq!(config.dpi, 600);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.max_words_per_chunk, 1);
    }

    #[test]
    fn empty_topic_name_rejected() {
        let result = DeckConfig::builder()
            .topics(vec!["Metabolism".into(), "  ".into()])
            .build();
        assert!(matches!(result, Err(Pdf2AnkiError::InvalidConfig(_))));
    }

    #[test]
    fn topic_aware_requires_non_empty_list() {
        let config = DeckConfig::builder().topics(vec![]).build().unwrap();
        assert!(!config.topic_aware());
        let config = DeckConfig::builder()
            .topics(vec!["EU Institutions".into()])
            .build()
            .unwrap();
        assert!(config.topic_aware());
    }
}
