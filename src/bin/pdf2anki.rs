//! CLI binary for pdf2anki.
//!
//! A thin shim over the library crate that maps CLI flags to `DeckConfig`
//! and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2anki::{
    build_deck, group_by_topic, inspect, AnswerFormat, CardKind, DeckConfig,
    DeckProgressCallback, DeckStats, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-chunk log
/// lines using [indicatif]. Designed to work correctly when chunks complete
/// out-of-order (concurrent generation).
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Running total of card candidates across completed chunks.
    cards: AtomicUsize,
    /// Count of chunks that errored out.
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically by
    /// `on_deck_start` (called once the chunk count is known).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_deck_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            cards: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know the chunk total.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} chunks  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Generating");
        self.bar.reset_eta();
    }
}

impl DeckProgressCallback for CliProgressCallback {
    fn on_deck_start(&self, total_chunks: usize) {
        self.activate_bar(total_chunks);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating cards from {total_chunks} chunk(s)…"))
        ));
    }

    fn on_chunk_start(&self, _index: usize, _total: usize, page_label: &str) {
        self.bar.set_message(page_label.to_string());
    }

    fn on_chunk_complete(&self, index: usize, total: usize, card_count: usize) {
        let so_far = self.cards.fetch_add(card_count, Ordering::SeqCst) + card_count;
        self.bar.println(format!(
            "  {} Chunk {:>3}/{:<3}  {:<18}  {}",
            green("✓"),
            index + 1,
            total,
            dim(&format!("{card_count:>3} candidates")),
            dim(&format!("{so_far} total")),
        ));
        self.bar.inc(1);
    }

    fn on_chunk_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy. Page
        // labels contain non-ASCII dashes, so cut on a char boundary.
        let msg = match error.char_indices().nth(79) {
            Some((byte_idx, _)) => format!("{}\u{2026}", &error[..byte_idx]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} Chunk {:>3}/{:<3}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_deck_complete(&self, total_chunks: usize, success_count: usize) {
        let failed = total_chunks.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} chunk(s) generated successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} chunks generated  ({} failed)",
                if failed == total_chunks {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_chunks,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic question/answer cards (stdout, JSON)
  pdf2anki lecture_notes.pdf

  # Write to a file, mixed basic + cloze cards
  pdf2anki --card-type both lecture_notes.pdf -o cards.json

  # German-language cards with bullet-point answers
  pdf2anki --language German --answers bullets skript.pdf -o karten.json

  # Topic-aware generation: one sub-deck per topic
  pdf2anki --topics "Monetary Policy,EU Institutions" --deck-name "Economics" notes.pdf

  # Use a specific model
  pdf2anki --model gpt-4o --provider openai document.pdf

  # Build from a URL
  pdf2anki https://arxiv.org/pdf/1706.03762 -o attention_cards.json

  # Inspect PDF metadata (no API key needed)
  pdf2anki --inspect-only document.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  OPENROUTER_API_KEY      OpenRouter API key
  OLLAMA_HOST             Ollama server (default http://localhost:11434)
  PDF2ANKI_LLM_PROVIDER   Override provider (openai, openrouter, ollama, lmstudio)
  PDF2ANKI_MODEL          Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium

SETUP:
  1. Set API key:     export OPENAI_API_KEY=sk-...
  2. Generate:        pdf2anki lecture_notes.pdf -o cards.json

SCANNED PDFS:
  Pages without a text layer need an OCR engine, which the library consumes
  as a plug-in trait; the plain CLI skips such pages and reports how many
  were skipped. See the OcrEngine docs for wiring up a backend.
"#;

/// Turn PDF documents into Anki flashcard decks using LLM card generation.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2anki",
    version,
    about = "Turn PDF files and URLs into Anki flashcard decks using LLMs",
    long_about = "Extract text from a PDF (with OCR reading-order assembly for scanned pages), \
split it into word-bounded chunks, generate flashcard candidates with an LLM, and filter them \
down to a clean, deduplicated deck. Supports OpenAI and OpenAI-compatible endpoints \
(OpenRouter, Ollama, LM Studio); other backends plug in through the library's provider trait.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write the card JSON to this file instead of stdout.
    #[arg(short, long, env = "PDF2ANKI_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4o-mini, gpt-4o, llama3.1).
    #[arg(long, env = "PDF2ANKI_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, openrouter, ollama, lmstudio.
    #[arg(
        long,
        env = "PDF2ANKI_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, openrouter, ollama, lmstudio."
    )]
    provider: Option<String>,

    /// Card type: basic, cloze, both.
    #[arg(long = "card-type", env = "PDF2ANKI_CARD_TYPE", value_enum, default_value = "basic")]
    card_type: CardTypeArg,

    /// Answer format for basic cards: sentences, bullets.
    #[arg(long, env = "PDF2ANKI_ANSWERS", value_enum, default_value = "sentences")]
    answers: AnswerFormatArg,

    /// Language all card content is written in.
    #[arg(long, env = "PDF2ANKI_LANGUAGE", default_value = "English")]
    language: String,

    /// Comma-separated allowed topics; enables topic-aware generation and
    /// per-topic sub-deck grouping.
    #[arg(long, env = "PDF2ANKI_TOPICS", value_delimiter = ',')]
    topics: Option<Vec<String>>,

    /// Deck name (used as the base name for topic sub-decks).
    #[arg(long, env = "PDF2ANKI_DECK_NAME", default_value = "PDF Anki Cards")]
    deck_name: String,

    /// Maximum words per generation chunk.
    #[arg(long, env = "PDF2ANKI_MAX_WORDS", default_value_t = 2000)]
    max_words: usize,

    /// Near-duplicate similarity threshold (0.0–1.0).
    #[arg(long, env = "PDF2ANKI_THRESHOLD", default_value_t = 0.72)]
    threshold: f64,

    /// Number of concurrent generation calls.
    #[arg(short, long, env = "PDF2ANKI_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Render resolution for OCR in DPI (72–600).
    #[arg(long, env = "PDF2ANKI_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2ANKI_PASSWORD")]
    password: Option<String>,

    /// Max LLM output tokens per chunk.
    #[arg(long, env = "PDF2ANKI_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2ANKI_TEMPERATURE", default_value_t = 0.25)]
    temperature: f32,

    /// Output the full build result (chunks, stats, metadata) instead of
    /// just the cards.
    #[arg(long, env = "PDF2ANKI_JSON_FULL")]
    json_full: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2ANKI_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no generation.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2ANKI_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2ANKI_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2ANKI_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-chunk LLM call timeout in seconds.
    #[arg(long, env = "PDF2ANKI_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum CardTypeArg {
    Basic,
    Cloze,
    Both,
}

impl From<CardTypeArg> for CardKind {
    fn from(v: CardTypeArg) -> Self {
        match v {
            CardTypeArg::Basic => CardKind::Basic,
            CardTypeArg::Cloze => CardKind::Cloze,
            CardTypeArg::Both => CardKind::Both,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum AnswerFormatArg {
    Sentences,
    Bullets,
}

impl From<AnswerFormatArg> for AnswerFormat {
    fn from(v: AnswerFormatArg) -> Self {
        match v {
            AnswerFormatArg::Sentences => AnswerFormat::Sentences,
            AnswerFormatArg::Bullets => AnswerFormat::Bullets,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).await.context("Failed to inspect PDF")?;

        println!("File:         {}", cli.input);
        if let Some(ref t) = meta.title {
            println!("Title:        {}", t);
        }
        if let Some(ref a) = meta.author {
            println!("Author:       {}", a);
        }
        if let Some(ref s) = meta.subject {
            println!("Subject:      {}", s);
        }
        println!("Pages:        {}", meta.page_count);
        println!("PDF Version:  {}", meta.pdf_version);
        if let Some(ref p) = meta.producer {
            println!("Producer:     {}", p);
        }
        if let Some(ref c) = meta.creator {
            println!("Creator:      {}", c);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn DeckProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run the build ────────────────────────────────────────────────────
    let output = build_deck(&cli.input, &config)
        .await
        .context("Deck build failed")?;

    // ── Serialise the result ─────────────────────────────────────────────
    let json = if cli.json_full {
        serde_json::to_string_pretty(&output).context("Failed to serialise output")?
    } else if let Some(ref topics) = config.topics {
        // Topic mode: group into per-topic sub-decks, named base::topic.
        let grouping = group_by_topic(output.cards.clone(), topics);
        if !cli.quiet && !grouping.unassigned.is_empty() {
            eprintln!(
                "{} {} card(s) matched no selected topic and were omitted",
                cyan("ℹ"),
                grouping.unassigned.len()
            );
        }
        let decks: Vec<serde_json::Value> = grouping
            .decks
            .iter()
            .map(|d| {
                serde_json::json!({
                    "deck": format!("{}::{}", cli.deck_name, d.topic),
                    "cards": d.cards,
                })
            })
            .collect();
        serde_json::to_string_pretty(&serde_json::json!({ "decks": decks }))
            .context("Failed to serialise topic decks")?
    } else {
        serde_json::to_string_pretty(&output.cards).context("Failed to serialise cards")?
    };

    match cli.output {
        Some(ref path) => {
            write_atomic(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !cli.quiet {
                print_summary(&output.stats, Some(path));
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(json.as_bytes())
                .context("Failed to write to stdout")?;
            handle.write_all(b"\n").ok();
            if !cli.quiet {
                print_summary(&output.stats, None);
            }
        }
    }

    Ok(())
}

/// Map CLI args to `DeckConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<DeckConfig> {
    let mut builder = DeckConfig::builder()
        .card_kind(cli.card_type.clone().into())
        .answer_format(cli.answers.clone().into())
        .language(cli.language.clone())
        .deck_name(cli.deck_name.clone())
        .max_words_per_chunk(cli.max_words)
        .similarity_threshold(cli.threshold)
        .concurrency(cli.concurrency)
        .dpi(cli.dpi)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref topics) = cli.topics {
        let topics: Vec<String> = topics
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        builder = builder.topics(topics);
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    let mut config = builder.build().context("Invalid configuration")?;

    // Apply fields the builder setters would wrap in Some() anyway.
    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    config.password = cli.password.clone();

    Ok(config)
}

/// Atomic write: temp file in the same directory, then rename.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Final stats line printed after the build.
fn print_summary(stats: &DeckStats, output_path: Option<&Path>) {
    let target = output_path
        .map(|p| format!("  →  {}", bold(&p.display().to_string())))
        .unwrap_or_default();
    eprintln!(
        "{}  {} cards kept ({} basic, {} cloze) from {} candidates{}",
        if stats.failed_chunks == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        bold(&stats.kept_cards.to_string()),
        stats.basic_cards,
        stats.cloze_cards,
        stats.raw_cards,
        target,
    );
    if stats.ocr_pages > 0 || stats.skipped_pages > 0 {
        eprintln!(
            "   {} pages ({} OCR, {} skipped)",
            stats.text_pages + stats.ocr_pages,
            stats.ocr_pages,
            stats.skipped_pages,
        );
    }
    eprintln!(
        "   {} tokens in  /  {} tokens out  —  {}ms total",
        dim(&stats.total_input_tokens.to_string()),
        dim(&stats.total_output_tokens.to_string()),
        stats.total_duration_ms,
    );
}
