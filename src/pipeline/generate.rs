//! Generation: drive one LLM call per chunk and parse the reply.
//!
//! This module is intentionally thin — all prompt engineering lives in
//! [`crate::prompts`] and all reply interpretation in
//! [`crate::pipeline::parse`], so network handling can change without
//! touching either.
//!
//! ## Failure isolation
//!
//! A chunk's call either completes within the configured timeout or the
//! chunk is recorded as failed; there is no retry and no partial result.
//! The returned [`ChunkResult`] always exists — errors are stored in it,
//! never propagated, so one misbehaving chunk costs its own cards and
//! nothing else. Chunks carry no shared state, which is what makes the
//! caller free to run them concurrently.

use crate::config::DeckConfig;
use crate::error::ChunkError;
use crate::llm::{ChatMessage, CompletionOptions, LlmProvider};
use crate::output::ChunkResult;
use crate::pipeline::chunk::Chunk;
use crate::pipeline::parse;
use crate::prompts;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Generate card candidates for a single chunk.
///
/// ## Message Layout
///
/// 1. **System message** — quality/format rule blocks plus the language
///    instruction, assembled by [`prompts::build_system_prompt`]
/// 2. **User message** — the chunk text with its page-range label, and the
///    allowed-topic list in topic-aware mode
///
/// ## Return Value
///
/// Always returns a `ChunkResult` — callers check `result.error` to decide
/// whether the chunk participated. An error means the call itself failed;
/// a reply that parses to zero cards is a success with an empty card list.
pub async fn generate_for_chunk(
    provider: &Arc<dyn LlmProvider>,
    index: usize,
    chunk: &Chunk,
    config: &DeckConfig,
) -> ChunkResult {
    let start = Instant::now();
    let label = chunk.page_label();

    let system = prompts::build_system_prompt(config.card_kind, config.answer_format, &config.language);
    let user = match config.topics {
        Some(ref topics) if !topics.is_empty() => {
            prompts::user_prompt_with_topics(&label, &chunk.text, topics)
        }
        _ => prompts::user_prompt(&label, &chunk.text),
    };

    let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
    let options = build_options(config);

    let provider_label = provider.name();
    let call = provider.chat(&messages, Some(&options));

    match timeout(Duration::from_secs(config.api_timeout_secs), call).await {
        Ok(Ok(response)) => {
            let cards = parse::parse_cards(response.content.trim(), config.topic_aware());
            let duration = start.elapsed();
            debug!(
                "Chunk {} ({}): {} candidates, {} in / {} out tokens, {:?}",
                index,
                label,
                cards.len(),
                response.prompt_tokens,
                response.completion_tokens,
                duration
            );

            ChunkResult {
                index,
                pages: chunk.pages.clone(),
                cards,
                input_tokens: response.prompt_tokens as u64,
                output_tokens: response.completion_tokens as u64,
                duration_ms: duration.as_millis() as u64,
                error: None,
            }
        }
        Ok(Err(e)) => {
            let error = ChunkError::classify(&label, provider_label, format!("{e}"));
            warn!("Chunk {} ({}): {}", index, label, error);
            failed(index, chunk, start, error)
        }
        Err(_) => {
            let error = ChunkError::Timeout {
                pages: label.clone(),
                secs: config.api_timeout_secs,
            };
            warn!("Chunk {} ({}): {}", index, label, error);
            failed(index, chunk, start, error)
        }
    }
}

fn failed(index: usize, chunk: &Chunk, start: Instant, error: ChunkError) -> ChunkResult {
    ChunkResult {
        index,
        pages: chunk.pages.clone(),
        cards: Vec::new(),
        input_tokens: 0,
        output_tokens: 0,
        duration_ms: start.elapsed().as_millis() as u64,
        error: Some(error),
    }
}

/// Build `CompletionOptions` from the deck config.
fn build_options(config: &DeckConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = DeckConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.25));
        assert_eq!(opts.max_tokens, Some(4096));
    }
}
