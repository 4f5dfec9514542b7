//! LLM provider seam: the generation model is an injected, caller-owned
//! collaborator.
//!
//! Mirrors the OCR seam ([`crate::pipeline::ocr`]): the pipeline talks to a
//! [`LlmProvider`] trait object and never constructs a network client on its
//! own initiative. The bundled [`OpenAiProvider`] speaks the OpenAI
//! chat-completions protocol via `async-openai`, which also covers the
//! family of servers exposing the same REST surface (OpenRouter, Ollama,
//! LM Studio, vLLM). Anything else — a different wire protocol, custom
//! middleware, a test double — implements the trait and is handed in
//! through [`crate::config::DeckConfigBuilder::provider`].

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// One message in a chat-completion request.
///
/// The pipeline only ever sends a system message (the card-generation
/// rules) followed by a user message (the chunk text), so the roles are a
/// two-variant sum rather than a free-form role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    /// Instructions the model must follow for the whole reply.
    System(String),
    /// The content the model is asked to work on.
    User(String),
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User(content.into())
    }
}

/// Sampling options for one completion call.
///
/// `None` fields are left to the provider's defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    /// Sampling temperature, 0.0–2.0.
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens.
    pub max_tokens: Option<usize>,
}

/// A completed chat call.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The model's reply text.
    pub content: String,
    /// Tokens consumed by the request, as reported by the provider
    /// (0 when the provider omits usage data).
    pub prompt_tokens: u32,
    /// Tokens generated in the reply (0 when omitted).
    pub completion_tokens: u32,
}

/// A failed chat call or provider construction.
///
/// Carried as a display string: provider backends differ in how much
/// structure they expose, so classification into auth / rate-limit /
/// transport happens textually at the chunk level
/// ([`crate::error::ChunkError`]).
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct LlmError(pub String);

/// A chat-completion language model.
///
/// The pipeline issues one `chat` call per chunk and treats it as atomic:
/// it either returns a reply or fails, with no retry and no partial result.
/// Implementations must be callable concurrently from multiple chunks on
/// one instance.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs and error messages (e.g. "openai").
    fn name(&self) -> &str;

    /// Model identifier the provider calls.
    fn model(&self) -> &str;

    /// Send one chat-completion request and wait for the full reply.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: Option<&CompletionOptions>,
    ) -> Result<ChatResponse, LlmError>;
}

/// Chat-completion provider for OpenAI and OpenAI-compatible endpoints.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    name: String,
    model: String,
}

impl OpenAiProvider {
    /// Provider for `api.openai.com` with the given model and key.
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            name: "openai".to_string(),
            model: model.into(),
        }
    }

    /// Provider for any other endpoint speaking the same protocol.
    ///
    /// `name` is only used in logs and error messages. Servers that do not
    /// check credentials (local Ollama, LM Studio) still need a placeholder
    /// key because the protocol always sends an Authorization header.
    pub fn with_endpoint(
        name: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);
        Self {
            client: Client::with_config(config),
            name: name.into(),
            model: model.into(),
        }
    }
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("name", &self.name)
            .field("model", &self.model)
            .finish()
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: Option<&CompletionOptions>,
    ) -> Result<ChatResponse, LlmError> {
        let api_messages = to_api_messages(messages).map_err(|e| LlmError(e.to_string()))?;

        let mut request = CreateChatCompletionRequestArgs::default();
        request.model(self.model.as_str()).messages(api_messages);
        if let Some(opts) = options {
            if let Some(t) = opts.temperature {
                request.temperature(t);
            }
            if let Some(n) = opts.max_tokens {
                request.max_tokens(n as u32);
            }
        }
        let request = request.build().map_err(|e| LlmError(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();
        let (prompt_tokens, completion_tokens) = response
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(ChatResponse {
            content,
            prompt_tokens,
            completion_tokens,
        })
    }
}

fn to_api_messages(
    messages: &[ChatMessage],
) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
    messages
        .iter()
        .map(|message| {
            Ok(match message {
                ChatMessage::System(text) => ChatCompletionRequestSystemMessageArgs::default()
                    .content(text.as_str())
                    .build()?
                    .into(),
                ChatMessage::User(text) => ChatCompletionRequestUserMessageArgs::default()
                    .content(text.as_str())
                    .build()?
                    .into(),
            })
        })
        .collect()
}

/// Create a provider for a known endpoint name.
///
/// | name         | endpoint                        | key                           |
/// |--------------|---------------------------------|-------------------------------|
/// | `openai`     | `api.openai.com`                | `OPENAI_API_KEY` (required)   |
/// | `openrouter` | `openrouter.ai/api/v1`          | `OPENROUTER_API_KEY` (required) |
/// | `ollama`     | `OLLAMA_HOST` or `localhost:11434` | none                       |
/// | `lmstudio`   | `localhost:1234`                | none                          |
///
/// All four speak the OpenAI chat-completions protocol. An endpoint not in
/// the table (or one needing a different protocol) is wired in as a
/// pre-built [`LlmProvider`] instead.
pub fn provider_from_name(name: &str, model: &str) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = match name.to_lowercase().as_str() {
        "openai" => OpenAiProvider::new(model, require_key("OPENAI_API_KEY")?),
        "openrouter" => OpenAiProvider::with_endpoint(
            "openrouter",
            model,
            require_key("OPENROUTER_API_KEY")?,
            "https://openrouter.ai/api/v1",
        ),
        "ollama" => {
            let host = std::env::var("OLLAMA_HOST")
                .ok()
                .filter(|h| !h.trim().is_empty())
                .unwrap_or_else(|| "http://localhost:11434".to_string());
            let base = format!("{}/v1", host.trim_end_matches('/'));
            OpenAiProvider::with_endpoint("ollama", model, "ollama", base)
        }
        "lmstudio" => OpenAiProvider::with_endpoint(
            "lmstudio",
            model,
            "lm-studio",
            "http://localhost:1234/v1",
        ),
        other => {
            return Err(LlmError(format!(
                "unknown provider '{other}' (expected openai, openrouter, ollama, or lmstudio)"
            )))
        }
    };
    Ok(Arc::new(provider))
}

/// Auto-detect a provider from the environment.
///
/// Checks `OPENAI_API_KEY` first, then `OPENROUTER_API_KEY`, so users with
/// multiple keys get a deterministic default. Local servers (ollama,
/// lmstudio) are never auto-selected — name them explicitly.
pub fn provider_from_env(model: &str) -> Result<Arc<dyn LlmProvider>, LlmError> {
    for (var, name) in [
        ("OPENAI_API_KEY", "openai"),
        ("OPENROUTER_API_KEY", "openrouter"),
    ] {
        if std::env::var(var).is_ok_and(|v| !v.trim().is_empty()) {
            return provider_from_name(name, model);
        }
    }
    Err(LlmError(
        "no API key found in environment (looked for OPENAI_API_KEY, OPENROUTER_API_KEY)".into(),
    ))
}

fn require_key(var: &str) -> Result<String, LlmError> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(LlmError(format!("{var} is not set"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        assert_eq!(
            ChatMessage::system("rules"),
            ChatMessage::System("rules".into())
        );
        assert_eq!(ChatMessage::user("text"), ChatMessage::User("text".into()));
    }

    #[test]
    fn default_options_leave_everything_to_the_provider() {
        let opts = CompletionOptions::default();
        assert_eq!(opts.temperature, None);
        assert_eq!(opts.max_tokens, None);
    }

    #[test]
    fn unknown_provider_name_rejected() {
        let err = provider_from_name("carrier-pigeon", DEFAULT_MODEL).unwrap_err();
        assert!(err.to_string().contains("carrier-pigeon"), "got: {err}");
    }

    #[test]
    fn keyless_endpoints_construct_without_env() {
        // Ollama and LM Studio need no API key, so construction always works.
        let provider = provider_from_name("ollama", "llama3.1").unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model(), "llama3.1");

        let provider = provider_from_name("LMStudio", "qwen2.5").unwrap();
        assert_eq!(provider.name(), "lmstudio");
    }

    #[test]
    fn api_messages_preserve_order_and_roles() {
        let messages = vec![ChatMessage::system("be terse"), ChatMessage::user("hello")];
        let api = to_api_messages(&messages).unwrap();
        assert_eq!(api.len(), 2);
        assert!(matches!(api[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(api[1], ChatCompletionRequestMessage::User(_)));
    }
}
