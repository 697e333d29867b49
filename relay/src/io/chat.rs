//! Chat-completion backend and the session wrapper that owns the transcript.

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::transcript::{Transcript, Turn};
use crate::io::config::ChatConfig;

/// Abstraction over the chat-completion service.
///
/// The full ordered transcript goes in; one assistant message comes out.
pub trait ChatBackend {
    fn complete(&self, transcript: &Transcript) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

/// Blocking client for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug)]
pub struct OpenAiChat {
    config: ChatConfig,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl OpenAiChat {
    /// Build a client. The API key is handed in explicitly; reading it from
    /// the environment is the caller's business.
    pub fn new(config: ChatConfig, api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            bail!("OPENAI_API_KEY is not set");
        }
        Ok(Self {
            config,
            api_key,
            client: reqwest::blocking::Client::new(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

impl ChatBackend for OpenAiChat {
    fn complete(&self, transcript: &Transcript) -> Result<String> {
        debug!(turns = transcript.len(), model = %self.config.model, "calling chat service");

        let request = CompletionRequest {
            model: &self.config.model,
            messages: transcript.turns(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .context("send chat request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("chat service returned {status}: {body}");
        }

        let completion: CompletionResponse = response.json().context("parse chat response")?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("chat service returned no choices"))?;
        Ok(choice.message.content.trim().to_string())
    }
}

/// Conversation state plus the backend that advances it.
pub struct ChatSession<B> {
    backend: B,
    transcript: Transcript,
}

impl<B: ChatBackend> ChatSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            transcript: Transcript::new(),
        }
    }

    /// Exchange one user message for one assistant message.
    ///
    /// The user turn is appended before the call and rolled back if the
    /// backend fails, so a failed exchange leaves the transcript exactly as
    /// it was.
    pub fn send(&mut self, text: &str) -> Result<String> {
        self.transcript.push_user(text);
        match self.backend.complete(&self.transcript) {
            Ok(reply) => {
                self.transcript.push_assistant(reply.clone());
                Ok(reply)
            }
            Err(err) => {
                self.transcript.pop();
                Err(err)
            }
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}
