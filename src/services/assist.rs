//! AI assistance relay.
//!
//! Forwards code (and, for the fix flow, a compiler error) to an
//! OpenAI-compatible chat-completions API and relays the reply. One
//! best-effort attempt per request, with no retries or rate limiting.
//! Without a configured key the endpoints degrade instead of calling out.

use crate::config::AiConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const FIX_SYSTEM_PROMPT: &str = "You are a C++ code fixing assistant. Analyze the code and error, then provide:
1. A clear explanation of the error
2. The fixed code
3. Suggestions to prevent similar errors
Format your response in markdown.";

const REVIEW_SYSTEM_PROMPT: &str = "You are a C++ code review assistant. Analyze the code and provide:
1. Code quality assessment
2. Performance considerations
3. Best practices suggestions
4. Potential improvements
Format your response in markdown.";

/// Shown by the fix endpoint when no API key is configured.
pub const AI_DISABLED_HELP: &str =
    "To enable AI features:\n1. Set the AI_API_KEY environment variable\n2. Restart the server";

/// Shown by the fix endpoint when the upstream call fails.
pub const FIX_FALLBACK_SUGGESTIONS: &str =
    "Failed to get AI suggestions. Please check your API key and try again.";

/// Canned review served when the upstream is unavailable, so the review
/// panel always has something to show.
const OFFLINE_REVIEW_SUGGESTIONS: &str = "## Code Review Suggestions

1. **Performance Optimization**
   - Consider using references instead of copies for large objects
   - Use const where possible to prevent accidental modifications

2. **Style Improvements**
   - Follow consistent naming conventions
   - Add more comments to explain complex logic

3. **Best Practices**
   - Initialize variables at declaration
   - Use smart pointers instead of raw pointers";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// What the fix flow got back from upstream.
#[derive(Debug)]
pub enum FixOutcome {
    /// No API key configured; degrade instead of calling out.
    Disabled,
    /// The external call failed or returned an unusable shape.
    Upstream(String),
    /// Raw assistant reply.
    Reply(String),
}

pub struct AssistTools {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl AssistTools {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn fix(&self, code: &str, error: &str) -> FixOutcome {
        if !self.enabled() {
            return FixOutcome::Disabled;
        }
        match self.chat(FIX_SYSTEM_PROMPT, &fix_prompt(code, error)).await {
            Ok(reply) => FixOutcome::Reply(reply),
            Err(e) => {
                tracing::error!("AI fix request failed: {}", e);
                FixOutcome::Upstream(e)
            }
        }
    }

    /// Review always yields usable text: the live reply when possible, the
    /// canned offline suggestions otherwise.
    pub async fn review(&self, code: &str) -> String {
        if !self.enabled() {
            return OFFLINE_REVIEW_SUGGESTIONS.to_string();
        }
        match self.chat(REVIEW_SYSTEM_PROMPT, &review_prompt(code)).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("AI review request failed: {}", e);
                OFFLINE_REVIEW_SUGGESTIONS.to_string()
            }
        }
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String, String> {
        let key = self.api_key.as_deref().ok_or("AI_API_KEY not configured")?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.7,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", key))
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("AI request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("AI API error {}: {}", status, body));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse AI response: {}", e))?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| "AI response contained no content".to_string())
    }
}

fn fix_prompt(code: &str, error: &str) -> String {
    format!("Fix this C++ code error:\nError: {}\n\nCode:\n{}", error, code)
}

fn review_prompt(code: &str) -> String {
    format!("Review this C++ code:\n\n{}", code)
}
