//! Non-streaming completion requests.
//!
//! OpenAI and Groq share the chat-completions format. Anthropic uses the
//! Messages API.

use std::time::Duration;

use paperlens_core::{Error, Result};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::types::LLMProvider;

/// One completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub endpoint: &'a str,
    pub model: &'a str,
    pub api_key: &'a str,
    pub system: &'a str,
    pub prompt: &'a str,
    pub temperature: f64,
    pub max_tokens: usize,
    pub timeout: Duration,
}

fn map_send_error(e: reqwest::Error, request: &CompletionRequest<'_>) -> Error {
    if e.is_timeout() {
        Error::Timeout {
            context: format!("completion from {}", request.endpoint),
            secs: request.timeout.as_secs(),
        }
    } else if e.is_connect() {
        Error::Connectivity(format!("{}: {}", request.endpoint, e))
    } else {
        Error::Summarization(format!("Request failed: {}", e))
    }
}

async fn send(request: &CompletionRequest<'_>, builder: reqwest::RequestBuilder) -> Result<Value> {
    let response = builder
        .timeout(request.timeout)
        .send()
        .await
        .map_err(|e| map_send_error(e, request))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Summarization(format!("API error {}: {}", status, body)));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| Error::MalformedResponse(format!("completion body: {}", e)))
}

/// Request a completion from the given provider and return its text.
pub async fn complete(
    client: &Client,
    provider: LLMProvider,
    request: &CompletionRequest<'_>,
) -> Result<String> {
    debug!("Completion from {} with model {}", provider, request.model);
    match provider {
        LLMProvider::OpenAI | LLMProvider::Groq => complete_openai_compat(client, request).await,
        LLMProvider::Anthropic => complete_anthropic(client, request).await,
    }
}

async fn complete_openai_compat(client: &Client, request: &CompletionRequest<'_>) -> Result<String> {
    let body = json!({
        "model": request.model,
        "messages": [
            {"role": "system", "content": request.system},
            {"role": "user", "content": request.prompt},
        ],
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
        "stream": false,
    });

    let builder = client
        .post(request.endpoint)
        .header("Authorization", format!("Bearer {}", request.api_key))
        .header("Content-Type", "application/json")
        .json(&body);
    let parsed = send(request, builder).await?;

    parsed["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::MalformedResponse("completion has no message content".into()))
}

async fn complete_anthropic(client: &Client, request: &CompletionRequest<'_>) -> Result<String> {
    let body = json!({
        "model": request.model,
        "system": request.system,
        "messages": [{"role": "user", "content": request.prompt}],
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
    });

    let builder = client
        .post(request.endpoint)
        .header("x-api-key", request.api_key)
        .header("anthropic-version", "2023-06-01")
        .header("Content-Type", "application/json")
        .json(&body);
    let parsed = send(request, builder).await?;

    if parsed["type"].as_str() == Some("error") {
        let msg = parsed["error"]["message"].as_str().unwrap_or("Unknown error");
        return Err(Error::Summarization(msg.to_string()));
    }

    let text: String = parsed["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|b| b["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(Error::MalformedResponse("message has no text content".into()));
    }
    Ok(text)
}
