//! Client for a hosted text-generation inference API.
//!
//! Speaks the Hugging Face `text-generation` task format: the prompt goes in
//! `inputs`, and the response is a list of `{"generated_text": ...}`
//! candidates of which only the first is used.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenerationError;

use super::{TextGenerator, with_timeout};

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: Parameters,
}

#[derive(Serialize)]
struct Parameters {
    max_new_tokens: u32,
    num_return_sequences: u32,
    return_full_text: bool,
}

#[derive(Deserialize)]
struct Candidate {
    generated_text: String,
}

/// HTTP text-generation client.
pub struct InferenceClient {
    client: Client,
    base_url: String,
    model: String,
    token: Option<String>,
    timeout: Option<Duration>,
}

impl InferenceClient {
    pub fn new(base_url: &str, model: &str, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            token,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the model endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, self.model)
    }

    async fn request(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        let body = InferenceRequest {
            inputs: prompt,
            parameters: Parameters {
                max_new_tokens: max_tokens,
                num_return_sequences: 1,
                return_full_text: false,
            },
        };

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(GenerationError::RequestFailed)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(GenerationError::RequestFailed)?;

        if !status.is_success() {
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_candidates(&text)
    }
}

/// Extract the first candidate's text from an inference response body.
fn parse_candidates(body: &str) -> Result<String, GenerationError> {
    let candidates: Vec<Candidate> = serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        GenerationError::MalformedResponse(format!("{e}. Response: {preview}"))
    })?;

    let first = candidates
        .into_iter()
        .next()
        .ok_or(GenerationError::EmptyCompletion)?;

    let text = first.generated_text.trim();
    if text.is_empty() {
        return Err(GenerationError::EmptyCompletion);
    }
    Ok(text.to_string())
}

#[async_trait]
impl TextGenerator for InferenceClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            max_tokens,
            "Requesting completion"
        );
        with_timeout(self.timeout, self.request(prompt, max_tokens)).await
    }
}
