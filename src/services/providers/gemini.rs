/// Google Gemini text generation provider
///
/// Calls the `generateContent` REST endpoint with a single user turn and
/// returns the text of the first candidate. The key travels in the
/// `x-goog-api-key` header and request URLs are stripped from client errors,
/// so it never shows up in error messages or logs.
use crate::{
    error::{AppError, AppResult},
    models::{GeminiRequest, GeminiResponse},
    services::providers::TextGenerator,
};
use reqwest::Client as HttpClient;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, api_url: String, model: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait::async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let response = self
            .http_client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&GeminiRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(|e| AppError::HttpClient(e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "Gemini API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| AppError::HttpClient(e.without_url()))?;
        tracing::debug!(response = %response_text, "Raw Gemini API response");

        let parsed: GeminiResponse = serde_json::from_str(&response_text).map_err(|e| {
            AppError::Generation(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = parsed
            .text()
            .ok_or_else(|| AppError::Generation("Gemini response contained no text".to_string()))?;

        tracing::info!(
            model = %self.model,
            prompt_chars = prompt.len(),
            response_chars = text.len(),
            provider = "gemini",
            "Text generated"
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
