//! The stateless image-query client.
//!
//! Image-grounded questions cannot ride the streaming channel — its
//! conversation schema has no image content part — so they go through a
//! single request/response call instead. The channel is fully independent
//! of the streaming connection's lifecycle: it works while the session is
//! connecting, live, or torn down.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::channel::VisionChannel;
use crate::error::EngineError;
use crate::response::Response;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MAX_ANSWER_TOKENS: u32 = 4096;

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub content: String,
}

pub struct VisionClient {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl VisionClient {
    pub fn new(api_key: SecretString, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}

/// The image travels inline as a JPEG data URI; there is no upload step.
fn image_data_uri(image: &[u8]) -> String {
    format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(image)
    )
}

#[async_trait]
impl VisionChannel for VisionClient {
    async fn analyze(&self, image: &[u8], prompt: &str) -> Result<Response, EngineError> {
        if image.is_empty() {
            return Err(EngineError::CapabilityMismatch(
                "image query submitted without image bytes; use a text turn instead".to_string(),
            ));
        }

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": prompt },
                        {
                            "type": "image_url",
                            "image_url": {
                                "url": image_data_uri(image),
                                "detail": "high"
                            }
                        }
                    ]
                }
            ],
            "max_tokens": MAX_ANSWER_TOKENS,
            "temperature": 0.3
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(EngineError::Protocol {
                code: Some(status.as_u16().to_string()),
                message: detail,
                terminal: false,
            });
        }

        let parsed = resp.json::<LlmResponse>().await.map_err(|e| EngineError::Protocol {
            code: None,
            message: format!("malformed response body: {}", e),
            terminal: false,
        })?;

        let answer = parsed
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| EngineError::Protocol {
                code: None,
                message: "response contained no choices".to_string(),
                terminal: false,
            })?;

        Ok(Response::vision(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::VisionChannel;
    use std::env;

    #[test]
    fn data_uri_shape() {
        let uri = image_data_uri(&[0xFF, 0xD8, 0xFF]);
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        assert_eq!(uri, "data:image/jpeg;base64,/9j/");
    }

    #[tokio::test]
    async fn empty_image_rejected_before_any_request() {
        let client = VisionClient::new(SecretString::from("sk-unused".to_string()), "gpt-4o".to_string())
            // Unroutable address: a request would fail loudly, proving the
            // rejection happens before the network.
            .with_base_url("http://127.0.0.1:1");
        let err = client.analyze(&[], "what is this?").await.unwrap_err();
        assert!(matches!(err, EngineError::CapabilityMismatch(_)));
    }

    // This is an integration test that makes a live call to the API.
    // It is ignored by default; run with `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn live_analyze_smoke() -> anyhow::Result<()> {
        dotenvy::dotenv_override().ok();
        let api_key = env::var("OPENAI_API_KEY")?;
        let client = VisionClient::new(SecretString::from(api_key), "gpt-4o".to_string());

        // A 1x1 white JPEG.
        let image = base64::engine::general_purpose::STANDARD.decode(
            "/9j/4AAQSkZJRgABAQEAYABgAAD/2wBDAAgGBgcGBQgHBwcJCQgKDBQNDAsLDBkSEw8UHRofHh0a\
             HBwgJC4nICIsIxwcKDcpLDAxNDQ0Hyc5PTgyPC4zNDL/wAALCAABAAEBAREA/8QAFAABAAAAAAAA\
             AAAAAAAAAAAACf/EABQQAQAAAAAAAAAAAAAAAAAAAAD/2gAIAQEAAD8AVN//2Q==",
        )?;

        let response = client.analyze(&image, "Describe this image in one word.").await?;
        assert!(!response.text().is_empty());
        Ok(())
    }
}
