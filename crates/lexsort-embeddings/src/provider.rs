//! Embedding provider client.
//!
//! Speaks the OpenAI-compatible `/embeddings` wire shape:
//! request `{model, input: [text, ...]}`, response
//! `{data: [{embedding: [f32, ...]}, ...]}` aligned with the input.
//!
//! Error mapping is the contract callers rely on: 401/403 is an
//! authentication failure (fatal), 429 is rate limiting (caller may
//! back off), everything else is a transport failure. The client never
//! retries; retry policy belongs to the calling job.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use lexsort_types::ProviderSettings;

use crate::error::EmbeddingError;

/// Anything that can turn a batch of texts into vectors.
///
/// The HTTP client is the production implementation; tests substitute
/// deterministic mocks.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of at most the configured chunk size. The output
    /// is aligned one-to-one with `texts`.
    async fn embed_batch(
        &self,
        model: &str,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// HTTP embedding provider.
pub struct HttpEmbeddingProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl HttpEmbeddingProvider {
    /// Build a client from provider settings. The API key is read from
    /// the settings (or the environment layer that filled them) and held
    /// as a secret from here on.
    pub fn new(settings: &ProviderSettings) -> Result<Self, EmbeddingError> {
        let api_key = settings.api_key.clone().ok_or_else(|| {
            EmbeddingError::InvalidInput("provider API key is not configured".to_string())
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::InvalidInput(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: SecretString::from(api_key),
        })
    }

    /// The default model this client was configured with.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn classify_status(status: StatusCode, body: String) -> EmbeddingError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => EmbeddingError::ProviderAuth {
                status: status.as_u16(),
                message: body,
            },
            StatusCode::TOO_MANY_REQUESTS => {
                EmbeddingError::ProviderRateLimited { message: body }
            }
            _ => EmbeddingError::ProviderTransport {
                message: format!("status {}: {}", status.as_u16(), body),
            },
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_batch(
        &self,
        model: &str,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = texts.len(), model, "provider embed request");

        let request = EmbeddingRequest {
            model,
            input: texts,
        };
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbeddingError::ProviderTransport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, body));
        }

        let parsed: EmbeddingResponse =
            response
                .json()
                .await
                .map_err(|e| EmbeddingError::ProviderTransport {
                    message: format!("malformed provider response: {e}"),
                })?;

        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::ProviderTransport {
                message: format!(
                    "provider returned {} embeddings for {} inputs",
                    parsed.data.len(),
                    texts.len()
                ),
            });
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}
