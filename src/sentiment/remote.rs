//! Remote sentiment backend: a narrow HTTP seam around an external
//! multilingual model service.
//!
//! The service contract is a JSON POST of `{model, texts}` answered by
//! `{scores}`, one score in [-1, +1] per input text.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable naming the scoring service endpoint.
pub const SENTIMENT_API_URL_VAR: &str = "SENTIMENT_API_URL";

/// Default model identifier: a solid multilingual baseline for
/// English + বাংলা social text.
pub const DEFAULT_SENTIMENT_MODEL: &str = "cardiffnlp/twitter-xlm-roberta-base-sentiment";

/// Abstraction over anything that can score a batch of texts.
#[async_trait]
pub trait SentimentBackend: Send + Sync {
    async fn score_texts(&self, texts: &[String]) -> Result<Vec<f64>>;
}

#[derive(Serialize)]
struct ScoreRequest<'a> {
    model: &'a str,
    texts: &'a [String],
}

#[derive(Deserialize)]
struct ScoreResponse {
    scores: Vec<f64>,
}

/// HTTP client for the external sentiment service.
pub struct RemoteModelClient {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

impl RemoteModelClient {
    pub fn new(endpoint: String, model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { endpoint, model, client })
    }

    /// Builds a client from `SENTIMENT_API_URL`, or `None` when unset.
    pub fn from_env(model: &str) -> Result<Option<Self>> {
        match std::env::var(SENTIMENT_API_URL_VAR) {
            Ok(url) if !url.trim().is_empty() => {
                Ok(Some(Self::new(url, model.to_string())?))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl SentimentBackend for RemoteModelClient {
    async fn score_texts(&self, texts: &[String]) -> Result<Vec<f64>> {
        let request = ScoreRequest { model: &self.model, texts };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("failed to reach sentiment service: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "sentiment service returned status {}: {}",
                status,
                body
            ));
        }

        let parsed: ScoreResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("failed to parse sentiment response: {}", e))?;

        if parsed.scores.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "sentiment service returned {} scores for {} texts",
                parsed.scores.len(),
                texts.len()
            ));
        }

        Ok(parsed.scores.into_iter().map(|s| s.clamp(-1.0, 1.0)).collect())
    }
}
