//! Sentiment scoring and intent tagging.
//!
//! The scorer front-end batches texts through a pluggable backend: either
//! the local lexicon scorer or an external model service, selected by
//! [`SentimentEngine`]. Remote failures degrade to lexicon scores per
//! batch, so a flaky service never sinks the pipeline.

pub mod intent;
pub mod lexicon;
pub mod remote;

use crate::sentiment::lexicon::{Lexicons, lexicon_sentiment};
use crate::sentiment::remote::{DEFAULT_SENTIMENT_MODEL, RemoteModelClient, SentimentBackend};
use anyhow::Result;
use std::str::FromStr;
use tracing::{info, warn};

/// Texts per request to the remote backend.
const BATCH_SIZE: usize = 32;

/// Which sentiment backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentEngine {
    /// Use the remote model when `SENTIMENT_API_URL` is configured,
    /// otherwise the lexicon.
    Auto,
    /// Require the remote model; falls back per batch if calls fail.
    Remote,
    /// Always use the lexicon scorer.
    Lexicon,
}

impl FromStr for SentimentEngine {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(SentimentEngine::Auto),
            "remote" => Ok(SentimentEngine::Remote),
            "lexicon" => Ok(SentimentEngine::Lexicon),
            other => anyhow::bail!(
                "invalid sentiment engine {other:?}; expected auto, remote, or lexicon"
            ),
        }
    }
}

/// Batched sentiment scorer with lexicon fallback.
pub struct SentimentScorer {
    lexicons: Lexicons,
    backend: Option<Box<dyn SentimentBackend>>,
}

impl SentimentScorer {
    /// Builds a scorer for the given engine, probing the environment for
    /// the remote endpoint when one is needed.
    pub fn new(engine: SentimentEngine, model: Option<&str>, lexicons: Lexicons) -> Result<Self> {
        let model = model.unwrap_or(DEFAULT_SENTIMENT_MODEL);

        let backend: Option<Box<dyn SentimentBackend>> = match engine {
            SentimentEngine::Lexicon => None,
            SentimentEngine::Auto | SentimentEngine::Remote => {
                match RemoteModelClient::from_env(model)? {
                    Some(client) => Some(Box::new(client)),
                    None => {
                        if engine == SentimentEngine::Remote {
                            warn!(
                                model,
                                "remote sentiment requested but SENTIMENT_API_URL is unset; \
                                 falling back to lexicon"
                            );
                        }
                        None
                    }
                }
            }
        };

        info!(
            backend = if backend.is_some() { "remote" } else { "lexicon" },
            model, "Sentiment backend selected"
        );

        Ok(Self { lexicons, backend })
    }

    /// A scorer that only ever uses the lexicon. Handy for tests.
    pub fn lexicon_only(lexicons: Lexicons) -> Self {
        Self { lexicons, backend: None }
    }

    pub fn lexicons(&self) -> &Lexicons {
        &self.lexicons
    }

    /// Scores every text to [-1, +1], in input order.
    ///
    /// Remote batches that fail are rescored with the lexicon, so the
    /// output always has one score per input.
    pub async fn score_texts(&self, texts: &[String]) -> Vec<f64> {
        let Some(backend) = &self.backend else {
            return texts.iter().map(|t| lexicon_sentiment(t, &self.lexicons)).collect();
        };

        let mut scores = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            match backend.score_texts(chunk).await {
                Ok(batch) => scores.extend(batch),
                Err(e) => {
                    warn!(error = %e, batch_len = chunk.len(), "Remote sentiment batch failed, using lexicon");
                    scores.extend(chunk.iter().map(|t| lexicon_sentiment(t, &self.lexicons)));
                }
            }
        }
        scores.into_iter().map(|s| s.clamp(-1.0, 1.0)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedBackend(Vec<f64>);

    #[async_trait]
    impl SentimentBackend for FixedBackend {
        async fn score_texts(&self, texts: &[String]) -> Result<Vec<f64>> {
            Ok(self.0.iter().copied().cycle().take(texts.len()).collect())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl SentimentBackend for FailingBackend {
        async fn score_texts(&self, _texts: &[String]) -> Result<Vec<f64>> {
            anyhow::bail!("service unavailable")
        }
    }

    #[test]
    fn test_engine_from_str() {
        assert_eq!("auto".parse::<SentimentEngine>().unwrap(), SentimentEngine::Auto);
        assert_eq!("Lexicon".parse::<SentimentEngine>().unwrap(), SentimentEngine::Lexicon);
        assert!("bert".parse::<SentimentEngine>().is_err());
    }

    #[tokio::test]
    async fn test_lexicon_only_scoring() {
        let scorer = SentimentScorer::lexicon_only(Lexicons::default());
        let scores = scorer
            .score_texts(&["great service".to_string(), "worst app".to_string()])
            .await;
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > 0.0);
        assert!(scores[1] < 0.0);
    }

    #[tokio::test]
    async fn test_remote_scores_are_clamped() {
        let scorer = SentimentScorer {
            lexicons: Lexicons::default(),
            backend: Some(Box::new(FixedBackend(vec![2.5, -3.0]))),
        };
        let scores = scorer.score_texts(&["a".to_string(), "b".to_string()]).await;
        assert_eq!(scores, vec![1.0, -1.0]);
    }

    #[tokio::test]
    async fn test_failed_batch_falls_back_to_lexicon() {
        let scorer = SentimentScorer {
            lexicons: Lexicons::default(),
            backend: Some(Box::new(FailingBackend)),
        };
        let scores = scorer.score_texts(&["excellent bank".to_string()]).await;
        assert_eq!(scores.len(), 1);
        assert!(scores[0] > 0.0);
    }
}
