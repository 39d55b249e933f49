//! HTTP client for a locally hosted text-classification server.
//!
//! Posts `{"inputs": "<text>"}` and accepts either a flat `[{label, score}]`
//! list or the nested `[[{label, score}]]` form that batch-capable servers
//! return.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sentitrade_core::ModelConfig;
use serde::{Deserialize, Serialize};

use crate::model::{LabelScore, ModelBackend};

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Flat(Vec<LabelScore>),
    Nested(Vec<Vec<LabelScore>>),
}

impl ClassifyResponse {
    fn into_labels(self) -> Vec<LabelScore> {
        match self {
            Self::Flat(labels) => labels,
            Self::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
        }
    }
}

/// [`ModelBackend`] speaking to an inference server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpModelBackend {
    client: reqwest::Client,
    endpoint: String,
    name: String,
}

impl HttpModelBackend {
    /// Creates a backend from the model section of the configuration.
    ///
    /// The client timeout matches the scorer timeout so abandoned requests
    /// do not linger.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            name: config.name.clone(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ModelBackend for HttpModelBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, text: &str) -> Result<Vec<LabelScore>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { inputs: text })
            .send()
            .await
            .context("Failed to send request to inference server")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("inference server error ({}): {}", status, error_text));
        }

        let body: ClassifyResponse = response
            .json()
            .await
            .context("Failed to parse inference server response")?;

        Ok(body.into_labels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> ModelConfig {
        ModelConfig {
            endpoint: format!("{}/classify", server.uri()),
            name: "nlptown".to_string(),
            timeout_ms: 1_000,
        }
    }

    #[tokio::test]
    async fn posts_inputs_and_parses_flat_labels() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/classify"))
            .and(body_json(serde_json::json!({"inputs": "great quarter"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"label": "5 stars", "score": 0.8},
                {"label": "4 stars", "score": 0.2}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let backend = HttpModelBackend::new(&config(&mock_server)).unwrap();
        let labels = backend.classify("great quarter").await.unwrap();

        assert_eq!(backend.name(), "nlptown");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0], LabelScore::new("5 stars", 0.8));
    }

    #[tokio::test]
    async fn parses_nested_labels() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/classify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([[
                {"label": "negative", "score": 0.9},
                {"label": "positive", "score": 0.1}
            ]])))
            .mount(&mock_server)
            .await;

        let backend = HttpModelBackend::new(&config(&mock_server)).unwrap();
        let labels = backend.classify("awful").await.unwrap();
        assert_eq!(labels[0].label, "negative");
    }

    #[tokio::test]
    async fn server_errors_are_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/classify"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
            .mount(&mock_server)
            .await;

        let backend = HttpModelBackend::new(&config(&mock_server)).unwrap();
        let err = backend.classify("anything").await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("model loading"));
    }
}
