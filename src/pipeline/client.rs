use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use serde::Deserialize;

/// Structured result returned by the external prediction service.
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceOutput {
    /// Opaque prediction payload; stored and forwarded as-is.
    pub predictions: serde_json::Value,
    /// Optional processed rendition of the input (e.g. annotated image),
    /// forwarded to the client but never persisted.
    #[serde(default)]
    pub image: Option<serde_json::Value>,
}

/// Client for the external inference endpoint.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn predict(&self, data: Bytes, content_type: &str) -> anyhow::Result<InferenceOutput>;
}

pub struct HttpInferenceClient {
    client: reqwest::Client,
    url: String,
}

impl HttpInferenceClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn predict(&self, data: Bytes, content_type: &str) -> anyhow::Result<InferenceOutput> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, content_type.to_string())
            .body(data)
            .send()
            .await
            .context("inference request")?
            .error_for_status()
            .context("inference response status")?;

        let output = response
            .json::<InferenceOutput>()
            .await
            .context("inference response body")?;
        Ok(output)
    }
}
