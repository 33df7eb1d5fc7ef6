use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::summarizer::{ModelError, SummaryModel};

pub const DEFAULT_MODEL_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-cnn";

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_MODEL_ENDPOINT.to_string(),
            token: None,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

#[derive(Debug, Deserialize)]
struct InferenceOutput {
    summary_text: String,
}

/// A summarization pipeline served over HTTP (Hugging Face inference API
/// shape: `{"inputs", "parameters"}` in, `[{"summary_text"}]` out).
pub struct InferenceModel {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

impl InferenceModel {
    /// Validates the configuration and prepares the client.
    pub fn load(config: &ModelConfig) -> Result<Self, ModelError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| ModelError::Load(format!("invalid endpoint '{}': {}", config.endpoint, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ModelError::Load(format!(
                "unsupported endpoint scheme '{}'",
                endpoint.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Load(e.to_string()))?;

        info!("Summarization model endpoint: {}", endpoint);
        Ok(Self {
            client,
            endpoint,
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }
}

#[async_trait]
impl SummaryModel for InferenceModel {
    fn name(&self) -> &str {
        self.endpoint.as_str()
    }

    async fn summarize_chunk(
        &self,
        chunk: &str,
        max_length: u32,
        min_length: u32,
    ) -> Result<String, ModelError> {
        let request = InferenceRequest {
            inputs: chunk,
            parameters: InferenceParameters {
                max_length,
                min_length,
                do_sample: false,
            },
        };

        let mut builder = self.client.post(self.endpoint.clone()).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, body });
        }

        let outputs: Vec<InferenceOutput> = response.json().await?;
        outputs
            .into_iter()
            .next()
            .map(|o| o.summary_text)
            .ok_or(ModelError::EmptyResponse)
    }
}
