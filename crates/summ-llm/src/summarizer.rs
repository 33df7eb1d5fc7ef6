use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, warn};

pub const MAX_CHUNK_LEN: usize = 1024;
pub const CHUNK_OVERLAP: usize = 200;
pub const MAX_OUTPUT_LEN: u32 = 50;
pub const MIN_OUTPUT_LEN: u32 = 15;

/// Returned in place of a summary when no model could be loaded.
pub const MODEL_UNAVAILABLE: &str = "Error: Could not load summarization model";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model could not be loaded: {0}")]
    Load(String),

    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("model returned no summary")]
    EmptyResponse,
}

/// A pretrained sequence-to-sequence summarization model.
#[async_trait]
pub trait SummaryModel: Send + Sync {
    fn name(&self) -> &str;

    async fn summarize_chunk(
        &self,
        chunk: &str,
        max_length: u32,
        min_length: u32,
    ) -> Result<String, ModelError>;
}

/// Splits `text` into windows of at most `max_len` characters, starting every
/// `max_len - overlap` characters. The window that reaches the end of the
/// text is the last one. Windows never split a code point.
pub fn chunk_text(text: &str, max_len: usize, overlap: usize) -> Vec<&str> {
    if text.is_empty() || max_len == 0 {
        return Vec::new();
    }

    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = bounds.len() - 1;
    let stride = max_len.saturating_sub(overlap).max(1);

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + max_len).min(char_count);
        windows.push(&text[bounds[start]..bounds[end]]);
        if end == char_count {
            break;
        }
        start += stride;
    }
    windows
}

/// Chunked summarization over an injected model.
#[derive(Clone)]
pub struct Summarizer {
    model: Option<Arc<dyn SummaryModel>>,
    max_chunk_len: usize,
    overlap: usize,
}

impl Summarizer {
    pub fn new(model: Option<Arc<dyn SummaryModel>>) -> Self {
        Self {
            model,
            max_chunk_len: MAX_CHUNK_LEN,
            overlap: CHUNK_OVERLAP,
        }
    }

    pub fn with_chunking(mut self, max_chunk_len: usize, overlap: usize) -> Self {
        self.max_chunk_len = max_chunk_len;
        self.overlap = overlap;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub async fn summarize(&self, text: &str) -> String {
        self.summarize_with(text, MAX_OUTPUT_LEN).await
    }

    /// Summarizes every window in order and joins the results with spaces.
    /// A failing window is logged and skipped.
    pub async fn summarize_with(&self, text: &str, max_output_len: u32) -> String {
        let Some(model) = &self.model else {
            error!("Summarization requested but no model is loaded");
            return MODEL_UNAVAILABLE.to_string();
        };

        let chunks = chunk_text(text, self.max_chunk_len, self.overlap);
        debug!("Summarizing {} chunk(s) with {}", chunks.len(), model.name());

        let mut summaries = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            match model
                .summarize_chunk(chunk, max_output_len, MIN_OUTPUT_LEN)
                .await
            {
                Ok(summary) => summaries.push(summary),
                Err(e) => warn!("Error summarizing chunk {}: {}", i, e),
            }
        }

        summaries.join(" ")
    }
}
