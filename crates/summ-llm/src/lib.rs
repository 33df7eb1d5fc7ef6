//! External video services used when a summary is created: metadata
//! scraping, transcript download and chunked summarization.

pub mod inference;
pub mod summarizer;
pub mod transcript;
pub mod video;

use std::time::Duration;

use reqwest::Client;

pub use inference::{InferenceModel, ModelConfig};
pub use summarizer::{ModelError, SummaryModel, Summarizer, chunk_text};
pub use transcript::{TranscriptError, TranscriptSource, YoutubeTranscripts};
pub use video::{MetadataResolver, VideoDetails, VideoMetadata, extract_video_id, web_url};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Shared outbound client. Every request made through it is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}
