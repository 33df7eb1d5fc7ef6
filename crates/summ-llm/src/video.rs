use std::sync::LazyLock;

use anyhow::{Result, bail};
use async_trait::async_trait;
use html_escape::decode_html_entities;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})").expect("video id regex"));

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>(.*?) - YouTube</title>").expect("title regex"));

static CHANNEL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""channelName":"(.*?)""#).expect("channel regex"));

pub const UNKNOWN_CHANNEL: &str = "unknown";

/// Pulls the 11-character video id out of watch, short-link and embed URLs.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID
        .captures(url)
        .map(|caps| caps[1].to_string())
}

/// Parses `url`, accepting only `http` and `https` links with a host.
pub fn web_url(url: &str) -> Option<Url> {
    Url::parse(url)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
}

/// Title from a `<title>… - YouTube</title>` tag, entities decoded. A blank
/// title counts as no title.
pub fn parse_title(page: &str) -> Option<String> {
    TITLE
        .captures(page)
        .map(|caps| decode_html_entities(&caps[1]).trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Channel name from the embedded player JSON; `"unknown"` when absent or empty.
pub fn parse_channel_name(page: &str) -> String {
    let Some(caps) = CHANNEL_NAME.captures(page) else {
        return UNKNOWN_CHANNEL.to_string();
    };

    let raw = &caps[1];
    // The value sits inside a JSON string, so \uXXXX escapes are common.
    let decoded = serde_json::from_str::<String>(&format!("\"{raw}\""))
        .unwrap_or_else(|_| raw.to_string());
    let name = decode_html_entities(&decoded).into_owned();

    if name.is_empty() {
        UNKNOWN_CHANNEL.to_string()
    } else {
        name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoDetails {
    pub title: Option<String>,
    pub channel_name: Option<String>,
}

/// Best-effort metadata lookup. Failures come back as `None`, never as errors.
#[async_trait]
pub trait VideoMetadata: Send + Sync {
    async fn title(&self, url: &str) -> Option<String>;

    /// `None` only when the page could not be loaded at all.
    async fn channel_name(&self, url: &str) -> Option<String>;

    async fn lookup(&self, url: &str) -> VideoDetails {
        VideoDetails {
            title: self.title(url).await,
            channel_name: self.channel_name(url).await,
        }
    }
}

/// Scrapes the public watch page.
pub struct MetadataResolver {
    client: Client,
}

impl MetadataResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let Some(parsed) = web_url(url) else {
            bail!("not an http(s) URL: {}", url);
        };

        let response = self
            .client
            .get(parsed)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;
        debug!("Fetched {} ({})", url, response.status());

        Ok(response.text().await?)
    }
}

#[async_trait]
impl VideoMetadata for MetadataResolver {
    async fn title(&self, url: &str) -> Option<String> {
        match self.fetch_page(url).await {
            Ok(page) => parse_title(&page),
            Err(e) => {
                warn!("Error getting video title for {}: {}", url, e);
                None
            }
        }
    }

    async fn channel_name(&self, url: &str) -> Option<String> {
        match self.fetch_page(url).await {
            Ok(page) => Some(parse_channel_name(&page)),
            Err(e) => {
                warn!("Error getting channel name for {}: {}", url, e);
                None
            }
        }
    }

    /// One page load serves both fields.
    async fn lookup(&self, url: &str) -> VideoDetails {
        match self.fetch_page(url).await {
            Ok(page) => VideoDetails {
                title: parse_title(&page),
                channel_name: Some(parse_channel_name(&page)),
            },
            Err(e) => {
                warn!("Error getting video metadata for {}: {}", url, e);
                VideoDetails::default()
            }
        }
    }
}
