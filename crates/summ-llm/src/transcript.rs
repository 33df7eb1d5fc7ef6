use async_trait::async_trait;
use html_escape::decode_html_entities;
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse";
/// Caption language code preferred when a video has several tracks.
const PREFERRED_LANGUAGE: &str = "en";

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("invalid video id '{0}'")]
    InvalidVideoId(String),

    #[error("transcript request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no transcript available for video {0}")]
    NoCaptions(String),

    #[error("could not read video page: {0}")]
    Parse(String),
}

/// Retrieves the flat transcript text of a video.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_transcript(&self, video_id: &str) -> Result<String, TranscriptError>;
}

/// Reads the caption track advertised by the public watch page.
pub struct YoutubeTranscripts {
    client: Client,
}

impl YoutubeTranscripts {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscripts {
    async fn fetch_transcript(&self, video_id: &str) -> Result<String, TranscriptError> {
        if !is_video_id(video_id) {
            return Err(TranscriptError::InvalidVideoId(video_id.to_string()));
        }

        let page = self
            .client
            .get(format!("{WATCH_URL}{video_id}"))
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let player = extract_player_response(&page)?;
        let track_url = caption_track_url(&player, PREFERRED_LANGUAGE)
            .ok_or_else(|| TranscriptError::NoCaptions(video_id.to_string()))?;
        debug!("Fetching captions for {} from {}", video_id, track_url);

        let xml = self
            .client
            .get(track_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let segments = parse_timed_text(&xml)?;
        if segments.is_empty() {
            warn!("Caption track for {} had no text segments", video_id);
            return Err(TranscriptError::NoCaptions(video_id.to_string()));
        }

        Ok(join_segments(&segments))
    }
}

fn is_video_id(id: &str) -> bool {
    id.len() == 11
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Decodes the `ytInitialPlayerResponse = {...};` object embedded in the page.
pub fn extract_player_response(page: &str) -> Result<Value, TranscriptError> {
    let start = page
        .find(PLAYER_RESPONSE_MARKER)
        .ok_or_else(|| TranscriptError::Parse("player response not found".into()))?;
    let rest = &page[start + PLAYER_RESPONSE_MARKER.len()..];
    let brace = rest
        .find('{')
        .ok_or_else(|| TranscriptError::Parse("player response is not an object".into()))?;

    // The object is followed by more script, so read exactly one JSON value.
    serde_json::Deserializer::from_str(&rest[brace..])
        .into_iter::<Value>()
        .next()
        .ok_or_else(|| TranscriptError::Parse("player response is empty".into()))?
        .map_err(|e| TranscriptError::Parse(e.to_string()))
}

/// URL of the caption track matching `language`, else the first track.
pub fn caption_track_url(player: &Value, language: &str) -> Option<String> {
    let tracks = player
        .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")?
        .as_array()?;

    let preferred = tracks.iter().find(|track| {
        track["languageCode"]
            .as_str()
            .is_some_and(|code| code.starts_with(language))
    });

    preferred
        .or_else(|| tracks.first())
        .and_then(|track| track["baseUrl"].as_str())
        .map(str::to_string)
}

/// Text of every `<text>` element in document order. Caption text is escaped
/// twice (XML around HTML): the reader undoes the XML layer, then HTML
/// entities are decoded.
pub fn parse_timed_text(xml: &str) -> Result<Vec<String>, TranscriptError> {
    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"text" => current = Some(String::new()),
            Ok(Event::Empty(e)) if e.name().as_ref() == b"text" => segments.push(String::new()),
            Ok(Event::Text(e)) => {
                if let Some(segment) = current.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| TranscriptError::Parse(e.to_string()))?;
                    segment.push_str(&decode_html_entities(&text));
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"text" => {
                if let Some(segment) = current.take() {
                    segments.push(segment);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TranscriptError::Parse(format!(
                    "timed text at byte {}: {}",
                    reader.error_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(segments)
}

/// Joins segments with single spaces, preserving order and skipping blanks.
pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
