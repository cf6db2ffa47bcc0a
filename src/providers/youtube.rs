use std::time::Duration;

use reqwest::{Client as HttpClient, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{MixerError, Result};

pub const SERVICE: &str = "youtube";

/// YouTube "Music" video category.
const MUSIC_CATEGORY_ID: &str = "10";

/// Client for the YouTube Data API v3 `search.list` endpoint.
#[derive(Clone)]
pub struct YoutubeClient {
    http_client: HttpClient,
    api_url: Url,
    api_key: String,
}

impl YoutubeClient {
    pub fn new(api_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        // `Url::join` drops the last segment unless the base ends with a slash.
        let base = if api_url.ends_with('/') {
            api_url.to_string()
        } else {
            format!("{api_url}/")
        };
        let api_url = Url::parse(&base)
            .map_err(|err| MixerError::other(format!("invalid YouTube api url {base}: {err}")))?;

        Ok(Self {
            http_client: super::http_client(timeout)?,
            api_url,
            api_key: api_key.into(),
        })
    }

    pub fn search_url(&self) -> Result<Url> {
        self.api_url
            .join("search")
            .map_err(|err| MixerError::other(format!("invalid YouTube search url: {err}")))
    }

    pub async fn search(&self, params: &SearchParams<'_>) -> Result<SearchResponse> {
        let response = self
            .http_client
            .get(self.search_url()?)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MixerError::from_status(
                SERVICE,
                status.as_u16(),
                error_message(&body),
            ));
        }

        let text = response.text().await?;
        debug!(target: "youtube", query = params.q, bytes = text.len(), "search responded");

        serde_json::from_str(&text)
            .map_err(|err| MixerError::malformed(SERVICE, format!("invalid search body: {err}")))
    }
}

impl std::fmt::Debug for YoutubeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoutubeClient")
            .field("api_url", &self.api_url.as_str())
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams<'a> {
    pub part: &'a str,
    pub q: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub video_category_id: &'a str,
    pub video_duration: &'a str,
    pub max_results: u32,
    pub order: &'a str,
}

impl<'a> SearchParams<'a> {
    /// Medium length (4-20 minute) videos in the music category, most viewed first.
    pub fn music_videos(q: &'a str, max_results: u32) -> Self {
        Self {
            part: "snippet",
            q,
            kind: "video",
            video_category_id: MUSIC_CATEGORY_ID,
            video_duration: "medium",
            max_results,
            order: "viewCount",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

/// One search hit. Every field is optional so a single odd item does not fail
/// the whole page; callers decide which fields they need.
#[derive(Debug, Default, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub id: VideoRef,
    #[serde(default)]
    pub snippet: Snippet,
}

impl SearchItem {
    pub fn title(&self) -> Option<&str> {
        self.snippet.title.as_deref()
    }

    pub fn video_id(&self) -> Option<&str> {
        self.id.video_id.as_deref()
    }

    pub fn medium_thumbnail_url(&self) -> Option<&str> {
        self.snippet
            .thumbnails
            .medium
            .as_ref()
            .and_then(|thumbnail| thumbnail.url.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRef {
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Snippet {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnails {
    #[serde(default)]
    pub medium: Option<Thumbnail>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorReason>,
}

#[derive(Deserialize)]
struct ErrorReason {
    #[serde(default)]
    reason: Option<String>,
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let reason = envelope
                .error
                .errors
                .iter()
                .find_map(|err| err.reason.as_deref());
            match reason {
                Some(reason) => format!("{reason}: {}", envelope.error.message),
                None => envelope.error.message,
            }
        }
        Err(_) => body.to_string(),
    }
}
