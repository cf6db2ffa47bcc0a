use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    config::YoutubeConfig,
    errors::{MixerError, Result},
    providers::youtube::{self, SearchItem, SearchParams, YoutubeClient},
};

pub const MAX_SONGS: usize = 5;

/// Raw results requested per search. Extra headroom for post-filtering.
const RAW_RESULTS: u32 = 10;

/// Negative search terms appended to every query.
const EXCLUDED_TERMS: &str = "-playlist -mix -compilation -hours -album";

/// Lower-case title substrings that mark a result as something other than a single song.
pub const TITLE_BLOCKLIST: [&str; 7] = [
    "playlist",
    "mix",
    "compilation",
    "album",
    "hours",
    "best of",
    "top 10",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongCandidate {
    pub title: String,
    pub video_id: String,
    pub thumbnail_url: String,
}

impl SongCandidate {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

impl TryFrom<&SearchItem> for SongCandidate {
    type Error = MixerError;

    fn try_from(item: &SearchItem) -> Result<Self> {
        let missing =
            |field: &str| MixerError::malformed(youtube::SERVICE, format!("search item has no {field}"));

        Ok(Self {
            title: item.title().ok_or_else(|| missing("title"))?.to_string(),
            video_id: item.video_id().ok_or_else(|| missing("videoId"))?.to_string(),
            thumbnail_url: item
                .medium_thumbnail_url()
                .ok_or_else(|| missing("medium thumbnail"))?
                .to_string(),
        })
    }
}

/// Outcome of a song search. A provider failure is a degraded result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SongSearch {
    Found(Vec<SongCandidate>),
    Degraded { reason: String },
}

impl SongSearch {
    /// Accepted songs; empty when degraded.
    pub fn songs(&self) -> &[SongCandidate] {
        match self {
            SongSearch::Found(songs) => songs,
            SongSearch::Degraded { .. } => &[],
        }
    }

    pub fn into_songs(self) -> Vec<SongCandidate> {
        match self {
            SongSearch::Found(songs) => songs,
            SongSearch::Degraded { .. } => Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SongSearch::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            SongSearch::Found(_) => None,
            SongSearch::Degraded { reason } => Some(reason),
        }
    }
}

pub fn search_query(genre: &str) -> String {
    format!("{} songs {EXCLUDED_TERMS}", genre.trim())
}

pub fn is_blocklisted(title: &str) -> bool {
    let title = title.to_lowercase();
    TITLE_BLOCKLIST.iter().any(|keyword| title.contains(keyword))
}

/// Keeps provider order, drops blocklisted titles, stops at [`MAX_SONGS`].
///
/// Only the title is read before the blocklist check, and nothing past the
/// last accepted song is read at all. An accepted item missing its video id
/// or thumbnail is an error.
pub fn filter_songs<'a, I>(items: I) -> Result<Vec<SongCandidate>>
where
    I: IntoIterator<Item = &'a SearchItem>,
{
    let mut songs = Vec::with_capacity(MAX_SONGS);
    for item in items {
        if songs.len() == MAX_SONGS {
            break;
        }
        let title = item
            .title()
            .ok_or_else(|| MixerError::malformed(youtube::SERVICE, "search item has no title"))?;
        if is_blocklisted(title) {
            continue;
        }
        songs.push(SongCandidate::try_from(item)?);
    }
    Ok(songs)
}

#[derive(Debug, Clone)]
pub struct SongFinder {
    client: YoutubeClient,
}

impl SongFinder {
    pub fn new(config: &YoutubeConfig, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: YoutubeClient::new(&config.api_url, api_key, config.timeout)?,
        })
    }

    pub async fn find_songs(&self, genre: &str) -> SongSearch {
        match self.search(genre).await {
            Ok(songs) => {
                info!(target: "song_finder", genre, count = songs.len(), "songs found");
                SongSearch::Found(songs)
            }
            Err(err) => {
                error!(
                    target: "song_finder",
                    genre,
                    error = ?err,
                    trace = %err.chain(),
                    "song search failed, returning no songs"
                );
                SongSearch::Degraded {
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn search(&self, genre: &str) -> Result<Vec<SongCandidate>> {
        if genre.trim().is_empty() {
            return Err(MixerError::invalid_input("genre must not be empty"));
        }

        let query = search_query(genre);
        let params = SearchParams::music_videos(&query, RAW_RESULTS);
        let response = self.client.search(&params).await?;

        filter_songs(&response.items)
    }
}
