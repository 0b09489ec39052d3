//! Wire shapes of the Data API v3 responses, only the fields we read.

use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr};

#[derive(Debug, Deserialize)]
pub(super) struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchItem {
    pub id: SearchItemId,
    pub snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SearchItemId {
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Snippet {
    pub title: String,
    #[serde(default)]
    pub channel_title: Option<String>,
    pub published_at: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct VideosResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct VideoItem {
    pub id: String,
    #[serde(default)]
    pub statistics: Option<Statistics>,
}

// counts arrive as decimal strings
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Statistics {
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub view_count: Option<u64>,
}

impl VideoItem {
    /// Hidden or absent counters read as zero.
    pub fn views(&self) -> u64 {
        self.statistics
            .as_ref()
            .and_then(|statistics| statistics.view_count)
            .unwrap_or(0)
    }
}

/// Error envelope of a non-2xx response.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorDetail {
    pub message: String,
}

impl ErrorResponse {
    /// The API's own message when the body has one, the raw body otherwise.
    pub fn message_of(body: String) -> String {
        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(response) => response.error.message,
            Err(_) => body,
        }
    }
}
