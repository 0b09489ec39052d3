use std::collections::HashMap;
use std::future::Future;

use serde::de::DeserializeOwned;
use snafu::{OptionExt as _, ResultExt};
use tracing::instrument;

use crate::config::{ApiKey, YouTubeConfig};
use crate::model::{CandidateVideo, Timestamp, VideoId};

pub use error::*;
use response::{ErrorResponse, SearchResponse, VideosResponse};

mod error;
mod response;

/// The two upstream calls ingestion depends on. Implemented by [YouTube] and by test fakes.
pub trait VideoPlatform {
    /// One page of video results for `term`, newest first.
    fn search(&self, term: &str) -> impl Future<Output = Result<Vec<CandidateVideo>>> + Send;

    /// View counts for at most [crate::statistics::MAX_IDS_PER_CALL] ids in a single call.
    /// Ids the platform has no statistics for are left out of the map.
    fn view_counts(
        &self, ids: &[VideoId],
    ) -> impl Future<Output = Result<HashMap<VideoId, u64>>> + Send;
}

/// Client for the YouTube Data API v3.
#[derive(Clone)]
pub struct YouTube {
    client: reqwest::Client,
    endpoint: String,
    api_key: ApiKey,
    results_per_page: u32,
}

impl std::fmt::Debug for YouTube {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTube")
            .field("endpoint", &self.endpoint)
            .field("results_per_page", &self.results_per_page)
            .finish_non_exhaustive()
    }
}

impl YouTube {
    /// Fails with [YouTubeError::MissingApiKey] when no usable key is configured.
    pub fn connect(config: &YouTubeConfig) -> Result<YouTube> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_blank())
            .context(MissingApiKeySnafu)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context(BuildClientSnafu)?;

        Ok(YouTube {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            results_per_page: config.results_per_page,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self, endpoint: &'static str, query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.endpoint, endpoint);

        // the key travels in the query string, keep it out of error messages
        let response = self
            .client
            .get(url)
            .query(query)
            .query(&[("key", self.api_key.expose())])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context(RequestSnafu { endpoint })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context(RequestSnafu { endpoint })?;

        if !status.is_success() {
            return ApiSnafu {
                endpoint,
                status: status.as_u16(),
                message: ErrorResponse::message_of(body),
            }
            .fail();
        }

        serde_json::from_str(&body).context(MalformedBodySnafu { endpoint })
    }
}

impl VideoPlatform for YouTube {
    #[instrument(skip(self))]
    async fn search(&self, term: &str) -> Result<Vec<CandidateVideo>> {
        let max_results = self.results_per_page.to_string();
        let response: SearchResponse = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("type", "video"),
                    ("order", "date"),
                    ("maxResults", max_results.as_str()),
                    ("q", term),
                ],
            )
            .await?;

        let mut videos = Vec::with_capacity(response.items.len());
        for item in response.items {
            let Some(raw_id) = item.id.video_id else {
                tracing::debug!(term, "skipping a search result that is not a video");
                continue;
            };

            let video_id: VideoId = raw_id
                .parse()
                .ok()
                .context(InvalidVideoIdSnafu { text: raw_id.as_str() })?;

            let snippet = item.snippet;
            let published_at = Timestamp::parse_youtube(&snippet.published_at).context(
                InvalidTimestampSnafu {
                    video_id: video_id.as_str(),
                    text: snippet.published_at.as_str(),
                },
            )?;

            videos.push(CandidateVideo {
                video_id,
                title: snippet.title,
                channel_title: snippet.channel_title,
                published_at,
            });
        }

        tracing::debug!(term, found = videos.len(), "search finished");
        Ok(videos)
    }

    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    async fn view_counts(&self, ids: &[VideoId]) -> Result<HashMap<VideoId, u64>> {
        let joined = ids
            .iter()
            .map(VideoId::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let response: VideosResponse = self
            .get("videos", &[("part", "statistics"), ("id", joined.as_str())])
            .await?;

        let mut counts = HashMap::with_capacity(response.items.len());
        for item in response.items {
            let video_id: VideoId = item
                .id
                .parse()
                .ok()
                .context(InvalidVideoIdSnafu { text: item.id.as_str() })?;
            counts.insert(video_id, item.views());
        }

        Ok(counts)
    }
}
