use derive_new::new;
use serde::{Deserialize, Serialize};

use super::{Timestamp, VideoId};

/// A search hit that has not been enriched with statistics yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct CandidateVideo {
    pub video_id: VideoId,
    pub title: String,
    pub channel_title: Option<String>,
    pub published_at: Timestamp,
}

impl CandidateVideo {
    pub fn with_views(self, views: u64) -> HighlightRecord {
        HighlightRecord {
            video_id: self.video_id,
            title: self.title,
            channel_title: self.channel_title,
            published_at: self.published_at,
            views,
        }
    }
}

/// One persisted row per distinct video, keyed by `video_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct HighlightRecord {
    pub video_id: VideoId,
    pub title: String,
    #[serde(default)]
    pub channel_title: Option<String>,
    pub published_at: Timestamp,
    #[serde(default)]
    pub views: u64,
}
