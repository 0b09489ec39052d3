use std::collections::HashMap;
use std::time::Duration;

use snafu::{ResultExt, Snafu};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::instrument;

use crate::model::VideoId;
use crate::youtube::{VideoPlatform, YouTubeError};

/// The statistics endpoint rejects calls with more ids than this.
pub const MAX_IDS_PER_CALL: usize = 50;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StatisticsError {
    #[snafu(display("statistics batch {batch} of {batches} ({ids} ids) failed: {source}"))]
    Batch {
        batch: usize,
        batches: usize,
        ids: usize,
        source: YouTubeError,
    },
}

/// Looks up view counts for any number of ids, [MAX_IDS_PER_CALL] at a time.
#[derive(Debug)]
pub struct StatisticsResolver<'a, P> {
    platform: &'a P,
    retries: usize,
    retry_delay: Duration,
}

impl<'a, P: VideoPlatform + Sync> StatisticsResolver<'a, P> {
    pub fn new(platform: &'a P) -> Self {
        Self {
            platform,
            retries: 0,
            retry_delay: Duration::from_millis(200),
        }
    }

    /// Retry a failed batch up to `retries` times when the failure is recoverable.
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Resolves the latest view count of every id the platform knows about. Ids without
    /// statistics are absent from the result; `ids` is expected to hold no duplicates.
    ///
    /// Issues exactly `ceil(ids.len() / MAX_IDS_PER_CALL)` calls when nothing is retried,
    /// and none at all for an empty input.
    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    pub async fn fetch_statistics(
        &self, ids: &[VideoId],
    ) -> Result<HashMap<VideoId, u64>, StatisticsError> {
        let mut statistics = HashMap::with_capacity(ids.len());
        if ids.is_empty() {
            return Ok(statistics);
        }

        let batches = ids.len().div_ceil(MAX_IDS_PER_CALL);
        for (index, chunk) in ids.chunks(MAX_IDS_PER_CALL).enumerate() {
            let counts = self
                .fetch_batch(chunk)
                .await
                .context(BatchSnafu {
                    batch: index + 1,
                    batches,
                    ids: chunk.len(),
                })?;

            tracing::debug!(
                batch = index + 1,
                batches,
                requested = chunk.len(),
                returned = counts.len(),
                "resolved statistics batch"
            );
            statistics.extend(counts);
        }

        Ok(statistics)
    }

    async fn fetch_batch(&self, chunk: &[VideoId]) -> Result<HashMap<VideoId, u64>, YouTubeError> {
        if self.retries == 0 {
            return self.platform.view_counts(chunk).await;
        }

        let base = (self.retry_delay.as_millis() as u64 / 2).max(1);
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(base)
            .max_delay(MAX_RETRY_DELAY)
            .map(jitter)
            .take(self.retries);

        RetryIf::spawn(
            strategy,
            || self.platform.view_counts(chunk),
            |error: &YouTubeError| {
                let retry = error.is_recoverable();
                if retry {
                    tracing::warn!(%error, "statistics batch failed, retrying");
                }
                retry
            },
        )
        .await
    }
}
