use std::collections::HashSet;
use std::future::Future;
use std::pin::pin;

use chrono::Utc;
use futures::{stream, Stream, StreamExt as _};
use snafu::{Location, ResultExt, Snafu};
use tracing::instrument;

use crate::config::Config;
use crate::database::{Database, DatabaseError};
use crate::keywords::{self, KeywordError};
use crate::model::{CandidateVideo, HighlightRecord, VideoId};
use crate::statistics::{StatisticsError, StatisticsResolver};
use crate::time;
use crate::youtube::{VideoPlatform, YouTube, YouTubeError};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum IngestError {
    #[snafu(display("cannot start ingestion without an API credential: {source}"))]
    Credential {
        source: YouTubeError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot load keywords: {source}"))]
    Keywords {
        source: KeywordError,
        #[snafu(implicit)]
        location: Location,
    },

    /// A search response broke the API contract, skipping the term would hide it.
    #[snafu(display("search for `{term}` returned an unusable response: {source}"))]
    Search {
        term: String,
        source: YouTubeError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot resolve view counts: {source}"))]
    Statistics {
        source: StatisticsError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot persist highlights: {source}"))]
    Persist {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl IngestError {
    /// Operator errors that will fail every following run the same way.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            IngestError::Credential { .. } | IngestError::Keywords { .. }
        )
    }
}

/// Summary of one complete run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub keywords: usize,
    pub skipped_keywords: usize,
    pub records: usize,
    pub upserted: usize,
}

/// Collects highlight records for a keyword list: search every keyword, keep the first
/// sighting of each video, then resolve all view counts in one resolver pass.
#[derive(Debug)]
pub struct Ingestor<P> {
    platform: P,
    concurrency: usize,
    statistics_retries: usize,
}

/// Candidates merged across keywords, plus how many keywords were skipped.
#[derive(Debug, Default)]
pub struct Discovery {
    pub candidates: Vec<CandidateVideo>,
    pub skipped_keywords: usize,
}

impl<P: VideoPlatform + Sync> Ingestor<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            concurrency: 1,
            statistics_retries: 0,
        }
    }

    /// Number of searches allowed in flight at once. Results are still merged in keyword
    /// order, so the outcome does not depend on this.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_statistics_retries(mut self, retries: usize) -> Self {
        self.statistics_retries = retries;
        self
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Produces one record per distinct video found by `keywords`, in first-seen order.
    #[instrument(skip(self, keywords), fields(keywords = keywords.len()))]
    pub async fn run(&self, keywords: &[String]) -> Result<Vec<HighlightRecord>, IngestError> {
        let discovery = self.discover(keywords).await?;
        self.enrich(discovery.candidates).await
    }

    /// Searches every keyword. Recoverable failures skip the keyword, anything else aborts.
    #[instrument(skip(self, keywords), fields(keywords = keywords.len()))]
    pub async fn discover(&self, keywords: &[String]) -> Result<Discovery, IngestError> {
        let mut searches = stream::iter(keywords)
            .map(|term| async move { (term, self.platform.search(term).await) })
            .buffered(self.concurrency);

        let mut batches = Vec::with_capacity(keywords.len());
        let mut skipped_keywords = 0;

        // dropping the stream on a hard error cancels the searches still queued
        while let Some((term, result)) = searches.next().await {
            match result {
                Ok(videos) => batches.push(videos),
                Err(error) if error.is_recoverable() => {
                    tracing::warn!(term = %term, %error, "search failed, skipping keyword");
                    skipped_keywords += 1;
                }
                Err(error) => return Err(error).context(SearchSnafu { term: term.as_str() }),
            }
        }

        let candidates = merge_candidates(batches);
        tracing::info!(
            candidates = candidates.len(),
            skipped_keywords,
            "finished searching keywords"
        );

        Ok(Discovery {
            candidates,
            skipped_keywords,
        })
    }

    /// Attaches view counts, defaulting to zero for videos the platform had no statistics for.
    pub async fn enrich(
        &self, candidates: Vec<CandidateVideo>,
    ) -> Result<Vec<HighlightRecord>, IngestError> {
        let ids: Vec<VideoId> = candidates
            .iter()
            .map(|candidate| candidate.video_id.clone())
            .collect();

        let statistics = StatisticsResolver::new(&self.platform)
            .with_retries(self.statistics_retries)
            .fetch_statistics(&ids)
            .await
            .context(StatisticsSnafu)?;

        let records = candidates
            .into_iter()
            .map(|candidate| {
                let views = statistics.get(&candidate.video_id).copied().unwrap_or(0);
                candidate.with_views(views)
            })
            .collect();

        Ok(records)
    }
}

/// Concatenates per-keyword results, dropping any video already seen in an earlier batch
/// (or earlier in the same batch).
pub fn merge_candidates(
    batches: impl IntoIterator<Item = Vec<CandidateVideo>>,
) -> Vec<CandidateVideo> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for candidate in batches.into_iter().flatten() {
        if seen.insert(candidate.video_id.clone()) {
            merged.push(candidate);
        }
    }

    merged
}

/// One full ingestion: credential check, keyword load, search, statistics, upsert.
///
/// Nothing is written unless every step before the upsert succeeded, and the upsert itself
/// is all-or-nothing.
#[instrument(skip_all)]
pub async fn run_once(config: &Config, database: &Database) -> Result<RunReport, IngestError> {
    let youtube = YouTube::connect(&config.youtube()).context(CredentialSnafu)?;
    let keywords = keywords::load(&config.keywords_path).context(KeywordsSnafu)?;

    let ingestor = Ingestor::new(youtube)
        .with_concurrency(config.search_concurrency)
        .with_statistics_retries(config.statistics_retries);

    let discovery = ingestor.discover(&keywords).await?;
    let skipped_keywords = discovery.skipped_keywords;
    let records = ingestor.enrich(discovery.candidates).await?;

    let upserted = database.upsert(&records).await.context(PersistSnafu)?;

    let report = RunReport {
        keywords: keywords.len(),
        skipped_keywords,
        records: records.len(),
        upserted,
    };
    tracing::info!(?report, "ingestion run finished");

    Ok(report)
}

/// Runs ingestion now and then on every `ingest_interval` boundary until interrupted.
#[instrument(skip_all, fields(interval = ?config.ingest_interval))]
pub async fn watch(config: &Config, database: &Database) -> Result<(), IngestError> {
    let timer = time::timer(config.ingest_interval, Utc::now());
    let ticks = stream::unfold(timer, |mut timer| async move {
        timer.tick().await;
        Some(((), timer))
    })
    .take_until(async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("stopping the ingestion schedule");
    });

    schedule(|| run_once(config, database), ticks).await
}

/// Calls `run` once, then again for every item of `ticks` until the stream ends.
///
/// A failed run is logged and the schedule carries on. A missing credential or keyword
/// list fails every later run the same way, so it ends the schedule with that error.
pub async fn schedule<F, Fut, T>(mut run: F, ticks: T) -> Result<(), IngestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<RunReport, IngestError>>,
    T: Stream<Item = ()>,
{
    let mut ticks = pin!(ticks);

    loop {
        match run().await {
            Ok(_) => {}
            Err(error) if error.is_precondition() => return Err(error),
            Err(error) => {
                tracing::error!(%error, "ingestion run failed, waiting for the next one");
            }
        }

        if ticks.next().await.is_none() {
            return Ok(());
        }
    }
}
