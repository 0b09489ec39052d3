use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use snafu::ResultExt as _;
use tracing::instrument;

use super::schema::HIGHLIGHTS;
use super::{Database, DatabaseQuerySnafu, Result, UpsertRolledBackSnafu};
use crate::model::{HighlightRecord, Timestamp, VideoId};

/// Read-side filter: published no earlier than `since`, at least `min_views` views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightFilter {
    pub since: Timestamp,
    pub min_views: u64,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct Count {
    count: usize,
}

impl Database {
    /// Inserts new videos and overwrites every field of videos already stored, all in one
    /// transaction: either every record is written or none is.
    ///
    /// Returns the number of records written.
    #[instrument(skip_all, fields(records = records.len()))]
    pub async fn upsert(&self, records: &[HighlightRecord]) -> Result<usize> {
        if records.is_empty() {
            tracing::info!("nothing to upsert");
            return Ok(0);
        }

        let mut sql = String::from("BEGIN TRANSACTION;\n");
        for index in 0..records.len() {
            // writing to a String cannot fail
            let _ = writeln!(
                sql,
                "UPDATE type::thing('{HIGHLIGHTS}', $id{index}) CONTENT $record{index};"
            );
        }
        sql.push_str("COMMIT TRANSACTION;");

        let mut query = self.database.query(sql);
        for (index, record) in records.iter().enumerate() {
            query = query
                .bind((format!("id{index}"), record.video_id.as_str()))
                .bind((format!("record{index}"), record));
        }

        query
            .await
            .context(DatabaseQuerySnafu)?
            .check()
            .context(UpsertRolledBackSnafu {
                count: records.len(),
            })?;

        tracing::info!(count = records.len(), "upserted highlights");
        Ok(records.len())
    }

    #[instrument(skip(self))]
    pub async fn find(&self, video_id: &VideoId) -> Result<Option<HighlightRecord>> {
        self.database
            .select((HIGHLIGHTS, video_id.as_str()))
            .await
            .context(DatabaseQuerySnafu)
    }

    pub async fn count(&self) -> Result<usize> {
        let count: Option<Count> = self
            .sql("SELECT count() FROM highlights GROUP ALL")
            .fetch()
            .await?;

        Ok(count.map_or(0, |count| count.count))
    }

    /// Matching highlights, newest first.
    #[instrument(skip(self))]
    pub async fn recent(&self, filter: &HighlightFilter) -> Result<Vec<HighlightRecord>> {
        self.window(filter, "published_at").await
    }

    /// Matching highlights, most viewed first.
    #[instrument(skip(self))]
    pub async fn most_viewed(&self, filter: &HighlightFilter) -> Result<Vec<HighlightRecord>> {
        self.window(filter, "views").await
    }

    async fn window(
        &self, filter: &HighlightFilter, order_by: &str,
    ) -> Result<Vec<HighlightRecord>> {
        let mut sql = format!(
            "SELECT * FROM {HIGHLIGHTS} WHERE published_at >= $since AND views >= $min_views \
             ORDER BY {order_by} DESC"
        );
        if filter.limit.is_some() {
            sql.push_str(" LIMIT $limit");
        }

        let mut query = self
            .sql(&sql)
            .bind(("since", filter.since))
            .bind(("min_views", filter.min_views));
        if let Some(limit) = filter.limit {
            query = query.bind(("limit", limit));
        }

        query.fetch().await
    }
}
