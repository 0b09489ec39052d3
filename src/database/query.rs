use derive_new::new;
use serde::de::DeserializeOwned;
use snafu::ResultExt as _;
use surrealdb::opt::QueryResult;

use super::{DatabaseDeserializeSnafu, DatabaseQuerySnafu, Result};

/// A pending query. Parameters can be bound using [Query::bind] which takes any serializable
/// data structure.
///
/// # Example
/// ```rust,ignore
/// let recent: Vec<HighlightRecord> = database
///     .sql("SELECT * FROM highlights WHERE published_at >= $since")
///     .bind(("since", since))
///     .fetch()
///     .await?;
/// ```
#[derive(Debug, new)]
pub struct Query<'a> {
    query: surrealdb::method::Query<'a, surrealdb::engine::any::Any>,
}

impl Query<'_> {
    pub fn bind(mut self, params: impl serde::Serialize) -> Self {
        let query = self.query;
        self.query = query.bind(params);
        self
    }

    /// Execute the query and fail if any statement failed.
    pub async fn execute(self) -> Result<surrealdb::Response> {
        let response = self.query.await.context(DatabaseQuerySnafu)?;
        let response = response.check().context(DatabaseQuerySnafu)?;
        tracing::trace!(?response, "executed query");
        Ok(response)
    }

    /// Execute the query and deserialize the result of the first statement.
    ///
    /// The result can be either a single value (`Option<T>`) or a collection of values (`Vec<T>`).
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<T>
    where
        usize: QueryResult<T>,
    {
        let mut response = self.execute().await?;
        response.take::<T>(0).context(DatabaseDeserializeSnafu)
    }
}
