//! Read-only HTTP access to stored highlights, for the dashboard.

use std::net::SocketAddr;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use snafu::{ensure, OptionExt as _, ResultExt as _};
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::database::{Database, HighlightFilter};
use crate::error::{ApplicationError, BindAddressSnafu, WebServerSnafu};
use crate::model::{now, HighlightRecord, VideoId};

pub use error::*;
pub use state::App;

mod error;
mod state;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Longest look-back window the dashboard offers.
pub const MAX_DAYS_BACK: i64 = 30;

/// How many bars the view-count chart shows.
pub const TOP_LIMIT: usize = 20;

pub fn create_router(database: Database) -> Router {
    Router::new()
        .route("/highlights", get(list))
        .route("/highlights/top", get(top))
        .route("/highlights/:video_id", get(show))
        .layer(TraceLayer::new_for_http())
        .with_state(App::new(database))
}

pub async fn serve(address: SocketAddr, database: Database) -> Result<(), ApplicationError> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .context(BindAddressSnafu { address })?;

    tracing::info!(%address, "serving highlights");

    axum::serve(listener, create_router(database))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context(WebServerSnafu)
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowQuery {
    #[serde(default = "default_days_back")]
    pub days_back: i64,
    #[serde(default)]
    pub min_views: u64,
    #[serde(default)]
    pub limit: Option<usize>,
}

fn default_days_back() -> i64 {
    7
}

impl WindowQuery {
    fn filter(&self) -> Result<HighlightFilter> {
        ensure!(
            (1..=MAX_DAYS_BACK).contains(&self.days_back),
            InvalidQuerySnafu {
                message: format!("days_back must be between 1 and {MAX_DAYS_BACK}"),
            }
        );

        Ok(HighlightFilter {
            since: now() - chrono::Duration::days(self.days_back),
            min_views: self.min_views,
            limit: self.limit,
        })
    }
}

#[instrument(skip(app))]
async fn list(
    State(app): State<App>, Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<HighlightRecord>>> {
    let filter = query.filter()?;
    let records = app.database.recent(&filter).await.context(StorageSnafu)?;
    Ok(Json(records))
}

#[instrument(skip(app))]
async fn top(
    State(app): State<App>, Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<HighlightRecord>>> {
    let mut filter = query.filter()?;
    filter.limit = Some(filter.limit.map_or(TOP_LIMIT, |limit| limit.min(TOP_LIMIT)));

    let records = app
        .database
        .most_viewed(&filter)
        .await
        .context(StorageSnafu)?;
    Ok(Json(records))
}

#[instrument(skip(app))]
async fn show(
    State(app): State<App>, Path(video_id): Path<String>,
) -> Result<Json<HighlightRecord>> {
    let id = VideoId::from_url_or_id(&video_id).context(InvalidVideoIdSnafu)?;

    let record = app
        .database
        .find(&id)
        .await
        .context(StorageSnafu)?
        .context(NotFoundSnafu { video_id: id.as_str() })?;

    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;

    use super::*;
    use crate::config::DatabaseConfig;
    use crate::model::Timestamp;

    fn days_ago(days: i64) -> Timestamp {
        now() - chrono::Duration::days(days)
    }

    fn record(id: &str, published_at: Timestamp, views: u64) -> HighlightRecord {
        HighlightRecord::new(
            VideoId::new(id.to_string()),
            format!("{id} highlights"),
            Some("NBA".to_string()),
            published_at,
            views,
        )
    }

    async fn server() -> TestServer {
        let database = Database::connect(&DatabaseConfig::memory()).await.unwrap();
        database
            .upsert(&[
                record("today", days_ago(0), 120),
                record("yesterday", days_ago(1), 4_000),
                record("lastweek", days_ago(6), 10),
                record("lastmonth", days_ago(20), 90_000),
            ])
            .await
            .unwrap();

        TestServer::new(create_router(database)).unwrap()
    }

    fn ids(records: &[HighlightRecord]) -> Vec<&str> {
        records.iter().map(|record| record.video_id.as_str()).collect()
    }

    #[tokio::test]
    async fn list_defaults_to_last_week_newest_first() {
        let server = server().await;

        let response = server.get("/highlights").await;
        response.assert_status_ok();

        let records: Vec<HighlightRecord> = response.json();
        assert_eq!(ids(&records), vec!["today", "yesterday", "lastweek"]);
    }

    #[tokio::test]
    async fn list_applies_window_and_view_threshold() {
        let server = server().await;

        let response = server
            .get("/highlights")
            .add_query_param("days_back", 30)
            .add_query_param("min_views", 100)
            .await;

        let records: Vec<HighlightRecord> = response.json();
        assert_eq!(ids(&records), vec!["today", "yesterday", "lastmonth"]);
    }

    #[tokio::test]
    async fn top_orders_by_views() {
        let server = server().await;

        let response = server
            .get("/highlights/top")
            .add_query_param("days_back", 30)
            .add_query_param("limit", 2)
            .await;

        let records: Vec<HighlightRecord> = response.json();
        assert_eq!(ids(&records), vec!["lastmonth", "yesterday"]);
    }

    #[tokio::test]
    async fn out_of_range_window_is_rejected() {
        let server = server().await;

        for days_back in [0, 31] {
            let response = server
                .get("/highlights")
                .add_query_param("days_back", days_back)
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn show_finds_by_id_or_url() {
        let server = server().await;

        let response = server.get("/highlights/yesterday").await;
        response.assert_status_ok();
        assert_eq!(response.json::<HighlightRecord>().views, 4_000);

        let response = server
            .get("/highlights/https%3A%2F%2Fyoutu.be%2Ftoday")
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<HighlightRecord>().video_id.as_str(), "today");
    }

    #[tokio::test]
    async fn show_reports_missing_and_invalid_ids() {
        let server = server().await;

        server
            .get("/highlights/unknown")
            .await
            .assert_status(StatusCode::NOT_FOUND);

        server
            .get("/highlights/not%20an%20id")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
