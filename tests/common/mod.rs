//! An in-process stand-in for the YouTube Data API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

pub const API_KEY: &str = "test-key";

type Params = HashMap<String, String>;

#[derive(Clone, Default)]
pub struct FakeYouTube {
    searches: Arc<Mutex<HashMap<String, (u16, Value)>>>,
    views: Arc<Mutex<HashMap<String, Option<u64>>>>,
    statistics_status: Arc<Mutex<Option<u16>>>,
    requests: Arc<Mutex<Vec<(&'static str, Params)>>>,
}

impl FakeYouTube {
    /// Search results for `term`, each hit given as `(video_id, published_at)`.
    pub fn found(&self, term: &str, hits: &[(&str, &str)]) -> &Self {
        let items: Vec<Value> = hits
            .iter()
            .map(|(id, published_at)| search_item(id, &format!("{id} | {term}"), published_at))
            .collect();
        self.respond(term, 200, json!({ "kind": "youtube#searchListResponse", "items": items }))
    }

    pub fn respond(&self, term: &str, status: u16, body: Value) -> &Self {
        self.searches
            .lock()
            .unwrap()
            .insert(term.to_string(), (status, body));
        self
    }

    pub fn views(&self, id: &str, views: u64) -> &Self {
        self.views.lock().unwrap().insert(id.to_string(), Some(views));
        self
    }

    /// Known video whose statistics block carries no view count.
    pub fn hidden_views(&self, id: &str) -> &Self {
        self.views.lock().unwrap().insert(id.to_string(), None);
        self
    }

    pub fn fail_statistics(&self, status: u16) -> &Self {
        *self.statistics_status.lock().unwrap() = Some(status);
        self
    }

    pub fn requests(&self, endpoint: &str) -> Vec<Params> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| *name == endpoint)
            .map(|(_, params)| params.clone())
            .collect()
    }

    /// Serves on an ephemeral port and returns the API base url.
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route("/youtube/v3/search", get(search))
            .route("/youtube/v3/videos", get(videos))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        format!("http://{address}/youtube/v3")
    }

    fn record(&self, endpoint: &'static str, params: &Params) {
        self.requests
            .lock()
            .unwrap()
            .push((endpoint, params.clone()));
    }
}

pub fn search_item(id: &str, title: &str, published_at: &str) -> Value {
    json!({
        "kind": "youtube#searchResult",
        "id": { "kind": "youtube#video", "videoId": id },
        "snippet": {
            "publishedAt": published_at,
            "channelId": "UCWJ2lWNubArHWmf3FIHbfcQ",
            "title": title,
            "description": "",
            "channelTitle": "NBA",
            "liveBroadcastContent": "none"
        }
    })
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": { "code": 400, "message": "API key not valid" } })),
    )
}

async fn search(
    State(fake): State<FakeYouTube>, Query(params): Query<Params>,
) -> (StatusCode, Json<Value>) {
    fake.record("search", &params);
    if params.get("key").map(String::as_str) != Some(API_KEY) {
        return unauthorized();
    }

    let term = params.get("q").cloned().unwrap_or_default();
    let reply = fake.searches.lock().unwrap().get(&term).cloned();

    match reply {
        Some((status, body)) => (StatusCode::from_u16(status).unwrap(), Json(body)),
        None => (StatusCode::OK, Json(json!({ "items": [] }))),
    }
}

async fn videos(
    State(fake): State<FakeYouTube>, Query(params): Query<Params>,
) -> (StatusCode, Json<Value>) {
    fake.record("videos", &params);
    if params.get("key").map(String::as_str) != Some(API_KEY) {
        return unauthorized();
    }

    let failure = *fake.statistics_status.lock().unwrap();
    if let Some(status) = failure {
        return (
            StatusCode::from_u16(status).unwrap(),
            Json(json!({ "error": { "code": status, "message": "backend error" } })),
        );
    }

    let views = fake.views.lock().unwrap().clone();
    let items: Vec<Value> = params
        .get("id")
        .map(|ids| ids.split(',').collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|id| {
            let statistics = match views.get(id)? {
                Some(count) => json!({ "viewCount": count.to_string(), "likeCount": "1" }),
                None => json!({ "likeCount": "1" }),
            };
            Some(json!({ "kind": "youtube#video", "id": id, "statistics": statistics }))
        })
        .collect();

    (StatusCode::OK, Json(json!({ "items": items })))
}
