mod common;

use std::time::Duration;

use serde_json::json;

use common::{FakeYouTube, API_KEY};
use highlights::config::{ApiKey, YouTubeConfig};
use highlights::model::VideoId;
use highlights::statistics::StatisticsResolver;
use highlights::youtube::{VideoPlatform, YouTube, YouTubeError};

fn client(endpoint: String) -> YouTube {
    YouTube::connect(&YouTubeConfig {
        api_key: Some(ApiKey::new(API_KEY)),
        endpoint,
        results_per_page: 25,
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn ids(ids: &[&str]) -> Vec<VideoId> {
    ids.iter().map(|id| VideoId::new(id.to_string())).collect()
}

#[tokio::test]
async fn search_requests_newest_videos_for_the_term() {
    let fake = FakeYouTube::default();
    fake.found(
        "nba highlights",
        &[
            ("vid_A1", "2024-04-02T03:04:05Z"),
            ("vid-B2", "2024-04-01T00:00:00Z"),
        ],
    );
    let youtube = client(fake.start().await);

    let videos = youtube.search("nba highlights").await.unwrap();

    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].video_id.as_str(), "vid_A1");
    assert_eq!(videos[0].title, "vid_A1 | nba highlights");
    assert_eq!(videos[0].channel_title.as_deref(), Some("NBA"));
    assert_eq!(videos[0].published_at.to_string(), "2024-04-02T03:04:05Z");

    let requests = fake.requests("search");
    assert_eq!(requests.len(), 1);
    let params = &requests[0];
    assert_eq!(params["q"], "nba highlights");
    assert_eq!(params["type"], "video");
    assert_eq!(params["order"], "date");
    assert_eq!(params["part"], "snippet");
    assert_eq!(params["maxResults"], "25");
    assert_eq!(params["key"], API_KEY);
}

#[tokio::test]
async fn quota_errors_are_recoverable() {
    let fake = FakeYouTube::default();
    fake.respond(
        "lakers",
        403,
        json!({ "error": { "code": 403, "message": "The request cannot be completed because you have exceeded your quota." } }),
    );
    let youtube = client(fake.start().await);

    let error = youtube.search("lakers").await.unwrap_err();

    assert!(error.is_recoverable());
    match error {
        YouTubeError::Api {
            status, message, ..
        } => {
            assert_eq!(status, 403);
            assert!(message.contains("exceeded your quota"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_api_is_recoverable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let youtube = client(format!("http://{address}/youtube/v3"));
    let error = youtube.search("celtics").await.unwrap_err();

    assert!(matches!(error, YouTubeError::Request { .. }));
    assert!(error.is_recoverable());
    assert!(!error.to_string().contains(API_KEY));
}

#[tokio::test]
async fn unexpected_timestamp_format_is_a_hard_error() {
    let fake = FakeYouTube::default();
    fake.found("knicks", &[("vid1", "2024-04-02T03:04:05.250Z")]);
    let youtube = client(fake.start().await);

    let error = youtube.search("knicks").await.unwrap_err();

    assert!(matches!(error, YouTubeError::InvalidTimestamp { .. }));
    assert!(!error.is_recoverable());
}

#[tokio::test]
async fn malformed_body_is_a_hard_error() {
    let fake = FakeYouTube::default();
    fake.respond("bulls", 200, json!({ "items": [{ "id": "not-an-object" }] }));
    let youtube = client(fake.start().await);

    let error = youtube.search("bulls").await.unwrap_err();

    assert!(matches!(error, YouTubeError::MalformedBody { .. }));
    assert!(!error.is_recoverable());
}

#[tokio::test]
async fn view_counts_parse_counts_and_omit_unknown_ids() {
    let fake = FakeYouTube::default();
    fake.views("a1", 1_500).hidden_views("b2");
    let youtube = client(fake.start().await);

    let counts = youtube.view_counts(&ids(&["a1", "b2", "c3"])).await.unwrap();

    assert_eq!(counts.len(), 2);
    assert_eq!(counts[&VideoId::new("a1".to_string())], 1_500);
    assert_eq!(counts[&VideoId::new("b2".to_string())], 0);

    let requests = fake.requests("videos");
    assert_eq!(requests[0]["id"], "a1,b2,c3");
    assert_eq!(requests[0]["part"], "statistics");
}

#[tokio::test]
async fn resolver_splits_large_lookups_into_batches_of_fifty() {
    let fake = FakeYouTube::default();
    let all: Vec<String> = (0..120).map(|n| format!("video{n}")).collect();
    for (n, id) in all.iter().enumerate() {
        fake.views(id, n as u64);
    }
    let youtube = client(fake.start().await);
    let input: Vec<VideoId> = all.iter().map(|id| VideoId::new(id.clone())).collect();

    let statistics = StatisticsResolver::new(&youtube)
        .fetch_statistics(&input)
        .await
        .unwrap();

    assert_eq!(statistics.len(), 120);
    assert_eq!(statistics[&input[119]], 119);

    let batch_sizes: Vec<usize> = fake
        .requests("videos")
        .iter()
        .map(|params| params["id"].split(',').count())
        .collect();
    assert_eq!(batch_sizes, vec![50, 50, 20]);
}
