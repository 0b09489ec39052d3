use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use snafu::ResultExt;

use crate::error::{ApplicationError, ConfigLoadSnafu};

/// The upstream search endpoint refuses page sizes above this.
pub const MAX_RESULTS_PER_PAGE: u32 = 50;

/// Settings read once from the environment at process start.
///
/// Variable names are the upper-cased field names, e.g. `YOUTUBE_API_KEY`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub youtube_api_key: Option<ApiKey>,
    #[serde(default = "default_youtube_api_url")]
    pub youtube_api_url: String,
    #[serde(default = "default_results_per_page")]
    pub results_per_page: u32,
    #[serde(default = "default_request_timeout", deserialize_with = "human_duration")]
    pub request_timeout: Duration,
    #[serde(default)]
    pub statistics_retries: usize,
    #[serde(default = "default_search_concurrency")]
    pub search_concurrency: usize,
    #[serde(default = "default_keywords_path")]
    pub keywords_path: PathBuf,

    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_namespace")]
    pub database_namespace: String,
    #[serde(default = "default_database_name")]
    pub database_name: String,
    #[serde(default)]
    pub database_username: Option<String>,
    #[serde(default)]
    pub database_password: Option<String>,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_host_address")]
    pub host_address: SocketAddr,
    #[serde(default = "default_ingest_interval", deserialize_with = "human_duration")]
    pub ingest_interval: Duration,
}

pub fn load() -> Result<Config, ApplicationError> {
    envy::from_env::<Config>().context(ConfigLoadSnafu)
}

impl Config {
    pub fn youtube(&self) -> YouTubeConfig {
        YouTubeConfig {
            api_key: self.youtube_api_key.clone(),
            endpoint: self.youtube_api_url.clone(),
            results_per_page: self.results_per_page.clamp(1, MAX_RESULTS_PER_PAGE),
            timeout: self.request_timeout,
        }
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database_url.clone(),
            namespace: self.database_namespace.clone(),
            database: self.database_name.clone(),
            username: self.database_username.clone(),
            password: self.database_password.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            youtube_api_url: default_youtube_api_url(),
            results_per_page: default_results_per_page(),
            request_timeout: default_request_timeout(),
            statistics_retries: 0,
            search_concurrency: default_search_concurrency(),
            keywords_path: default_keywords_path(),
            database_url: default_database_url(),
            database_namespace: default_database_namespace(),
            database_name: default_database_name(),
            database_username: None,
            database_password: None,
            log_dir: default_log_dir(),
            host_address: default_host_address(),
            ingest_interval: default_ingest_interval(),
        }
    }
}

/// An API credential that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub api_key: Option<ApiKey>,
    pub endpoint: String,
    pub results_per_page: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl DatabaseConfig {
    /// A throwaway in-process database.
    pub fn memory() -> Self {
        Self {
            url: "mem://".to_string(),
            namespace: default_database_namespace(),
            database: default_database_name(),
            username: None,
            password: None,
        }
    }
}

fn human_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}

fn default_youtube_api_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_results_per_page() -> u32 {
    25
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_search_concurrency() -> usize {
    1
}

fn default_keywords_path() -> PathBuf {
    PathBuf::from("seeds/keywords.json")
}

fn default_database_url() -> String {
    "ws://localhost:8000".to_string()
}

fn default_database_namespace() -> String {
    "highlights".to_string()
}

fn default_database_name() -> String {
    "highlights".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_host_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_ingest_interval() -> Duration {
    Duration::from_secs(60 * 60)
}
