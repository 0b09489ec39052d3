use snafu::Snafu;

pub type Result<T, E = YouTubeError> = ::std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum YouTubeError {
    #[snafu(display("no API key configured, set YOUTUBE_API_KEY"))]
    MissingApiKey,

    #[snafu(display("could not build the HTTP client: {source}"))]
    BuildClient { source: reqwest::Error },

    #[snafu(display("request to `{endpoint}` failed: {source}"))]
    Request {
        endpoint: &'static str,
        source: reqwest::Error,
    },

    #[snafu(display("API returned {status} from `{endpoint}`: {message}"))]
    Api {
        endpoint: &'static str,
        status: u16,
        message: String,
    },

    #[snafu(display("malformed response from `{endpoint}`: {source}"))]
    MalformedBody {
        endpoint: &'static str,
        source: serde_json::Error,
    },

    #[snafu(display("video `{video_id}` has an unexpected publish timestamp `{text}`: {source}"))]
    InvalidTimestamp {
        video_id: String,
        text: String,
        source: chrono::ParseError,
    },

    #[snafu(display("search result carries an invalid video id `{text}`"))]
    InvalidVideoId { text: String },
}

impl YouTubeError {
    /// Rate limits, HTTP status errors, timeouts and dropped connections are worth skipping
    /// past or retrying. A response we cannot understand means the API contract changed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, YouTubeError::Api { .. } | YouTubeError::Request { .. })
    }
}
