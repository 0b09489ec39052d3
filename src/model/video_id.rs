use derive_new::new;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt as _, Snafu};

/// An opaque video identifier as issued by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, new)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accepts either a bare id or a watch url (`youtube.com/watch?v=…`, `youtu.be/…`).
    pub fn from_url_or_id(text: &str) -> Result<VideoId, ParseVideoId> {
        // if text is not a url, treat it as the id itself
        let Ok(url) = url::Url::parse(text) else {
            return text.parse();
        };

        match url.host_str() {
            Some("youtu.be") => url
                .path_segments()
                .and_then(|mut segments| segments.next())
                .filter(|segment| !segment.is_empty())
                .context(MissingIdFragmentSnafu { text })?
                .parse(),
            Some("www.youtube.com" | "youtube.com" | "m.youtube.com") => url
                .query_pairs()
                .find_map(|(key, value)| (key == "v").then_some(value))
                .context(MissingIdFragmentSnafu { text })?
                .parse(),
            _ => ExpectYouTubeUrlSnafu { text }.fail(),
        }
    }
}

impl std::str::FromStr for VideoId {
    type Err = ParseVideoId;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let valid = !input.is_empty()
            && input
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !valid {
            return InvalidCharactersSnafu { text: input }.fail();
        }

        Ok(VideoId(input.to_string()))
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Snafu, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum ParseVideoId {
    /// text is a valid url, but it's missing the id fragment
    #[snafu(display("`{text}` does not contain a video id"))]
    MissingIdFragment { text: String },

    /// text is a url, but it doesn't point to youtube
    #[snafu(display("`{text}` is not a youtube url"))]
    ExpectYouTubeUrl { text: String },

    #[snafu(display("`{text}` is not a valid video id"))]
    InvalidCharacters { text: String },
}
