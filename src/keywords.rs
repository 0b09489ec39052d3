use std::path::{Path, PathBuf};

use snafu::{ensure, ResultExt, Snafu};
use tracing::instrument;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum KeywordError {
    #[snafu(display("cannot read keyword list `{}`: {source}", path.display()))]
    ReadKeywords {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("keyword list `{}` is not a JSON array of strings: {source}", path.display()))]
    MalformedKeywords {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[snafu(display("keyword list `{}` contains a blank phrase at position {index}", path.display()))]
    BlankKeyword { path: PathBuf, index: usize },
}

/// Reads the ordered list of search phrases. The order is significant: earlier phrases win
/// when several surface the same video.
#[instrument]
pub fn load(path: &Path) -> Result<Vec<String>, KeywordError> {
    let text = std::fs::read_to_string(path).context(ReadKeywordsSnafu { path })?;
    let keywords: Vec<String> =
        serde_json::from_str(&text).context(MalformedKeywordsSnafu { path })?;

    for (index, keyword) in keywords.iter().enumerate() {
        ensure!(!keyword.trim().is_empty(), BlankKeywordSnafu { path, index });
    }

    tracing::debug!(count = keywords.len(), "loaded keyword list");
    Ok(keywords)
}
