use snafu::ResultExt as _;
use tracing::instrument;

use super::{Database, DefineSchemaSnafu, Result};

pub const HIGHLIGHTS: &str = "highlights";

// Redefining is a no-op when nothing changed, so this runs on every connect.
const DEFINITIONS: &str = r#"
DEFINE TABLE highlights SCHEMAFULL;
DEFINE FIELD video_id ON TABLE highlights TYPE string ASSERT string::len($value) > 0;
DEFINE FIELD title ON TABLE highlights TYPE string;
DEFINE FIELD channel_title ON TABLE highlights TYPE option<string>;
DEFINE FIELD published_at ON TABLE highlights TYPE string;
DEFINE FIELD views ON TABLE highlights TYPE number ASSERT $value >= 0;
DEFINE INDEX highlights_video_id ON TABLE highlights COLUMNS video_id UNIQUE;
"#;

impl Database {
    #[instrument(skip(self))]
    pub async fn define_schema(&self) -> Result<()> {
        self.database
            .query(DEFINITIONS)
            .await
            .and_then(|response| response.check())
            .context(DefineSchemaSnafu)?;

        tracing::debug!(table = HIGHLIGHTS, "schema is in place");
        Ok(())
    }
}
