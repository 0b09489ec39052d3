use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone as _, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::ops::Sub;

/// The only timestamp layout the search API emits.
pub const YOUTUBE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn now() -> Timestamp {
    Timestamp(Utc::now())
}

/// A UTC instant, persisted as a fixed-width `YYYY-MM-DDTHH:MM:SSZ` string so that
/// stored values order the same way the instants do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, new)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Parses the exact layout used by the search API. Anything else is an error.
    pub fn parse_youtube(text: &str) -> Result<Timestamp, chrono::ParseError> {
        let naive = NaiveDateTime::parse_from_str(text, YOUTUBE_TIMESTAMP_FORMAT)?;
        Ok(Timestamp(Utc.from_utc_datetime(&naive)))
    }

    pub fn to_storage(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_storage())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_storage().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom)
    }
}

impl Sub<chrono::Duration> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: chrono::Duration) -> Self::Output {
        Timestamp(self.0 - rhs)
    }
}
