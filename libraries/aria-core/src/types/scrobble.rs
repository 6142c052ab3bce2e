/// Listening-history report types
use crate::types::TrackId;
use serde::{Deserialize, Serialize};

/// Lifecycle stage being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScrobbleType {
    /// Track started and passed the now-playing threshold
    #[serde(rename = "nowPlaying")]
    NowPlaying,

    /// Track passed the completion threshold
    #[serde(rename = "played")]
    Played,
}

impl ScrobbleType {
    /// Wire name of the report type
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrobbleType::NowPlaying => "nowPlaying",
            ScrobbleType::Played => "played",
        }
    }
}

/// Outbound scrobble report
///
/// Fire-and-forget: the sender never retries a rejected report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrobbleReport {
    /// Reported track
    pub song_id: TrackId,

    /// Logical player identifier
    pub player_name: String,

    /// Unix timestamp in milliseconds
    pub timestamp: i64,

    /// Report type
    pub scrobble_type: ScrobbleType,

    /// Elapsed playback in milliseconds
    pub played_duration: u64,
}
