// File: jukebot-common/src/models/track.rs

use serde::{Deserialize, Serialize};

/// Opaque handle the audio node needs to play an item again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSource {
    /// Node-specific encoded track blob.
    pub encoded: String,
    pub identifier: String,
    pub uri: Option<String>,
    /// e.g. "youtube", "soundcloud", "http"
    pub source_name: String,
}

/// A resolved, ready-to-stream audio item. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayableItem {
    title: String,
    artist: String,
    duration_millis: u64,
    source: TrackSource,
}

impl PlayableItem {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        duration_millis: u64,
        source: TrackSource,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            duration_millis,
            source,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn duration_millis(&self) -> u64 {
        self.duration_millis
    }

    pub fn source(&self) -> &TrackSource {
        &self.source
    }

    /// `"{artist} - {title}"`
    pub fn qualified_name(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }

    pub fn formatted_duration(&self) -> String {
        format_duration(self.duration_millis as i64)
    }
}

/// Formats milliseconds as e.g. `2min3s`. Zero or negative durations
/// render as `<n/a>`.
pub fn format_duration(duration_ms: i64) -> String {
    if duration_ms <= 0 {
        return "<n/a>".to_string();
    }

    let total_secs = duration_ms / 1000;
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;

    let mut out = String::new();
    if minutes > 0 {
        out.push_str(&format!("{minutes}min"));
    }
    if seconds > 0 {
        out.push_str(&format!("{seconds}s"));
    }

    if out.is_empty() {
        "<n/a>".to_string()
    } else {
        out
    }
}
