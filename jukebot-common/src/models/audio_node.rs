// File: jukebot-common/src/models/audio_node.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::session::SessionKey;
use crate::models::track::PlayableItem;

/// Outcome of asking the audio node to load an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadResult {
    SingleItem(PlayableItem),
    PlaylistItems {
        name: String,
        items: Vec<PlayableItem>,
        /// Entry the link pointed at, e.g. `watch?v=X&list=...`.
        selected: Option<usize>,
    },
    SearchResults(Vec<PlayableItem>),
    NoMatch,
    LoadFailure {
        message: String,
    },
}

/// Why the node stopped playing a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackEndReason {
    Finished,
    LoadFailed,
    Stopped,
    Replaced,
    Cleanup,
}

impl TrackEndReason {
    /// Whether the scheduler is allowed to start the next item on its own.
    pub fn may_start_next(&self) -> bool {
        matches!(self, TrackEndReason::Finished | TrackEndReason::LoadFailed)
    }
}

impl fmt::Display for TrackEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackEndReason::Finished => write!(f, "finished"),
            TrackEndReason::LoadFailed => write!(f, "loadFailed"),
            TrackEndReason::Stopped => write!(f, "stopped"),
            TrackEndReason::Replaced => write!(f, "replaced"),
            TrackEndReason::Cleanup => write!(f, "cleanup"),
        }
    }
}

impl FromStr for TrackEndReason {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "finished" => Ok(TrackEndReason::Finished),
            "loadfailed" | "load_failed" => Ok(TrackEndReason::LoadFailed),
            "stopped" => Ok(TrackEndReason::Stopped),
            "replaced" => Ok(TrackEndReason::Replaced),
            "cleanup" => Ok(TrackEndReason::Cleanup),
            _ => Err(format!("Unknown track end reason: {}", s)),
        }
    }
}

/// Voice connection details the node needs to join a voice channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceServerInfo {
    pub token: String,
    pub endpoint: String,
    pub session_id: String,
}

/// Lifecycle events emitted by an audio node.
#[derive(Debug, Clone)]
pub enum NodeEvent {
    Ready {
        session_id: String,
        resumed: bool,
    },
    TrackStart {
        session: SessionKey,
        identifier: String,
    },
    TrackEnd {
        session: SessionKey,
        reason: TrackEndReason,
    },
    TrackException {
        session: SessionKey,
        message: String,
    },
    TrackStuck {
        session: SessionKey,
        threshold_ms: u64,
    },
    WebSocketClosed {
        session: SessionKey,
        code: u16,
        reason: String,
    },
}

impl NodeEvent {
    pub fn session(&self) -> Option<SessionKey> {
        match self {
            NodeEvent::Ready { .. } => None,
            NodeEvent::TrackStart { session, .. }
            | NodeEvent::TrackEnd { session, .. }
            | NodeEvent::TrackException { session, .. }
            | NodeEvent::TrackStuck { session, .. }
            | NodeEvent::WebSocketClosed { session, .. } => Some(*session),
        }
    }
}
