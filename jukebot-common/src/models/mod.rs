// File: jukebot-common/src/models/mod.rs
pub mod track;
pub mod audio_node;
pub mod catalog;
pub mod notification;
pub mod session;

pub use track::{format_duration, PlayableItem, TrackSource};
pub use audio_node::{LoadResult, NodeEvent, TrackEndReason, VoiceServerInfo};
pub use catalog::{CatalogArtist, CatalogTrack, Credential, EntityKind};
pub use notification::{Notification, QueueSummary, ShuffleTarget};
pub use session::{ChannelTarget, SessionKey};

/// Upper bound on how many items a playlist buffer (or catalog fetch) holds.
pub const PLAYLIST_MAX_SIZE: usize = 100;
