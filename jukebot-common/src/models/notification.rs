// File: jukebot-common/src/models/notification.rs

use crate::models::track::PlayableItem;

/// Queue sizes at the moment a notification is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueSummary {
    pub queue_size: usize,
    pub playlist_size: usize,
}

impl QueueSummary {
    pub fn has_playlist(&self) -> bool {
        self.playlist_size > 0
    }

    /// One-line description of what is waiting after the current song.
    pub fn describe(&self) -> String {
        if self.has_playlist() && self.queue_size == 0 {
            format!(
                "Playlist with {} song(s) in Q after current song",
                self.playlist_size
            )
        } else if self.has_playlist() {
            format!(
                "Q'd playlist will be destroyed after current song, {} song(s) in normal Q",
                self.queue_size
            )
        } else {
            format!("{} song(s) in Q after current song", self.queue_size)
        }
    }
}

/// Which container a shuffle actually permuted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShuffleTarget {
    Playlist,
    Queue,
    Nothing,
}

/// Structured content handed to a notification sink. Rendering is the
/// sink's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    NowPlaying {
        item: PlayableItem,
        summary: QueueSummary,
    },
    QueueEmpty,
    SongAdded {
        item: PlayableItem,
        summary: QueueSummary,
    },
    SongSkipped {
        next: Option<PlayableItem>,
    },
    QueueShuffled,
    Stopped,
    Error {
        message: String,
    },
}

impl Notification {
    pub fn title(&self) -> &'static str {
        match self {
            Notification::NowPlaying { .. } => "NOW PLAYING",
            Notification::QueueEmpty => "Q EMPTY",
            Notification::SongAdded { .. } => "SONG ADDED",
            Notification::SongSkipped { .. } => "SONG SKIPPED",
            Notification::QueueShuffled => "Q SHUFFLED",
            Notification::Stopped => "STOPPED",
            Notification::Error { .. } => "ERROR",
        }
    }
}
