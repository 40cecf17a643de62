// File: jukebot-common/src/models/catalog.rs

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The shape of entity a catalog URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Track,
    Album,
    Playlist,
    Artist,
    Mix,
    Video,
}

impl EntityKind {
    /// Classifies a catalog URL by its path. Anything without a known
    /// collection marker is a single track.
    pub fn from_url(url: &str) -> Self {
        if url.contains("/artist/") {
            EntityKind::Artist
        } else if url.contains("/album/") {
            EntityKind::Album
        } else if url.contains("/mix/") {
            EntityKind::Mix
        } else if url.contains("/playlist/") {
            EntityKind::Playlist
        } else if url.contains("/video/") {
            EntityKind::Video
        } else {
            EntityKind::Track
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Track => "track",
            EntityKind::Album => "album",
            EntityKind::Playlist => "playlist",
            EntityKind::Artist => "artist",
            EntityKind::Mix => "mix",
            EntityKind::Video => "video",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogArtist {
    pub name: String,
    /// Flagged by the provider as the main/primary artist.
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTrack {
    pub title: String,
    pub artists: Vec<CatalogArtist>,
}

impl CatalogTrack {
    /// First artist flagged as primary, else the first listed.
    pub fn primary_artist(&self) -> Option<&CatalogArtist> {
        self.artists
            .iter()
            .find(|a| a.primary)
            .or_else(|| self.artists.first())
    }

    /// `"{artist} - {title}"`, or just the title when no artist is known.
    pub fn qualified_name(&self) -> String {
        match self.primary_artist() {
            Some(artist) => format!("{} - {}", artist.name, self.title),
            None => self.title.clone(),
        }
    }
}

/// An access token issued by a catalog provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub expires_in_secs: i64,
    pub issued_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, expires_in_secs: i64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in_secs,
            issued_at: Utc::now(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(self.expires_in_secs)
    }
}
