// File: src/platforms/mod.rs
//
// Seams to the external collaborators: the audio node, the catalog
// providers and wherever notifications end up.

use async_trait::async_trait;

use jukebot_common::models::{
    CatalogTrack, ChannelTarget, Credential, EntityKind, LoadResult, Notification, PlayableItem,
    SessionKey, VoiceServerInfo,
};

use crate::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
}

/// A remote node that decodes and streams audio for one or more sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioNode: Send + Sync {
    /// Resolves an identifier (URL or `prefix:query`) into playable items.
    async fn load_item(&self, identifier: &str) -> Result<LoadResult, Error>;

    /// Starts `item` for the session, or stops playback when `None`.
    async fn set_current_item(
        &self,
        session: SessionKey,
        item: Option<PlayableItem>,
    ) -> Result<(), Error>;

    async fn current_item(&self, session: SessionKey) -> Result<Option<PlayableItem>, Error>;

    async fn update_voice(&self, session: SessionKey, voice: VoiceServerInfo) -> Result<(), Error>;

    async fn destroy_player(&self, session: SessionKey) -> Result<(), Error>;
}

/// The narrow slice of a catalog provider's API the resolver needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Short name used in logs and errors, e.g. "spotify".
    fn provider_name(&self) -> &'static str;

    /// Substring that identifies this provider's URLs by host.
    fn host_marker(&self) -> &'static str;

    fn supports(&self, kind: EntityKind) -> bool;

    /// Exchanges client credentials for a fresh access token.
    async fn authorize(&self) -> Result<Credential, Error>;

    async fn fetch_tracks(
        &self,
        kind: EntityKind,
        entity_id: &str,
        access_token: &str,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, Error>;
}

/// Accepts structured notifications for a target channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, target: ChannelTarget, notification: Notification) -> Result<(), Error>;
}

/// Joins and leaves voice channels on the chat platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// Joins `channel_id` self-deafened.
    async fn join(&self, session: SessionKey, channel_id: u64) -> Result<(), Error>;

    async fn leave(&self, session: SessionKey) -> Result<(), Error>;
}

pub mod catalog;
pub mod discord;
pub mod lavalink;
