// File: jukebot-core/tests/test_utils/helpers.rs
//
// In-memory stand-ins for the audio node, catalog providers and the
// notification sink, shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use jukebot_common::models::{
    CatalogArtist, CatalogTrack, ChannelTarget, Credential, EntityKind, LoadResult, Notification,
    PlayableItem, SessionKey, TrackSource, VoiceServerInfo,
};
use jukebot_core::platforms::catalog::CatalogResolver;
use jukebot_core::platforms::lavalink::NodeRegistry;
use jukebot_core::platforms::{AudioNode, CatalogApi, NotificationSink};
use jukebot_core::services::{ResolutionPipeline, SessionManager};
use jukebot_core::Error;

pub fn item(title: &str) -> PlayableItem {
    PlayableItem::new(
        title,
        "Artist",
        185_000,
        TrackSource {
            encoded: format!("enc-{title}"),
            identifier: title.to_string(),
            uri: Some(format!("https://www.youtube.com/watch?v={title}")),
            source_name: "youtube".into(),
        },
    )
}

/// Audio node that answers loads from a table and remembers what plays.
#[derive(Default)]
pub struct FakeAudioNode {
    responses: Mutex<HashMap<String, LoadResult>>,
    loads: Mutex<Vec<String>>,
    current: Mutex<HashMap<SessionKey, PlayableItem>>,
    started: Mutex<Vec<String>>,
}

impl FakeAudioNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, identifier: &str, result: LoadResult) {
        self.responses.lock().insert(identifier.to_string(), result);
    }

    /// Identifiers passed to `load_item`, in order.
    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().clone()
    }

    /// Titles handed to `set_current_item`, in order.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }

    pub fn playing(&self, session: SessionKey) -> Option<String> {
        self.current.lock().get(&session).map(|i| i.title().to_string())
    }
}

#[async_trait]
impl AudioNode for FakeAudioNode {
    async fn load_item(&self, identifier: &str) -> Result<LoadResult, Error> {
        self.loads.lock().push(identifier.to_string());
        Ok(self
            .responses
            .lock()
            .get(identifier)
            .cloned()
            .unwrap_or(LoadResult::NoMatch))
    }

    async fn set_current_item(
        &self,
        session: SessionKey,
        item: Option<PlayableItem>,
    ) -> Result<(), Error> {
        let mut current = self.current.lock();
        match item {
            Some(item) => {
                self.started.lock().push(item.title().to_string());
                current.insert(session, item);
            }
            None => {
                current.remove(&session);
            }
        }
        Ok(())
    }

    async fn current_item(&self, session: SessionKey) -> Result<Option<PlayableItem>, Error> {
        Ok(self.current.lock().get(&session).cloned())
    }

    async fn update_voice(&self, _: SessionKey, _: VoiceServerInfo) -> Result<(), Error> {
        Ok(())
    }

    async fn destroy_player(&self, session: SessionKey) -> Result<(), Error> {
        self.current.lock().remove(&session);
        Ok(())
    }
}

/// Collects every notification it receives.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(ChannelTarget, Notification)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(ChannelTarget, Notification)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, target: ChannelTarget, notification: Notification) -> Result<(), Error> {
        self.sent.lock().push((target, notification));
        Ok(())
    }
}

/// Catalog provider with a fixed track list for every supported entity.
pub struct FakeCatalog {
    pub host: &'static str,
    pub tracks: Vec<CatalogTrack>,
}

impl FakeCatalog {
    pub fn with_tracks(host: &'static str, names: &[(&str, &str)]) -> Self {
        Self {
            host,
            tracks: names
                .iter()
                .map(|(artist, title)| CatalogTrack {
                    title: title.to_string(),
                    artists: vec![CatalogArtist { name: artist.to_string(), primary: true }],
                })
                .collect(),
        }
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn host_marker(&self) -> &'static str {
        self.host
    }

    fn supports(&self, kind: EntityKind) -> bool {
        matches!(kind, EntityKind::Track | EntityKind::Album | EntityKind::Playlist)
    }

    async fn authorize(&self) -> Result<Credential, Error> {
        Ok(Credential::new("token", 3600))
    }

    async fn fetch_tracks(
        &self,
        _kind: EntityKind,
        _entity_id: &str,
        _access_token: &str,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, Error> {
        Ok(self.tracks.iter().take(limit).cloned().collect())
    }
}

pub struct Harness {
    pub node: Arc<FakeAudioNode>,
    pub sink: Arc<RecordingSink>,
    pub nodes: Arc<NodeRegistry>,
    pub pipeline: Arc<ResolutionPipeline>,
    pub sessions: Arc<SessionManager>,
}

/// Wires a session manager onto fakes. Catalogs are refreshed first so
/// they are usable.
pub async fn harness(catalogs: Vec<FakeCatalog>) -> Harness {
    let node = Arc::new(FakeAudioNode::new());
    let sink = Arc::new(RecordingSink::new());
    let nodes = Arc::new(NodeRegistry::new(node.clone()));

    let mut resolvers = Vec::new();
    for catalog in catalogs {
        let resolver = Arc::new(CatalogResolver::new(Arc::new(catalog)));
        resolver.refresh().await.expect("fake catalog authorizes");
        resolvers.push(resolver);
    }

    let pipeline = Arc::new(ResolutionPipeline::new(resolvers, nodes.clone()));
    let sessions = Arc::new(SessionManager::new(pipeline.clone(), nodes.clone(), sink.clone()));
    Harness { node, sink, nodes, pipeline, sessions }
}
