// File: src/platforms/lavalink/client.rs
//
// REST half of the Lavalink node: loading tracks and driving players.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::json;
use tracing::{debug, info, trace};

use jukebot_common::models::{LoadResult, PlayableItem, SessionKey, VoiceServerInfo};

use crate::http::{Headers, HttpClient};
use crate::platforms::AudioNode;
use crate::Error;

use super::model::{LoadTracksResponse, PlayerResponse};

pub struct LavalinkNode {
    http: Arc<dyn HttpClient>,
    base_uri: String,
    password: String,
    /// Assigned by the node in its `ready` op.
    session_id: RwLock<Option<String>>,
}

impl LavalinkNode {
    pub fn new(http: Arc<dyn HttpClient>, base_uri: &str, password: impl Into<String>) -> Self {
        Self {
            http,
            base_uri: base_uri.trim_end_matches('/').to_string(),
            password: password.into(),
            session_id: RwLock::new(None),
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn set_session_id(&self, session_id: Option<String>) {
        info!("(LavalinkNode) session id is now {:?}", session_id);
        *self.session_id.write() = session_id;
    }

    pub fn session_id(&self) -> Option<String> {
        self.session_id.read().clone()
    }

    fn headers(&self) -> Headers {
        HashMap::from([("Authorization".to_string(), self.password.clone())])
    }

    fn player_url(&self, session: SessionKey) -> Result<String, Error> {
        let sid = self
            .session_id()
            .ok_or_else(|| Error::Platform("Lavalink session is not ready yet".into()))?;
        Ok(format!("{}/v4/sessions/{}/players/{}", self.base_uri, sid, session))
    }

    async fn patch_player(&self, session: SessionKey, body: serde_json::Value) -> Result<(), Error> {
        let url = self.player_url(session)?;
        trace!("(LavalinkNode) PATCH {} {}", url, body);
        self.http.patch_json(url, body, self.headers()).await?;
        Ok(())
    }
}

#[async_trait]
impl AudioNode for LavalinkNode {
    async fn load_item(&self, identifier: &str) -> Result<LoadResult, Error> {
        let url = format!(
            "{}/v4/loadtracks?identifier={}",
            self.base_uri,
            urlencoding::encode(identifier)
        );
        let body = self.http.get(url, self.headers()).await?;
        let resp: LoadTracksResponse = serde_json::from_str(&body)?;
        debug!("(LavalinkNode) '{}' => loadType={}", identifier, resp.load_type);
        resp.into_load_result()
    }

    async fn set_current_item(
        &self,
        session: SessionKey,
        item: Option<PlayableItem>,
    ) -> Result<(), Error> {
        let encoded = item.as_ref().map(|i| i.source().encoded.clone());
        self.patch_player(
            session,
            json!({ "track": { "encoded": encoded }, "paused": false }),
        )
        .await
    }

    async fn current_item(&self, session: SessionKey) -> Result<Option<PlayableItem>, Error> {
        let url = self.player_url(session)?;
        match self.http.get(url, self.headers()).await {
            Ok(body) => {
                let player: PlayerResponse = serde_json::from_str(&body)?;
                Ok(player.track.map(Into::into))
            }
            // No player yet means nothing is playing.
            Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update_voice(&self, session: SessionKey, voice: VoiceServerInfo) -> Result<(), Error> {
        self.patch_player(session, json!({ "voice": voice })).await
    }

    async fn destroy_player(&self, session: SessionKey) -> Result<(), Error> {
        let url = self.player_url(session)?;
        match self.http.delete(url, self.headers()).await {
            Ok(_) | Err(Error::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
