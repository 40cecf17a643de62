// File: src/services/session_manager.rs

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, warn};

use jukebot_common::models::{NodeEvent, SessionKey};

use crate::platforms::lavalink::NodeRegistry;
use crate::platforms::NotificationSink;
use crate::services::resolver::ResolutionPipeline;
use crate::services::scheduler::PlaybackScheduler;
use crate::Error;

/// Owns one scheduler per session and routes node events to it.
pub struct SessionManager {
    sessions: DashMap<SessionKey, Arc<PlaybackScheduler>>,
    pipeline: Arc<ResolutionPipeline>,
    nodes: Arc<NodeRegistry>,
    sink: Arc<dyn NotificationSink>,
}

impl SessionManager {
    pub fn new(
        pipeline: Arc<ResolutionPipeline>,
        nodes: Arc<NodeRegistry>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            pipeline,
            nodes,
            sink,
        }
    }

    /// The session's scheduler, created on first use.
    pub fn scheduler(&self, session: SessionKey) -> Arc<PlaybackScheduler> {
        self.sessions
            .entry(session)
            .or_insert_with(|| {
                debug!("(SessionManager) new session {}", session);
                Arc::new(PlaybackScheduler::new(
                    session,
                    self.pipeline.clone(),
                    self.nodes.clone(),
                    self.sink.clone(),
                ))
            })
            .value()
            .clone()
    }

    pub fn get(&self, session: SessionKey) -> Option<Arc<PlaybackScheduler>> {
        self.sessions.get(&session).map(|s| s.value().clone())
    }

    pub fn active_sessions(&self) -> Vec<SessionKey> {
        self.sessions.iter().map(|e| *e.key()).collect()
    }

    pub fn nodes(&self) -> &Arc<NodeRegistry> {
        &self.nodes
    }

    /// Destroys and forgets a session. The node's player is torn down too.
    pub async fn remove(&self, session: SessionKey) {
        let Some((_, scheduler)) = self.sessions.remove(&session) else {
            return;
        };
        scheduler.destroy().await;
        if let Err(e) = self.nodes.node_for(session).destroy_player(session).await {
            warn!("(SessionManager) could not destroy player for {}: {}", session, e);
        }
        self.nodes.release(session);
        info!("(SessionManager) session {} removed", session);
    }

    pub async fn handle_node_event(&self, event: NodeEvent) -> Result<(), Error> {
        match event {
            NodeEvent::TrackEnd { session, reason } => match self.get(session) {
                Some(scheduler) => scheduler.on_track_end(reason).await,
                None => {
                    debug!("(SessionManager) track end for unknown session {}", session);
                    Ok(())
                }
            },
            NodeEvent::TrackStart { session, identifier } => {
                debug!("(SessionManager) {} started '{}'", session, identifier);
                Ok(())
            }
            NodeEvent::TrackException { session, message } => {
                warn!("(SessionManager) {} track exception: {}", session, message);
                Ok(())
            }
            NodeEvent::TrackStuck { session, threshold_ms } => {
                warn!(
                    "(SessionManager) {} track stuck for {}ms",
                    session, threshold_ms
                );
                Ok(())
            }
            NodeEvent::WebSocketClosed { session, code, reason } => {
                warn!(
                    "(SessionManager) {} voice socket closed ({}): {}",
                    session, code, reason
                );
                Ok(())
            }
            NodeEvent::Ready { resumed, .. } => {
                info!("(SessionManager) audio node ready (resumed={})", resumed);
                Ok(())
            }
        }
    }
}
