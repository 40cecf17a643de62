// File: src/platforms/lavalink/registry.rs

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use jukebot_common::models::SessionKey;

use crate::platforms::AudioNode;

/// Maps sessions to audio nodes. Sessions without an explicit assignment
/// use the default node.
pub struct NodeRegistry {
    default: Arc<dyn AudioNode>,
    assigned: DashMap<SessionKey, Arc<dyn AudioNode>>,
}

impl NodeRegistry {
    pub fn new(default: Arc<dyn AudioNode>) -> Self {
        Self {
            default,
            assigned: DashMap::new(),
        }
    }

    pub fn assign(&self, session: SessionKey, node: Arc<dyn AudioNode>) {
        debug!("(NodeRegistry) pinning session {} to a dedicated node", session);
        self.assigned.insert(session, node);
    }

    pub fn node_for(&self, session: SessionKey) -> Arc<dyn AudioNode> {
        self.assigned
            .get(&session)
            .map(|n| n.value().clone())
            .unwrap_or_else(|| self.default.clone())
    }

    pub fn release(&self, session: SessionKey) {
        self.assigned.remove(&session);
    }

    pub fn default_node(&self) -> Arc<dyn AudioNode> {
        self.default.clone()
    }
}
