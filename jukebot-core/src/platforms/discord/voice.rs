// File: src/platforms/discord/voice.rs
//
// Voice plumbing: gateway voice-state commands to join/leave, and the
// hand-off of Discord's voice credentials to the audio node.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info, warn};
use twilight_gateway::MessageSender;
use twilight_model::gateway::payload::outgoing::UpdateVoiceState;
use twilight_model::id::marker::{ChannelMarker, GuildMarker};
use twilight_model::id::Id;

use jukebot_common::models::{SessionKey, VoiceServerInfo};

use crate::platforms::lavalink::NodeRegistry;
use crate::platforms::VoiceGateway;
use crate::Error;

/// Which shard owns a guild's gateway traffic.
pub fn shard_for_guild(guild_id: u64, shard_count: usize) -> usize {
    if shard_count == 0 {
        return 0;
    }
    ((guild_id >> 22) % shard_count as u64) as usize
}

/// True when someone left the channel the bot sits in and only bots
/// remain there.
pub fn should_auto_leave(
    bot_channel: Option<u64>,
    left_channel: Option<u64>,
    occupant_is_bot: &[bool],
) -> bool {
    match (bot_channel, left_channel) {
        (Some(bot), Some(left)) if bot == left => occupant_is_bot.iter().all(|b| *b),
        _ => false,
    }
}

/// Sends voice-state updates through the shard that owns the guild.
#[derive(Default)]
pub struct DiscordVoice {
    senders: RwLock<Vec<MessageSender>>,
}

impl DiscordVoice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_senders(&self, senders: Vec<MessageSender>) {
        *self.senders.write() = senders;
    }

    fn update(&self, session: SessionKey, channel: Option<u64>) -> Result<(), Error> {
        let guild_id: Id<GuildMarker> = Id::new_checked(session.0)
            .ok_or_else(|| Error::Platform(format!("invalid guild id {session}")))?;
        let channel_id: Option<Id<ChannelMarker>> = match channel {
            Some(c) => Some(
                Id::new_checked(c)
                    .ok_or_else(|| Error::Platform(format!("invalid channel id {c}")))?,
            ),
            None => None,
        };

        let senders = self.senders.read();
        let sender = senders
            .get(shard_for_guild(session.0, senders.len()))
            .ok_or_else(|| Error::Platform("no gateway shard connected".into()))?;
        sender
            .command(&UpdateVoiceState::new(guild_id, channel_id, true, false))
            .map_err(|e| Error::Platform(format!("voice state update failed: {e}")))
    }
}

#[async_trait]
impl VoiceGateway for DiscordVoice {
    async fn join(&self, session: SessionKey, channel_id: u64) -> Result<(), Error> {
        info!("(DiscordVoice) joining channel {} in {}", channel_id, session);
        self.update(session, Some(channel_id))
    }

    async fn leave(&self, session: SessionKey) -> Result<(), Error> {
        info!("(DiscordVoice) leaving voice in {}", session);
        self.update(session, None)
    }
}

/// Collects the bot's voice session id and the voice server details and
/// forwards them to the audio node once both are known.
pub struct VoiceForwarder {
    nodes: Arc<NodeRegistry>,
    session_ids: DashMap<SessionKey, String>,
    servers: DashMap<SessionKey, (String, String)>,
}

impl VoiceForwarder {
    pub fn new(nodes: Arc<NodeRegistry>) -> Self {
        Self {
            nodes,
            session_ids: DashMap::new(),
            servers: DashMap::new(),
        }
    }

    /// The bot's own voice state changed.
    pub async fn on_state(&self, session: SessionKey, session_id: String, connected: bool) {
        if !connected {
            self.session_ids.remove(&session);
            self.servers.remove(&session);
            return;
        }
        self.session_ids.insert(session, session_id);
        self.try_forward(session).await;
    }

    pub async fn on_server(&self, session: SessionKey, token: String, endpoint: Option<String>) {
        // No endpoint means the voice server went away; a new update follows.
        let Some(endpoint) = endpoint else {
            debug!("(VoiceForwarder) {} voice server pending allocation", session);
            return;
        };
        self.servers.insert(session, (token, endpoint));
        self.try_forward(session).await;
    }

    /// Both halves known, if any.
    pub fn pending(&self, session: SessionKey) -> Option<VoiceServerInfo> {
        let session_id = self.session_ids.get(&session)?.value().clone();
        let (token, endpoint) = self.servers.get(&session)?.value().clone();
        Some(VoiceServerInfo { token, endpoint, session_id })
    }

    async fn try_forward(&self, session: SessionKey) {
        let Some(info) = self.pending(session) else {
            return;
        };
        debug!("(VoiceForwarder) forwarding voice for {} ({})", session, info.endpoint);
        if let Err(e) = self.nodes.node_for(session).update_voice(session, info).await {
            warn!("(VoiceForwarder) node rejected voice update for {}: {}", session, e);
        }
    }
}
