use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info, trace, warn};
use twilight_cache_inmemory::InMemoryCache;
use twilight_gateway::Event;
use twilight_http::Client as HttpClient;
use twilight_model::id::marker::{ApplicationMarker, ChannelMarker, GuildMarker, UserMarker};
use twilight_model::id::Id;

use jukebot_common::models::SessionKey;

use crate::platforms::discord::voice::{should_auto_leave, VoiceForwarder};
use crate::platforms::{NotificationSink, VoiceGateway};
use crate::services::discord::slashcommands::{
    handle_interaction_create, register_global_slash_commands, SlashContext,
};
use crate::services::CommandService;

/// Reacts to gateway events: slash commands, the bot's voice connection
/// and channels emptying out.
pub struct DiscordEventService {
    http: Arc<HttpClient>,
    cache: Arc<InMemoryCache>,
    commands: Arc<CommandService>,
    notifier: Arc<dyn NotificationSink>,
    forwarder: Arc<VoiceForwarder>,
    voice: Arc<dyn VoiceGateway>,
    bot_user_id: Id<UserMarker>,
    application_id: RwLock<Option<Id<ApplicationMarker>>>,
    regen_commands: bool,
}

impl DiscordEventService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        http: Arc<HttpClient>,
        cache: Arc<InMemoryCache>,
        commands: Arc<CommandService>,
        notifier: Arc<dyn NotificationSink>,
        forwarder: Arc<VoiceForwarder>,
        voice: Arc<dyn VoiceGateway>,
        bot_user_id: Id<UserMarker>,
        regen_commands: bool,
    ) -> Self {
        Self {
            http,
            cache,
            commands,
            notifier,
            forwarder,
            voice,
            bot_user_id,
            application_id: RwLock::new(None),
            regen_commands,
        }
    }

    pub fn cache(&self) -> &Arc<InMemoryCache> {
        &self.cache
    }

    /// The voice channel `user` sits in according to the cache. Read this
    /// before the cache sees a voice update to learn where they came from.
    pub fn cached_voice_channel(
        &self,
        user: Id<UserMarker>,
        guild: Id<GuildMarker>,
    ) -> Option<Id<ChannelMarker>> {
        self.cache.voice_state(user, guild).map(|s| s.channel_id())
    }

    /// Handles one gateway event. `previous_voice_channel` is the channel the
    /// updated user was in before a `VoiceStateUpdate`.
    pub async fn handle(&self, event: Event, previous_voice_channel: Option<Id<ChannelMarker>>) {
        match event {
            Event::Ready(ready) => {
                let app_id = ready.application.id;
                *self.application_id.write() = Some(app_id);
                info!(
                    "(DiscordEventService) ready as {} (application {})",
                    ready.user.name, app_id
                );
                if self.regen_commands {
                    match register_global_slash_commands(&self.http, app_id).await {
                        Ok(()) => info!("(DiscordEventService) slash commands registered"),
                        Err(e) => error!("(DiscordEventService) {}", e),
                    }
                }
            }
            Event::InteractionCreate(interaction) => {
                let Some(application_id) = *self.application_id.read() else {
                    warn!("(DiscordEventService) interaction before READY, ignoring");
                    return;
                };
                let ctx = SlashContext {
                    http: &self.http,
                    application_id,
                    cache: &self.cache,
                    commands: &self.commands,
                    notifier: self.notifier.as_ref(),
                };
                if let Err(e) = handle_interaction_create(&ctx, &interaction.0).await {
                    error!("(DiscordEventService) interaction failed: {}", e);
                }
            }
            Event::VoiceStateUpdate(update) => {
                let state = &update.0;
                let Some(guild_id) = state.guild_id else {
                    return;
                };
                let session = SessionKey(guild_id.get());

                if state.user_id == self.bot_user_id {
                    let connected = state.channel_id.is_some();
                    self.forwarder
                        .on_state(session, state.session_id.clone(), connected)
                        .await;
                    if !connected {
                        debug!("(DiscordEventService) bot disconnected from voice in {}", session);
                        self.commands.sessions().remove(session).await;
                    }
                    return;
                }

                // Only a departure can leave the bot alone.
                if previous_voice_channel.is_none() || previous_voice_channel == state.channel_id {
                    return;
                }
                self.check_auto_leave(guild_id, previous_voice_channel).await;
            }
            Event::VoiceServerUpdate(update) => {
                let session = SessionKey(update.guild_id.get());
                self.forwarder
                    .on_server(session, update.token.clone(), update.endpoint.clone())
                    .await;
            }
            other => trace!("(DiscordEventService) unhandled event: {:?}", other.kind()),
        }
    }

    async fn check_auto_leave(
        &self,
        guild_id: Id<GuildMarker>,
        left_channel: Option<Id<ChannelMarker>>,
    ) {
        let bot_channel = self.cached_voice_channel(self.bot_user_id, guild_id);
        let Some(channel) = bot_channel else {
            return;
        };

        let occupants: Vec<bool> = match self.cache.voice_channel_states(channel) {
            Some(states) => states
                .map(|s| {
                    self.cache
                        .user(s.user_id())
                        .map(|u| u.bot)
                        .unwrap_or(false)
                })
                .collect(),
            None => Vec::new(),
        };

        if !should_auto_leave(
            Some(channel.get()),
            left_channel.map(|c| c.get()),
            &occupants,
        ) {
            return;
        }

        let session = SessionKey(guild_id.get());
        info!("(DiscordEventService) only bots left in {}, leaving", session);
        self.commands.sessions().remove(session).await;
        if let Err(e) = self.voice.leave(session).await {
            warn!("(DiscordEventService) leaving voice in {} failed: {}", session, e);
        }
    }
}
