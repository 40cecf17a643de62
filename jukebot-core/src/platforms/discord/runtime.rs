use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{
    self as gateway, CloseFrame, ConfigBuilder, Event, EventTypeFlags, Intents, MessageSender, Shard,
    StreamExt,
};
use twilight_http::client::ClientBuilder;
use twilight_http::Client as HttpClient;
use twilight_model::gateway::payload::outgoing::update_presence::UpdatePresencePayload;
use twilight_model::gateway::presence::{Activity, ActivityType, MinimalActivity, Status};

use crate::platforms::discord::voice::DiscordVoice;
use crate::platforms::ConnectionStatus;
use crate::services::discord::DiscordEventService;
use crate::Error;

/// Builds the Discord REST client shared by the notifier and the gateway.
pub fn build_http_client(token: &str) -> Arc<HttpClient> {
    Arc::new(
        ClientBuilder::new()
            .token(token.to_string())
            .timeout(Duration::from_secs(30))
            .build(),
    )
}

/// Cache with just what voice routing and the bot check need.
pub fn build_cache() -> Arc<InMemoryCache> {
    Arc::new(
        InMemoryCache::builder()
            .resource_types(
                ResourceType::GUILD
                    | ResourceType::CHANNEL
                    | ResourceType::VOICE_STATE
                    | ResourceType::USER
                    | ResourceType::MEMBER,
            )
            .build(),
    )
}

fn presence(status_message: &str) -> Result<Option<UpdatePresencePayload>, Error> {
    if status_message.is_empty() {
        return Ok(None);
    }
    let activity: Activity = MinimalActivity {
        kind: ActivityType::Listening,
        name: status_message.to_string(),
        url: None,
    }
    .into();
    UpdatePresencePayload::new(vec![activity], false, None, Status::Online)
        .map(Some)
        .map_err(|e| Error::Platform(format!("invalid presence: {e}")))
}

async fn shard_runner(mut shard: Shard, service: Arc<DiscordEventService>) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        let event = match item {
            Ok(event) => event,
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
                continue;
            }
        };

        // Where the user was before this update; the cache forgets it below.
        let previous_voice_channel = match &event {
            Event::VoiceStateUpdate(update) => update
                .0
                .guild_id
                .and_then(|guild| service.cached_voice_channel(update.0.user_id, guild)),
            _ => None,
        };
        service.cache().update(&event);

        match event {
            Event::InteractionCreate(_) => {
                let svc = service.clone();
                tokio::spawn(async move {
                    svc.handle(event, None).await;
                });
            }
            Event::Ready(_)
            | Event::VoiceStateUpdate(_)
            | Event::VoiceServerUpdate(_) => {
                service.handle(event, previous_voice_channel).await;
            }
            _ => {}
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

/// Gateway connection: one task per recommended shard.
pub struct DiscordRuntime {
    token: String,
    status_message: String,
    http: Arc<HttpClient>,
    voice: Arc<DiscordVoice>,
    connection_status: ConnectionStatus,
    shard_tasks: Vec<JoinHandle<()>>,
    shard_senders: Vec<MessageSender>,
}

impl DiscordRuntime {
    pub fn new(
        token: impl Into<String>,
        status_message: impl Into<String>,
        http: Arc<HttpClient>,
        voice: Arc<DiscordVoice>,
    ) -> Self {
        Self {
            token: token.into(),
            status_message: status_message.into(),
            http,
            voice,
            connection_status: ConnectionStatus::Disconnected,
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
        }
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection_status.clone()
    }

    pub async fn connect(&mut self, service: Arc<DiscordEventService>) -> Result<(), Error> {
        if matches!(self.connection_status, ConnectionStatus::Connected) {
            info!("(DiscordRuntime) Already connected => skipping");
            return Ok(());
        }
        if self.token.is_empty() {
            return Err(Error::Auth("Discord token is empty".into()));
        }

        let mut builder = ConfigBuilder::new(
            self.token.clone(),
            Intents::GUILDS | Intents::GUILD_VOICE_STATES,
        );
        if let Some(presence) = presence(&self.status_message)? {
            builder = builder.presence(presence);
        }
        let config = builder.build();

        let shards = gateway::create_recommended(&self.http, config, |_, b| b.build())
            .await
            .map_err(|e| Error::Platform(format!("create_recommended error: {e}")))?;

        for shard in shards {
            self.shard_senders.push(shard.sender());
            let svc = service.clone();
            self.shard_tasks
                .push(tokio::spawn(async move { shard_runner(shard, svc).await }));
        }
        debug!("(DiscordRuntime) {} shard(s) running", self.shard_senders.len());
        self.voice.set_senders(self.shard_senders.clone());

        self.connection_status = ConnectionStatus::Connected;
        Ok(())
    }

    pub async fn disconnect(&mut self) {
        self.connection_status = ConnectionStatus::Disconnected;
        self.voice.set_senders(Vec::new());

        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        for task in &mut self.shard_tasks {
            let _ = task.await;
        }
        self.shard_senders.clear();
        self.shard_tasks.clear();
        info!("(DiscordRuntime) disconnected");
    }
}
