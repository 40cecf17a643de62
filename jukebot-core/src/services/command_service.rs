// File: src/services/command_service.rs
//
// Platform-agnostic handling of the music commands. The chat layer turns
// an interaction into a `MusicCommand`, we turn it into notifications.

use std::sync::Arc;

use tracing::{debug, info, warn};

use jukebot_common::models::{ChannelTarget, Notification, SessionKey};

use crate::platforms::VoiceGateway;
use crate::services::scheduler::PlayOutcome;
use crate::services::session_manager::SessionManager;
use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicCommand {
    /// Queue one item; playlist links only contribute their first entry.
    Play {
        url: String,
        voice_channel: Option<u64>,
    },
    /// Queue a playlist link into the playlist buffer.
    Playlist {
        url: String,
        voice_channel: Option<u64>,
    },
    Skip,
    Stop,
    Shuffle,
}

impl MusicCommand {
    pub fn name(&self) -> &'static str {
        match self {
            MusicCommand::Play { .. } => "play",
            MusicCommand::Playlist { .. } => "playlist",
            MusicCommand::Skip => "skip",
            MusicCommand::Stop => "stop",
            MusicCommand::Shuffle => "shuffle",
        }
    }
}

/// The interaction reply plus anything posted to the channel afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub reply: Notification,
    pub follow_ups: Vec<Notification>,
}

impl CommandReply {
    pub fn just(reply: Notification) -> Self {
        Self { reply, follow_ups: Vec::new() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::just(Notification::Error { message: message.into() })
    }
}

pub struct CommandService {
    sessions: Arc<SessionManager>,
    voice: Arc<dyn VoiceGateway>,
}

impl CommandService {
    pub fn new(sessions: Arc<SessionManager>, voice: Arc<dyn VoiceGateway>) -> Self {
        debug!("Initializing CommandService");
        Self { sessions, voice }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Runs `command`. Failures come back as an error reply, never as `Err`.
    pub async fn execute(
        &self,
        session: SessionKey,
        channel: ChannelTarget,
        command: MusicCommand,
    ) -> CommandReply {
        let name = command.name();
        info!("(CommandService) /{} in session {}", name, session);
        match self.run(session, channel, command).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("(CommandService) /{} failed in session {}: {}", name, session, e);
                CommandReply::error(e.to_string())
            }
        }
    }

    async fn run(
        &self,
        session: SessionKey,
        channel: ChannelTarget,
        command: MusicCommand,
    ) -> Result<CommandReply, Error> {
        match command {
            MusicCommand::Play { url, voice_channel } => {
                self.enqueue_and_play(session, channel, &url, voice_channel, true).await
            }
            MusicCommand::Playlist { url, voice_channel } => {
                self.enqueue_and_play(session, channel, &url, voice_channel, false).await
            }
            MusicCommand::Skip => {
                let scheduler = self.sessions.scheduler(session);
                if !scheduler.is_playing().await? {
                    return Ok(CommandReply::error("No song to skip!"));
                }
                let next = scheduler.skip_current_song().await?;
                let follow_up = match &next {
                    Some(item) => Notification::NowPlaying {
                        item: item.clone(),
                        summary: scheduler.summary(),
                    },
                    None => Notification::QueueEmpty,
                };
                Ok(CommandReply {
                    reply: Notification::SongSkipped { next },
                    follow_ups: vec![follow_up],
                })
            }
            MusicCommand::Stop => {
                self.sessions.remove(session).await;
                if let Err(e) = self.voice.leave(session).await {
                    warn!("(CommandService) leaving voice in {} failed: {}", session, e);
                }
                Ok(CommandReply::just(Notification::Stopped))
            }
            MusicCommand::Shuffle => {
                self.sessions.scheduler(session).shuffle();
                Ok(CommandReply::just(Notification::QueueShuffled))
            }
        }
    }

    async fn enqueue_and_play(
        &self,
        session: SessionKey,
        channel: ChannelTarget,
        url: &str,
        voice_channel: Option<u64>,
        block_playlists: bool,
    ) -> Result<CommandReply, Error> {
        let scheduler = self.sessions.scheduler(session);
        let item = scheduler.enqueue(channel, url, block_playlists).await?;

        let Some(voice_channel) = voice_channel else {
            return Ok(CommandReply::error("Not in a voice channel!"));
        };
        self.voice.join(session, voice_channel).await?;

        if let PlayOutcome::Started(started) = scheduler.play().await? {
            debug!("(CommandService) started '{}'", started.qualified_name());
        }

        Ok(CommandReply::just(Notification::SongAdded {
            item,
            summary: scheduler.summary(),
        }))
    }
}
