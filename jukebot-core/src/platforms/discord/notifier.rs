// File: src/platforms/discord/notifier.rs

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use twilight_http::Client as HttpClient;
use twilight_model::channel::message::Embed;
use twilight_model::id::marker::ChannelMarker;
use twilight_model::id::Id;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

use jukebot_common::models::{ChannelTarget, Notification, PlayableItem, QueueSummary};

use crate::platforms::NotificationSink;
use crate::Error;

pub const DEFAULT_COLOR: u32 = 0x00FF00;
pub const ERROR_COLOR: u32 = 0xFF0000;

fn song_fields(builder: EmbedBuilder, item: &PlayableItem, summary: &QueueSummary) -> EmbedBuilder {
    builder
        .field(EmbedFieldBuilder::new(
            "SONG",
            format!("{} | {}", item.qualified_name(), item.formatted_duration()),
        ))
        .field(EmbedFieldBuilder::new("Q", summary.describe()))
}

/// Turns a notification into the embed we post.
pub fn render_embed(notification: &Notification) -> Embed {
    let builder = EmbedBuilder::new().title(notification.title());
    let builder = match notification {
        Notification::NowPlaying { item, summary } | Notification::SongAdded { item, summary } => {
            song_fields(builder.color(DEFAULT_COLOR), item, summary)
        }
        Notification::QueueEmpty => builder.color(DEFAULT_COLOR).description("The Q is now empty."),
        Notification::SongSkipped { .. } => builder.color(DEFAULT_COLOR).description("Song skipped."),
        Notification::QueueShuffled => builder.color(DEFAULT_COLOR).description("Q shuffled."),
        Notification::Stopped => builder.color(DEFAULT_COLOR).description("Hasta la Vista!"),
        Notification::Error { message } => builder
            .color(ERROR_COLOR)
            .description(format!("Error: {message}")),
    };
    builder.build()
}

pub fn channel_id(target: ChannelTarget) -> Result<Id<ChannelMarker>, Error> {
    Id::new_checked(target.0).ok_or_else(|| Error::Platform(format!("invalid channel id {target}")))
}

/// Posts notifications as embeds into a text channel.
pub struct DiscordNotifier {
    http: Arc<HttpClient>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NotificationSink for DiscordNotifier {
    async fn notify(&self, target: ChannelTarget, notification: Notification) -> Result<(), Error> {
        debug!("(DiscordNotifier) {} → channel {}", notification.title(), target);
        let embed = render_embed(&notification);
        self.http
            .create_message(channel_id(target)?)
            .embeds(&[embed])
            .await
            .map_err(|e| Error::Platform(format!("Error sending Discord embed: {e:?}")))?;
        Ok(())
    }
}
