// File: jukebot-core/src/services/discord/slashcommands/mod.rs

pub mod play;
pub mod shuffle;
pub mod skip;
pub mod stop;

use std::sync::Arc;

use tracing::{debug, warn};
use twilight_cache_inmemory::InMemoryCache;
use twilight_http::Client as HttpClient;
use twilight_model::{
    application::interaction::{
        application_command::{CommandData, CommandOptionValue},
        Interaction, InteractionData,
    },
    http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType},
    id::marker::ApplicationMarker,
    id::Id,
};

use jukebot_common::models::{ChannelTarget, SessionKey};

use crate::platforms::discord::notifier::render_embed;
use crate::platforms::NotificationSink;
use crate::services::{CommandReply, CommandService, MusicCommand};
use crate::Error;

use play::{create_play_command, create_playlist_command};
use shuffle::create_shuffle_command;
use skip::create_skip_command;
use stop::create_stop_command;

/// Everything a slash-command handler needs.
pub struct SlashContext<'a> {
    pub http: &'a Arc<HttpClient>,
    pub application_id: Id<ApplicationMarker>,
    pub cache: &'a InMemoryCache,
    pub commands: &'a CommandService,
    pub notifier: &'a dyn NotificationSink,
}

pub async fn register_global_slash_commands(
    http: &Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
) -> Result<(), Error> {
    let commands = [
        create_play_command().build(),
        create_playlist_command().build(),
        create_skip_command().build(),
        create_stop_command().build(),
        create_shuffle_command().build(),
    ];

    http.interaction(application_id)
        .set_global_commands(&commands)
        .await
        .map_err(|e| Error::Platform(format!("Failed to register global slash commands: {e}")))?;

    Ok(())
}

fn string_option(data: &CommandData, name: &str) -> Option<String> {
    data.options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| match &o.value {
            CommandOptionValue::String(s) => Some(s.clone()),
            _ => None,
        })
}

/// Maps a slash command onto a [`MusicCommand`]. `None` for commands we
/// don't own.
pub fn parse_command(
    name: &str,
    url: Option<String>,
    voice_channel: Option<u64>,
) -> Option<MusicCommand> {
    match name {
        "play" => Some(MusicCommand::Play {
            url: url.unwrap_or_default(),
            voice_channel,
        }),
        "playlist" => Some(MusicCommand::Playlist {
            url: url.unwrap_or_default(),
            voice_channel,
        }),
        "skip" => Some(MusicCommand::Skip),
        "stop" => Some(MusicCommand::Stop),
        "shuffle" => Some(MusicCommand::Shuffle),
        _ => None,
    }
}

async fn respond_immediately(
    ctx: &SlashContext<'_>,
    interaction: &Interaction,
    reply: CommandReply,
) -> Result<(), Error> {
    ctx.http
        .interaction(ctx.application_id)
        .create_response(
            interaction.id,
            &interaction.token,
            &InteractionResponse {
                kind: InteractionResponseType::ChannelMessageWithSource,
                data: Some(InteractionResponseData {
                    embeds: Some(vec![render_embed(&reply.reply)]),
                    ..Default::default()
                }),
            },
        )
        .await
        .map_err(|e| Error::Platform(format!("Error responding to interaction: {e}")))?;
    Ok(())
}

/// Dispatch slash commands from an interaction.
pub async fn handle_interaction_create(
    ctx: &SlashContext<'_>,
    interaction: &Interaction,
) -> Result<(), Error> {
    let Some(InteractionData::ApplicationCommand(cmd_data)) = &interaction.data else {
        return Ok(());
    };
    let name = cmd_data.name.as_str();

    let (Some(guild_id), Some(channel_id)) =
        (interaction.guild_id, interaction.channel.as_ref().map(|c| c.id))
    else {
        return respond_immediately(
            ctx,
            interaction,
            CommandReply::error("Commands only work in a server text channel."),
        )
        .await;
    };

    let voice_channel = interaction
        .author_id()
        .and_then(|user| ctx.cache.voice_state(user, guild_id))
        .map(|state| state.channel_id().get());

    let Some(command) = parse_command(name, string_option(cmd_data, "url"), voice_channel) else {
        return respond_immediately(
            ctx,
            interaction,
            CommandReply::error(format!("Unrecognized command: {name}")),
        )
        .await;
    };

    // Resolving can take longer than the interaction deadline.
    ctx.http
        .interaction(ctx.application_id)
        .create_response(
            interaction.id,
            &interaction.token,
            &InteractionResponse {
                kind: InteractionResponseType::DeferredChannelMessageWithSource,
                data: None,
            },
        )
        .await
        .map_err(|e| Error::Platform(format!("Error deferring `/{name}`: {e}")))?;

    let session = SessionKey(guild_id.get());
    let channel = ChannelTarget(channel_id.get());
    let reply = ctx.commands.execute(session, channel, command).await;

    let embeds = [render_embed(&reply.reply)];
    ctx.http
        .interaction(ctx.application_id)
        .update_response(&interaction.token)
        .embeds(Some(&embeds))
        .await
        .map_err(|e| Error::Platform(format!("Error responding to `/{name}`: {e}")))?;

    for follow_up in reply.follow_ups {
        if let Err(e) = ctx.notifier.notify(channel, follow_up).await {
            warn!("(SlashCommands) follow-up for `/{}` failed: {}", name, e);
        }
    }
    debug!("(SlashCommands) `/{}` handled in {}", name, session);
    Ok(())
}
