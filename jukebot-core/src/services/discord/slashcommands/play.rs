// File: jukebot-core/src/services/discord/slashcommands/play.rs

use twilight_model::application::command::CommandType;
use twilight_util::builder::command::{CommandBuilder, StringBuilder};

fn url_option() -> StringBuilder {
    StringBuilder::new("url", "The URL of the song to play").required(true)
}

/// `/play url`: queues a single song, playlist links contribute their first entry.
pub fn create_play_command() -> CommandBuilder {
    CommandBuilder::new(
        "play",
        "Play song from a given URL or resume playback if paused.",
        CommandType::ChatInput,
    )
    .option(url_option())
}

/// `/playlist url`: loads a playlist or album into the playlist buffer.
pub fn create_playlist_command() -> CommandBuilder {
    CommandBuilder::new(
        "playlist",
        "Play a playlist from a given URL.",
        CommandType::ChatInput,
    )
    .option(StringBuilder::new("url", "The URL of the playlist to play").required(true))
}
