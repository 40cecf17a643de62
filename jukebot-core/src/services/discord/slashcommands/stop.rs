// File: jukebot-core/src/services/discord/slashcommands/stop.rs

use twilight_model::application::command::CommandType;
use twilight_util::builder::command::CommandBuilder;

pub fn create_stop_command() -> CommandBuilder {
    CommandBuilder::new("stop", "Stop playback and leave.", CommandType::ChatInput)
}
