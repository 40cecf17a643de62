// File: jukebot-core/src/services/discord/slashcommands/skip.rs

use twilight_model::application::command::CommandType;
use twilight_util::builder::command::CommandBuilder;

pub fn create_skip_command() -> CommandBuilder {
    CommandBuilder::new("skip", "Skip the current song.", CommandType::ChatInput)
}
