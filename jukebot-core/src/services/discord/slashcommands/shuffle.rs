// File: jukebot-core/src/services/discord/slashcommands/shuffle.rs

use twilight_model::application::command::CommandType;
use twilight_util::builder::command::CommandBuilder;

/// Shuffles the pending playlist, or the queue when no playlist is loaded.
pub fn create_shuffle_command() -> CommandBuilder {
    CommandBuilder::new("shuffle", "Shuffle the Q.", CommandType::ChatInput)
}
