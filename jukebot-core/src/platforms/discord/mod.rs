pub mod notifier;
pub mod runtime;
pub mod voice;

pub use notifier::DiscordNotifier;
pub use runtime::DiscordRuntime;
pub use voice::{DiscordVoice, VoiceForwarder};
