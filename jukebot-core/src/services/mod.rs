pub mod command_service;
pub mod discord;
pub mod queue_store;
pub mod resolver;
pub mod scheduler;
pub mod session_manager;

pub use command_service::{CommandReply, CommandService, MusicCommand};
pub use queue_store::QueueStore;
pub use resolver::ResolutionPipeline;
pub use scheduler::{PlayOutcome, PlaybackScheduler};
pub use session_manager::SessionManager;
