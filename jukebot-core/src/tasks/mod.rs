pub mod credential_refresh;
pub mod node_events;
