//! Lavalink v4 audio node: REST client, websocket listener and the
//! registry that decides which node serves a session.

pub mod client;
pub mod model;
pub mod registry;
pub mod websocket;

pub use client::LavalinkNode;
pub use registry::NodeRegistry;
pub use websocket::LavalinkListener;
