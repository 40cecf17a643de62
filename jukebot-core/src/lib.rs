// src/lib.rs

pub mod config;
pub mod http;
pub mod eventbus;
pub mod platforms;
pub mod services;
pub mod tasks;

pub use jukebot_common::error::{Error, ResolutionError};
pub use http::{DefaultHttpClient, HttpClient};
pub use config::BotConfig;
