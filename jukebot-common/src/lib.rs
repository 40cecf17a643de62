// File: jukebot-common/src/lib.rs

pub mod error;
pub mod models;

pub use error::{Error, ResolutionError, ResolutionReason};
