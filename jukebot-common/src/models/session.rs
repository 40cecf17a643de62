// File: jukebot-common/src/models/session.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifies one playback context (a guild).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey(pub u64);

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionKey {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(SessionKey)
            .map_err(|e| format!("Invalid session key '{}': {}", s, e))
    }
}

impl From<u64> for SessionKey {
    fn from(id: u64) -> Self {
        SessionKey(id)
    }
}

/// Where notifications for a session are posted (a text channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelTarget(pub u64);

impl fmt::Display for ChannelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
