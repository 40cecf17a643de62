//! Runtime configuration, read from the process environment.
//!
//! A `.env` file is loaded first (if present) so local development does not
//! need exported variables.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use tracing::{debug, warn};

use crate::Error;

/// How early a catalog token is refreshed before it expires.
pub const REFRESH_LEAD: Duration = Duration::from_secs(5 * 60);

/// Prefix the audio node understands as "search for this text".
pub const SEARCH_PREFIX: &str = "ytsearch";

/// URL fragments that mark a link as a playlist.
pub const PLAYLIST_URL_MARKERS: [&str; 4] = ["/playlist/", "/album/", "?list=", "&list="];

const DEFAULT_LAVALINK_URI: &str = "http://lavalink:2333";
const DEFAULT_TIDAL_COUNTRY: &str = "FI";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Client id/secret pair for a catalog provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub bot_status_message: String,
    pub regen_commands: bool,
    pub lavalink_uri: String,
    pub lavalink_password: String,
    pub spotify: Option<ProviderCredentials>,
    pub tidal: Option<ProviderCredentials>,
    pub tidal_country_code: String,
    pub request_timeout: Duration,
}

impl BotConfig {
    /// Loads `.env` (or `env_file` when given) and then reads the environment.
    pub fn from_env(env_file: Option<&Path>) -> Result<Self, Error> {
        let loaded = match env_file {
            Some(path) => dotenv::from_path(path).map(|_| path.display().to_string()),
            None => dotenv::dotenv().map(|p| p.display().to_string()),
        };
        match loaded {
            Ok(path) => debug!("(Config) loaded environment from {}", path),
            Err(e) => debug!("(Config) no env file loaded: {}", e),
        }

        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get("BOT_TOKEN")
            .ok_or_else(|| Error::Config("BOT_TOKEN is not set".into()))?;

        let regen_commands = match get("REGEN_COMMANDS") {
            Some(v) => parse_bool(&v)
                .ok_or_else(|| Error::Config(format!("REGEN_COMMANDS is not a boolean: {v}")))?,
            None => false,
        };

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(v) => {
                let secs: u64 = v
                    .parse()
                    .map_err(|_| Error::Config(format!("REQUEST_TIMEOUT_SECS is not a number: {v}")))?;
                Duration::from_secs(secs.max(1))
            }
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let spotify = provider_credentials(&get, "SPOTIFY");
        let tidal = provider_credentials(&get, "TIDAL");

        Ok(Self {
            bot_token,
            bot_status_message: get("BOT_STATUS_MESSAGE").unwrap_or_default(),
            regen_commands,
            lavalink_uri: get("LAVALINK_URI").unwrap_or_else(|| DEFAULT_LAVALINK_URI.to_string()),
            lavalink_password: get("LAVALINK_PASSWORD").unwrap_or_default(),
            spotify,
            tidal,
            tidal_country_code: get("TIDAL_COUNTRY_CODE")
                .unwrap_or_else(|| DEFAULT_TIDAL_COUNTRY.to_string()),
            request_timeout,
        })
    }

    /// The bot's user id, decoded from the first segment of its token.
    pub fn bot_user_id(&self) -> Result<u64, Error> {
        user_id_from_token(&self.bot_token)
    }
}

fn provider_credentials<G>(get: &G, prefix: &str) -> Option<ProviderCredentials>
where
    G: Fn(&str) -> Option<String>,
{
    let id = get(&format!("{prefix}_CLIENT_ID"));
    let secret = get(&format!("{prefix}_CLIENT_SECRET"));
    match (id, secret) {
        (Some(client_id), Some(client_secret)) => Some(ProviderCredentials {
            client_id,
            client_secret,
        }),
        (None, None) => None,
        _ => {
            warn!("(Config) {prefix} client id/secret only partially set; provider disabled");
            None
        }
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Discord tokens start with the base64-encoded user id.
pub fn user_id_from_token(token: &str) -> Result<u64, Error> {
    let first = token
        .split('.')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Config("Bot token is malformed".into()))?;

    let engine = GeneralPurpose::new(
        &alphabet::STANDARD,
        GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
    );
    let bytes = engine
        .decode(first)
        .map_err(|e| Error::Config(format!("Bot token is malformed: {e}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| Error::Config(format!("Bot token is malformed: {e}")))?;
    text.parse::<u64>()
        .map_err(|e| Error::Config(format!("Bot token does not carry a user id: {e}")))
}
