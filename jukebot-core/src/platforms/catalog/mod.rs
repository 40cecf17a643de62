//! Catalog providers: turn a provider URL into "artist - title" search
//! strings, keeping an access token alive in the background.

pub mod spotify;
pub mod tidal;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use jukebot_common::models::{EntityKind, PLAYLIST_MAX_SIZE};

use crate::config::REFRESH_LEAD;
use crate::platforms::CatalogApi;
use crate::{Error, ResolutionError};

pub use spotify::SpotifyApi;
pub use tidal::TidalApi;

/// Never schedule a refresh sooner than this, even for short-lived tokens.
const MIN_REFRESH_DELAY: Duration = Duration::from_secs(30);

/// Token state for one provider. Always read and written as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialState {
    pub access_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub usable: bool,
}

pub struct CatalogResolver {
    api: Arc<dyn CatalogApi>,
    state: RwLock<CredentialState>,
}

impl CatalogResolver {
    /// Starts unusable; the first successful [`refresh`](Self::refresh)
    /// makes it usable.
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self {
            api,
            state: RwLock::new(CredentialState::default()),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.api.provider_name()
    }

    /// Whether URLs on `host` belong to this provider.
    pub fn matches_host(&self, host: &str) -> bool {
        host.contains(self.api.host_marker())
    }

    pub fn credential_snapshot(&self) -> CredentialState {
        self.state.read().clone()
    }

    pub fn is_usable(&self) -> bool {
        self.state.read().usable
    }

    /// Fetches a new token. On success returns how long to wait before the
    /// next refresh; on failure the provider is marked unusable.
    pub async fn refresh(&self) -> Result<Duration, Error> {
        match self.api.authorize().await {
            Ok(credential) => {
                let expires_at = credential.expires_at();
                {
                    let mut state = self.state.write();
                    *state = CredentialState {
                        access_token: Some(credential.access_token),
                        expires_at: Some(expires_at),
                        usable: true,
                    };
                }
                let delay = next_refresh_delay(credential.expires_in_secs);
                info!(
                    "(CatalogResolver) {} token refreshed; expires_at={}, next refresh in {:?}",
                    self.provider_name(),
                    expires_at,
                    delay
                );
                Ok(delay)
            }
            Err(e) => {
                self.mark_unusable();
                error!(
                    "(CatalogResolver) {} token refresh failed, provider unusable: {}",
                    self.provider_name(),
                    e
                );
                Err(e)
            }
        }
    }

    fn mark_unusable(&self) {
        self.state.write().usable = false;
    }

    /// Resolves a provider URL into ordered `"{artist} - {title}"` strings.
    pub async fn resolve_qualified_names(&self, url: &str) -> Result<Vec<String>, Error> {
        if url.trim().is_empty() {
            return Err(ResolutionError::InvalidUrl("URL is empty".into()).into());
        }

        let snapshot = self.credential_snapshot();
        let token = match (snapshot.usable, snapshot.access_token) {
            (true, Some(token)) => token,
            _ => {
                return Err(ResolutionError::ProviderUnusable(self.provider_name().into()).into());
            }
        };

        let entity_id = entity_id_from_url(url)?;
        let kind = EntityKind::from_url(url);
        if !self.api.supports(kind) {
            return Err(ResolutionError::Unsupported(format!(
                "{} {}s are not supported yet",
                self.provider_name(),
                kind
            ))
            .into());
        }

        debug!(
            "(CatalogResolver) {} fetching {} '{}'",
            self.provider_name(),
            kind,
            entity_id
        );

        let tracks = match self
            .api
            .fetch_tracks(kind, &entity_id, &token, PLAYLIST_MAX_SIZE)
            .await
        {
            Ok(tracks) => tracks,
            Err(Error::Auth(msg)) => {
                warn!(
                    "(CatalogResolver) {} rejected our token: {}",
                    self.provider_name(),
                    msg
                );
                self.mark_unusable();
                return Err(ResolutionError::ProviderUnusable(self.provider_name().into()).into());
            }
            Err(Error::Resolution(e)) => return Err(e.into()),
            Err(e) => return Err(ResolutionError::Provider(e.to_string()).into()),
        };

        Ok(tracks
            .iter()
            .take(PLAYLIST_MAX_SIZE)
            .map(|t| t.qualified_name())
            .collect())
    }
}

/// Entity id = last path segment, ignoring any query string.
pub fn entity_id_from_url(url: &str) -> Result<String, ResolutionError> {
    let without_query = url.split('?').next().unwrap_or_default();
    let id = without_query
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim();

    if id.is_empty() || !without_query.contains('/') {
        return Err(ResolutionError::InvalidUrl(
            "Failed to get entity ID from URL".into(),
        ));
    }
    Ok(id.to_string())
}

fn next_refresh_delay(expires_in_secs: i64) -> Duration {
    let lead = REFRESH_LEAD.as_secs() as i64;
    let secs = (expires_in_secs - lead).max(0) as u64;
    Duration::from_secs(secs).max(MIN_REFRESH_DELAY)
}
