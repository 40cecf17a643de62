// File: src/services/resolver.rs
//
// URL → playable items. Catalog links go through their provider for
// "artist - title" strings, which are then searched on the audio node;
// everything else is loaded on the node as-is.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use jukebot_common::models::{LoadResult, PlayableItem, SessionKey};

use crate::config::SEARCH_PREFIX;
use crate::platforms::catalog::CatalogResolver;
use crate::platforms::lavalink::NodeRegistry;
use crate::{Error, ResolutionError};

/// Default bound on a single audio-node load.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(15);

pub struct ResolutionPipeline {
    catalogs: Vec<Arc<CatalogResolver>>,
    nodes: Arc<NodeRegistry>,
    load_timeout: Duration,
}

impl ResolutionPipeline {
    pub fn new(catalogs: Vec<Arc<CatalogResolver>>, nodes: Arc<NodeRegistry>) -> Self {
        Self {
            catalogs,
            nodes,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }

    pub fn with_load_timeout(mut self, load_timeout: Duration) -> Self {
        self.load_timeout = load_timeout;
        self
    }

    fn catalog_for(&self, host: &str) -> Option<&Arc<CatalogResolver>> {
        self.catalogs.iter().find(|c| c.matches_host(host))
    }

    /// Resolves `url` into the items to enqueue, in order.
    pub async fn resolve(
        &self,
        session: SessionKey,
        url: &str,
        as_playlist: bool,
    ) -> Result<Vec<PlayableItem>, Error> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| ResolutionError::InvalidUrl(format!("{url}: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ResolutionError::InvalidUrl(format!("{url} has no host")))?;

        let (candidates, as_playlist) = match self.catalog_for(host) {
            Some(catalog) => {
                let names = catalog.resolve_qualified_names(url).await?;
                info!(
                    "(ResolutionPipeline) {} via {} catalog => {} candidate(s)",
                    url,
                    catalog.provider_name(),
                    names.len()
                );
                let candidates: Vec<String> = names
                    .into_iter()
                    .map(|name| format!("{SEARCH_PREFIX}:{name}"))
                    .collect();
                // Catalog hits are independent searches, never a node playlist.
                (candidates, false)
            }
            None => {
                info!(
                    "(ResolutionPipeline) {} direct (as_playlist={})",
                    url, as_playlist
                );
                (vec![url.trim().to_string()], as_playlist)
            }
        };

        let node = self.nodes.node_for(session);
        let mut resolved = Vec::new();
        for candidate in &candidates {
            let result = match timeout(self.load_timeout, node.load_item(candidate)).await {
                Ok(Ok(result)) => result,
                Ok(Err(Error::Resolution(e))) => return Err(e.into()),
                Ok(Err(e)) => {
                    warn!("(ResolutionPipeline) load of '{}' failed: {}", candidate, e);
                    return Err(ResolutionError::LoadFailed(e.to_string()).into());
                }
                Err(_) => {
                    warn!("(ResolutionPipeline) load of '{}' timed out", candidate);
                    return Err(ResolutionError::LoadFailed(format!(
                        "timed out after {:?} loading {candidate}",
                        self.load_timeout
                    ))
                    .into());
                }
            };
            resolved.extend(aggregate(candidate, result, as_playlist)?);
        }

        debug!(
            "(ResolutionPipeline) {} resolved to {} item(s)",
            url,
            resolved.len()
        );
        if resolved.is_empty() {
            return Err(ResolutionError::Empty.into());
        }
        Ok(resolved)
    }
}

/// What one candidate contributes to the final list.
pub fn aggregate(
    candidate: &str,
    result: LoadResult,
    as_playlist: bool,
) -> Result<Vec<PlayableItem>, ResolutionError> {
    match result {
        LoadResult::SingleItem(item) => Ok(vec![item]),
        LoadResult::PlaylistItems { items, .. } if as_playlist => Ok(items),
        LoadResult::PlaylistItems { mut items, selected, .. } => {
            // The linked entry if the URL picked one, else the first.
            let index = selected.filter(|i| *i < items.len()).unwrap_or(0);
            if index < items.len() {
                Ok(vec![items.swap_remove(index)])
            } else {
                Ok(Vec::new())
            }
        }
        LoadResult::SearchResults(items) => Ok(items.into_iter().take(1).collect()),
        LoadResult::NoMatch => Err(ResolutionError::NoMatch(candidate.to_string())),
        LoadResult::LoadFailure { message } => Err(ResolutionError::LoadFailed(message)),
    }
}
