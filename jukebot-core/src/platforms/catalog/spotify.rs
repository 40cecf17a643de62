// File: src/platforms/catalog/spotify.rs
//
// Spotify Web API: client-credentials grant plus the three lookups we need
// (single track, album tracks, playlist items).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::debug;

use jukebot_common::models::{CatalogArtist, CatalogTrack, Credential, EntityKind};

use crate::config::ProviderCredentials;
use crate::http::HttpClient;
use crate::platforms::CatalogApi;
use crate::Error;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";
/// Spotify caps album/playlist pages at 50 items.
const PAGE_SIZE: usize = 50;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct SpotifyArtist {
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Deserialize)]
struct SpotifyTrack {
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
}

#[derive(Deserialize)]
struct PlaylistItem {
    track: Option<SpotifyTrack>,
}

#[derive(Deserialize)]
struct Page<T> {
    items: Vec<T>,
    next: Option<String>,
}

impl From<SpotifyTrack> for CatalogTrack {
    fn from(t: SpotifyTrack) -> Self {
        CatalogTrack {
            title: t.name,
            artists: t
                .artists
                .into_iter()
                .map(|a| CatalogArtist {
                    primary: a.kind == "artist",
                    name: a.name,
                })
                .collect(),
        }
    }
}

pub struct SpotifyApi {
    http: Arc<dyn HttpClient>,
    credentials: ProviderCredentials,
}

impl SpotifyApi {
    pub fn new(http: Arc<dyn HttpClient>, credentials: ProviderCredentials) -> Self {
        Self { http, credentials }
    }

    fn bearer(token: &str) -> HashMap<String, String> {
        HashMap::from([("Authorization".to_string(), format!("Bearer {token}"))])
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: String, token: &str) -> Result<T, Error> {
        let body = self.http.get(url, Self::bearer(token)).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Follows `next` links until `limit` items were collected.
    async fn collect_pages<T, F>(
        &self,
        first_url: String,
        token: &str,
        limit: usize,
        mut convert: F,
    ) -> Result<Vec<CatalogTrack>, Error>
    where
        T: for<'de> Deserialize<'de>,
        F: FnMut(T) -> Option<CatalogTrack>,
    {
        let mut out = Vec::new();
        let mut next = Some(first_url);
        while let Some(url) = next.take() {
            let page: Page<T> = self.get_json(url, token).await?;
            out.extend(page.items.into_iter().filter_map(&mut convert));
            if out.len() >= limit {
                out.truncate(limit);
                break;
            }
            next = page.next;
        }
        Ok(out)
    }
}

#[async_trait]
impl CatalogApi for SpotifyApi {
    fn provider_name(&self) -> &'static str {
        "spotify"
    }

    fn host_marker(&self) -> &'static str {
        "spotify"
    }

    fn supports(&self, kind: EntityKind) -> bool {
        matches!(kind, EntityKind::Track | EntityKind::Album | EntityKind::Playlist)
    }

    async fn authorize(&self) -> Result<Credential, Error> {
        let basic = STANDARD.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));
        let headers = HashMap::from([("Authorization".to_string(), format!("Basic {basic}"))]);
        let form = vec![("grant_type".to_string(), "client_credentials".to_string())];

        let body = self
            .http
            .post_form(TOKEN_URL.to_string(), form, headers)
            .await?;
        let resp: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Auth(format!("Parse error on Spotify token JSON: {e}")))?;
        Ok(Credential::new(resp.access_token, resp.expires_in))
    }

    async fn fetch_tracks(
        &self,
        kind: EntityKind,
        entity_id: &str,
        access_token: &str,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, Error> {
        let id = urlencoding::encode(entity_id);
        let page_size = limit.clamp(1, PAGE_SIZE);
        debug!("(SpotifyApi) fetch {} {}", kind, entity_id);

        match kind {
            EntityKind::Track => {
                let track: SpotifyTrack = self
                    .get_json(format!("{API_BASE}/tracks/{id}"), access_token)
                    .await?;
                Ok(vec![track.into()])
            }
            EntityKind::Album => {
                let url = format!("{API_BASE}/albums/{id}/tracks?limit={page_size}");
                self.collect_pages(url, access_token, limit, |t: SpotifyTrack| Some(t.into()))
                    .await
            }
            EntityKind::Playlist => {
                let url = format!("{API_BASE}/playlists/{id}/tracks?limit={page_size}");
                self.collect_pages(url, access_token, limit, |item: PlaylistItem| {
                    item.track.map(Into::into)
                })
                .await
            }
            other => Err(Error::Platform(format!("spotify cannot fetch {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::canned::CannedHttp;

    fn api(http: Arc<CannedHttp>) -> SpotifyApi {
        SpotifyApi::new(
            http,
            ProviderCredentials { client_id: "id".into(), client_secret: "secret".into() },
        )
    }

    #[tokio::test]
    async fn test_authorize_uses_basic_auth() {
        let http = Arc::new(CannedHttp::new(&[(
            TOKEN_URL,
            r#"{"access_token":"BQD","token_type":"Bearer","expires_in":3600}"#,
        )]));
        let cred = api(http.clone()).authorize().await.unwrap();
        assert_eq!(cred.access_token, "BQD");
        assert_eq!(cred.expires_in_secs, 3600);

        let seen = http.requests();
        // base64("id:secret")
        assert_eq!(seen[0].headers.get("Authorization").unwrap(), "Basic aWQ6c2VjcmV0");
    }

    #[tokio::test]
    async fn test_fetch_single_track() {
        let http = Arc::new(CannedHttp::new(&[(
            "https://api.spotify.com/v1/tracks/abc",
            r#"{"name":"Harder, Better","artists":[{"name":"Daft Punk","type":"artist"}]}"#,
        )]));
        let tracks = api(http.clone())
            .fetch_tracks(EntityKind::Track, "abc", "tok", 100)
            .await
            .unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].qualified_name(), "Daft Punk - Harder, Better");
        assert_eq!(http.requests()[0].headers.get("Authorization").unwrap(), "Bearer tok");
    }

    #[tokio::test]
    async fn test_fetch_playlist_follows_pages_and_skips_removed() {
        let http = Arc::new(CannedHttp::new(&[
            (
                "https://api.spotify.com/v1/playlists/p1/tracks?limit=2",
                r#"{"items":[{"track":{"name":"A","artists":[{"name":"X","type":"artist"}]}},{"track":null}],
                    "next":"https://api.spotify.com/v1/playlists/p1/tracks?offset=2&limit=2"}"#,
            ),
            (
                "https://api.spotify.com/v1/playlists/p1/tracks?offset=2&limit=2",
                r#"{"items":[{"track":{"name":"B","artists":[{"name":"Y","type":"artist"}]}},
                             {"track":{"name":"C","artists":[]}}],"next":null}"#,
            ),
        ]));
        let tracks = api(http)
            .fetch_tracks(EntityKind::Playlist, "p1", "tok", 2)
            .await
            .unwrap();
        let names: Vec<String> = tracks.iter().map(|t| t.qualified_name()).collect();
        assert_eq!(names, vec!["X - A", "Y - B"]);
    }

    #[tokio::test]
    async fn test_unsupported_kinds() {
        let http = Arc::new(CannedHttp::new(&[]));
        let spotify = api(http);
        assert!(spotify.supports(EntityKind::Album));
        assert!(!spotify.supports(EntityKind::Artist));
        assert!(!spotify.supports(EntityKind::Mix));
    }
}
