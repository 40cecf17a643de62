// File: src/platforms/catalog/tidal.rs
//
// TIDAL open API. Only single tracks and an artist's top tracks are
// reachable with client credentials.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use tracing::debug;

use jukebot_common::models::{CatalogArtist, CatalogTrack, Credential, EntityKind};

use crate::config::ProviderCredentials;
use crate::http::{Headers, HttpClient};
use crate::platforms::CatalogApi;
use crate::Error;

const TOKEN_URL: &str = "https://auth.tidal.com/v1/oauth2/token";
const API_BASE: &str = "https://openapi.tidal.com";
const MEDIA_TYPE: &str = "application/vnd.tidal.v1+json";

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct TidalArtist {
    name: String,
    #[serde(default)]
    main: bool,
}

#[derive(Deserialize)]
struct TidalTrack {
    title: String,
    #[serde(default)]
    artists: Vec<TidalArtist>,
}

#[derive(Deserialize)]
struct Wrapped {
    resource: Option<TidalTrack>,
}

#[derive(Deserialize)]
struct MultiStatus {
    #[serde(default)]
    data: Vec<Wrapped>,
}

impl From<TidalTrack> for CatalogTrack {
    fn from(t: TidalTrack) -> Self {
        CatalogTrack {
            title: t.title,
            artists: t
                .artists
                .into_iter()
                .map(|a| CatalogArtist { name: a.name, primary: a.main })
                .collect(),
        }
    }
}

pub struct TidalApi {
    http: Arc<dyn HttpClient>,
    credentials: ProviderCredentials,
    country_code: String,
}

impl TidalApi {
    pub fn new(
        http: Arc<dyn HttpClient>,
        credentials: ProviderCredentials,
        country_code: impl Into<String>,
    ) -> Self {
        Self {
            http,
            credentials,
            country_code: country_code.into(),
        }
    }

    fn headers(token: &str) -> Headers {
        HashMap::from([
            ("Authorization".to_string(), format!("Bearer {token}")),
            ("Accept".to_string(), MEDIA_TYPE.to_string()),
            ("Content-Type".to_string(), MEDIA_TYPE.to_string()),
        ])
    }
}

#[async_trait]
impl CatalogApi for TidalApi {
    fn provider_name(&self) -> &'static str {
        "tidal"
    }

    fn host_marker(&self) -> &'static str {
        "tidal"
    }

    fn supports(&self, kind: EntityKind) -> bool {
        matches!(kind, EntityKind::Track | EntityKind::Artist)
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
            .map_err(|e| Error::Auth(format!("Parse error on TIDAL token JSON: {e}")))?;
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
        let country = urlencoding::encode(&self.country_code);
        debug!("(TidalApi) fetch {} {}", kind, entity_id);

        match kind {
            EntityKind::Track => {
                let url = format!("{API_BASE}/tracks/{id}?countryCode={country}");
                let body = self.http.get(url, Self::headers(access_token)).await?;
                let wrapped: Wrapped = serde_json::from_str(&body)?;
                Ok(wrapped.resource.map(Into::into).into_iter().collect())
            }
            EntityKind::Artist => {
                let url = format!(
                    "{API_BASE}/artists/{id}/tracks?countryCode={country}&offset=0&limit={limit}"
                );
                let body = self.http.get(url, Self::headers(access_token)).await?;
                let multi: MultiStatus = serde_json::from_str(&body)?;
                Ok(multi
                    .data
                    .into_iter()
                    .filter_map(|w| w.resource.map(Into::into))
                    .take(limit)
                    .collect())
            }
            other => Err(Error::Platform(format!("tidal cannot fetch {other}"))),
        }
    }
}
