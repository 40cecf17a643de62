//! HTTP client abstraction shared by the catalog providers and the audio node
//!
//! Everything that talks to a remote REST API goes through [`HttpClient`], so
//! tests can swap in canned responses without a network. The default
//! implementation wraps reqwest with a bounded request timeout.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use tracing::trace;

use crate::Error;

pub type Headers = HashMap<String, String>;

/// A generic trait for making HTTP requests. Every method returns the
/// response body on 2xx.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: String, headers: Headers) -> Result<String, Error>;
    async fn post_form(
        &self,
        url: String,
        form: Vec<(String, String)>,
        headers: Headers,
    ) -> Result<String, Error>;
    async fn patch_json(
        &self,
        url: String,
        body: serde_json::Value,
        headers: Headers,
    ) -> Result<String, Error>;
    async fn delete(&self, url: String, headers: Headers) -> Result<String, Error>;
}

#[derive(Clone)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}

impl DefaultHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    async fn send(request: RequestBuilder, headers: Headers) -> Result<String, Error> {
        let mut request = request;
        for (key, value) in headers {
            request = request.header(&key, value);
        }
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await?;
        trace!("(HttpClient) {} => {}", url, status);
        check_status(status, &url, body)
    }
}

/// Maps non-success statuses to the error variants callers branch on.
fn check_status(status: StatusCode, url: &str, body: String) -> Result<String, Error> {
    if status.is_success() {
        return Ok(body);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(Error::Auth(format!("{status} from {url}: {body}")))
        }
        StatusCode::NOT_FOUND => Err(Error::NotFound(url.to_string())),
        _ => Err(Error::Platform(format!("{status} from {url}: {body}"))),
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn get(&self, url: String, headers: Headers) -> Result<String, Error> {
        Self::send(self.client.get(&url), headers).await
    }

    async fn post_form(
        &self,
        url: String,
        form: Vec<(String, String)>,
        headers: Headers,
    ) -> Result<String, Error> {
        Self::send(self.client.post(&url).form(&form), headers).await
    }

    async fn patch_json(
        &self,
        url: String,
        body: serde_json::Value,
        headers: Headers,
    ) -> Result<String, Error> {
        Self::send(self.client.patch(&url).json(&body), headers).await
    }

    async fn delete(&self, url: String, headers: Headers) -> Result<String, Error> {
        Self::send(self.client.delete(&url), headers).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(check_status(StatusCode::OK, "u", "body".into()).unwrap(), "body");
        assert!(matches!(
            check_status(StatusCode::UNAUTHORIZED, "u", String::new()),
            Err(Error::Auth(_))
        ));
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND, "u", String::new()),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY, "u", String::new()),
            Err(Error::Platform(_))
        ));
    }
}
