use super::auth::{encode, OAuthSigner};
use super::types::*;
use super::FeedClient;
use crate::config::{Credentials, FeedConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const SEARCH_PATH: &str = "/1.1/search/tweets.json";
const UPDATE_PATH: &str = "/1.1/statuses/update.json";

/// Twitter v1.1 REST client: recent search plus status updates.
pub struct TwitterClient {
    client: Client,
    signer: OAuthSigner,
    base_url: String,
}

impl TwitterClient {
    pub fn new(config: &FeedConfig, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            signer: OAuthSigner::new(credentials),
            base_url: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Encode params into a query string with the same encoding the signature uses.
fn query_string(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[async_trait]
impl FeedClient for TwitterClient {
    async fn fetch_since(&mut self, filter: &SearchFilter, since_id: u64) -> Result<Vec<Post>> {
        let url = self.url(SEARCH_PATH);
        let params = filter.query_params(since_id);
        let auth = self.signer.authorization("GET", &url, &params);

        let resp = self
            .client
            .get(format!("{}?{}", url, query_string(&params)))
            .header(reqwest::header::AUTHORIZATION, auth)
            .send()
            .await
            .context("search request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("search failed ({}): {}", status, body);
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .context("failed to parse search response")?;

        Ok(parsed.statuses.into_iter().map(Post::from).collect())
    }

    async fn publish(&mut self, text: &str) -> Result<()> {
        let url = self.url(UPDATE_PATH);
        let params = vec![("status".to_string(), text.to_string())];
        let auth = self.signer.authorization("POST", &url, &params);

        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(query_string(&params))
            .send()
            .await
            .context("status update request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("status update failed ({}): {}", status, body);
        }
        Ok(())
    }
}
