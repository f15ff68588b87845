//! GraphQL display-URL lookup client
//!
//! Resolves a post (shortcode or full post URL) to the URL of its display image.
//! Every failure comes back as a [`LookupError`] value; nothing panics or escapes.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use thumbfetch_common::FetchConfig;

use crate::utils::retry_transient;

/// Inputs containing this marker are treated as post URLs
const HOST_MARKER: &str = "instagram.com";
const POST_PATH_MARKER: &str = "/p/";
const POST_URL_PREFIX: &str = "https://www.instagram.com/p/";
const APP_ID_HEADER: &str = "x-ig-app-id";

/// Lookup client errors
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Display URL not found in response")]
    MissingDisplayUrl,
}

/// Anything that can turn a post into its display URL
///
/// Implemented by [`GraphQlClient`]; tests substitute a stub.
#[async_trait]
pub trait DisplayUrlLookup: Send + Sync {
    /// `post` is a raw shortcode or a post URL containing one
    async fn display_url(&self, post: &str) -> Result<String, LookupError>;
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    xdt_shortcode_media: Option<ShortcodeMedia>,
}

#[derive(Debug, Deserialize)]
struct ShortcodeMedia {
    display_url: Option<String>,
}

/// Extract the shortcode from a post URL, or trim a bare shortcode
pub fn normalize_shortcode(post: &str) -> String {
    if post.contains(HOST_MARKER) {
        let tail = post.rsplit(POST_PATH_MARKER).next().unwrap_or(post);
        tail.split('/').next().unwrap_or(tail).to_string()
    } else {
        post.trim().to_string()
    }
}

/// Canonical post URL for a shortcode
pub fn post_url(shortcode: &str) -> String {
    format!("{}{}/", POST_URL_PREFIX, shortcode)
}

/// The `variables` object sent with every query
pub fn query_variables(shortcode: &str) -> Value {
    json!({
        "shortcode": shortcode,
        "fetch_comment_count": 0,
        "parent_comment_count": 0,
        "has_threaded_comments": true,
        "hoisted_comment_id": null,
        "hoisted_reply_id": null,
        "hoisted_reply_author_id": null,
    })
}

/// HTTP client for the GraphQL query endpoint
pub struct GraphQlClient {
    http_client: reqwest::Client,
    endpoint: String,
    doc_id: String,
    max_transport_retries: u32,
}

impl GraphQlClient {
    /// Build the shared HTTP client: fixed headers, timeout and optional proxy from config
    pub fn new(config: &FetchConfig) -> Result<Self, LookupError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(APP_ID_HEADER),
            HeaderValue::from_str(&config.app_id)
                .map_err(|e| LookupError::Client(format!("invalid app id: {}", e)))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.request_timeout());

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url.as_str())
                .map_err(|e| LookupError::Client(format!("invalid proxy {}: {}", proxy_url, e)))?;
            tracing::info!(proxy = %proxy_url, "Routing lookups through proxy");
            builder = builder.proxy(proxy);
        }

        let http_client = builder
            .build()
            .map_err(|e| LookupError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            doc_id: config.doc_id.clone(),
            max_transport_retries: config.max_transport_retries,
        })
    }

    /// Look up the display URL for a post, logging the cause on failure
    pub async fn lookup(&self, post: &str) -> Result<String, LookupError> {
        let shortcode = normalize_shortcode(post);

        let result = self.fetch(&shortcode).await;
        if let Err(e) = &result {
            tracing::warn!(shortcode = %shortcode, error = %e, "Error fetching display URL");
        }
        result
    }

    async fn fetch(&self, shortcode: &str) -> Result<String, LookupError> {
        let variables = query_variables(shortcode).to_string();

        tracing::debug!(shortcode = %shortcode, endpoint = %self.endpoint, "Querying GraphQL endpoint");

        let response = retry_transient(
            shortcode,
            self.max_transport_retries,
            |e: &reqwest::Error| e.is_connect() || e.is_timeout(),
            || {
                self.http_client
                    .get(&self.endpoint)
                    .query(&[
                        ("doc_id", self.doc_id.as_str()),
                        ("variables", variables.as_str()),
                    ])
                    .send()
            },
        )
        .await
        .map_err(|e| LookupError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let parsed: GraphQlResponse =
            serde_json::from_str(&body).map_err(|e| LookupError::Parse(e.to_string()))?;

        parsed
            .data
            .and_then(|d| d.xdt_shortcode_media)
            .and_then(|m| m.display_url)
            .filter(|url| !url.is_empty())
            .ok_or(LookupError::MissingDisplayUrl)
    }
}

#[async_trait]
impl DisplayUrlLookup for GraphQlClient {
    async fn display_url(&self, post: &str) -> Result<String, LookupError> {
        self.lookup(post).await
    }
}
