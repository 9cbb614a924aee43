// src/fetch/http.rs
// =============================================================================
// A Retriever that fetches real web pages.
//
// For each node id:
// 1. Parse the id as an http(s) URL
// 2. GET it (following up to N redirects)
// 3. Non-2xx responses become FetchErrors (404/410 = NotFound)
// 4. Extract links from the body - markdown for .md / text/markdown,
//    HTML for everything else
// 5. Optionally drop links that leave the allowed host
//
// The reqwest Client is built once and shared; it pools connections
// internally and is safe to use from any number of tasks concurrently.
// =============================================================================

use super::links::{extract_html_links, extract_markdown_links};
use super::{Page, Retriever};
use crate::config::HttpConfig;
use crate::error::{ConfigError, FetchError, FetchErrorKind};
use crate::NodeId;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;
use url::Url;

/// Fetches pages over HTTP(S) and turns their links into edges.
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: Client,
    config: HttpConfig,
}

impl HttpRetriever {
    pub fn new(config: HttpConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    // Turns the body into edges, honoring the host restriction
    //
    // This is a plain (non-async) function on purpose: scraper's Html
    // document is not Send, so it must never be held across an .await.
    fn extract_edges(&self, body: &str, page_url: &Url, is_markdown: bool) -> Vec<NodeId> {
        let links = if is_markdown {
            extract_markdown_links(body, page_url)
        } else {
            extract_html_links(body, page_url)
        };

        links
            .into_iter()
            .filter(|link| match &self.config.allowed_host {
                Some(host) => link.host_str() == Some(host.as_str()),
                None => true,
            })
            .map(NodeId::from)
            .collect()
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn fetch(&self, id: &NodeId) -> Result<Page, FetchError> {
        let fail = |kind| FetchError::new(id.clone(), kind);

        let url = Url::parse(id.as_str())
            .map_err(|e| fail(FetchErrorKind::InvalidId(e.to_string())))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(fail(FetchErrorKind::InvalidId(format!(
                "unsupported scheme '{}'",
                url.scheme()
            ))));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fail(categorize_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(categorize_status(status)));
        }

        // Resolve relative links against where we ended up after redirects
        let final_url = response.url().clone();
        let is_markdown = is_markdown(&response, &final_url);

        let body = response
            .text()
            .await
            .map_err(|e| fail(categorize_error(&e)))?;

        let edges = self.extract_edges(&body, &final_url, is_markdown);
        debug!(url = %final_url, edges = edges.len(), "fetched page");

        Ok(Page {
            content: body,
            edges,
        })
    }
}

fn is_markdown(response: &reqwest::Response, url: &Url) -> bool {
    let content_type_says_markdown = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("markdown"))
        .unwrap_or(false);

    content_type_says_markdown || url.path().ends_with(".md")
}

// Maps a non-success HTTP status onto an error kind
//
// 404 Not Found / 410 Gone mean the page is definitely not there; anything
// else (500s, 403s, ...) is reported with its status code.
fn categorize_status(status: StatusCode) -> FetchErrorKind {
    if matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE) {
        FetchErrorKind::NotFound
    } else {
        FetchErrorKind::Status(status.as_u16())
    }
}

// Categorizes transport errors from reqwest
fn categorize_error(error: &reqwest::Error) -> FetchErrorKind {
    let error_string = error.to_string();

    if error.is_timeout() {
        FetchErrorKind::Timeout
    } else if error.is_redirect() {
        FetchErrorKind::TooManyRedirects
    } else if error.is_connect() {
        FetchErrorKind::Connect(error_string)
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        FetchErrorKind::Tls(error_string)
    } else {
        FetchErrorKind::Other(error_string)
    }
}
