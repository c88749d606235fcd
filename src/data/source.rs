//! HTTP source for the user directory page
//!
//! Fetches the current HTML of the directory page. One request per fetch,
//! no retries; timeouts are whatever the HTTP client defaults to.

use reqwest::blocking::Client;
use thiserror::Error;
use tracing::debug;

/// The page listing every HPC user with their display name
pub const DEFAULT_URL: &str = "http://ldapweb.iitd.ac.in/LDAP/iitd/hpcusers.shtml";

/// Errors that can occur when fetching the directory page
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed or returned a non-success status
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Anything that can hand back the current HTML of the directory page
pub trait PageSource {
    fn fetch_page(&self) -> Result<String, FetchError>;
}

/// Client for fetching the directory page over HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    /// HTTP client for making requests
    http_client: Client,
    /// Page URL (allows override for testing)
    url: String,
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

impl HttpSource {
    /// Creates a new HttpSource for the given page URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            url: url.into(),
        }
    }

    /// Creates a new HttpSource with a preconfigured client
    pub fn with_client(http_client: Client, url: impl Into<String>) -> Self {
        Self {
            http_client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PageSource for HttpSource {
    fn fetch_page(&self) -> Result<String, FetchError> {
        debug!(url = %self.url, "Fetching directory page");

        let body = self
            .http_client
            .get(&self.url)
            .send()?
            .error_for_status()?
            .text()?;

        Ok(body)
    }
}
