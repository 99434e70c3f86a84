//! Keyword index over a reference manual's alphabetical index page.
//!
//! This crate contains no IO: fetching is abstracted behind [`FetchBackend`],
//! and [`IndexBuilder`] turns already-fetched markup into a [`SearchIndex`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub mod builder;
pub mod index;
pub mod scoring;

pub use builder::IndexBuilder;
pub use index::{Entry, SearchIndex};
pub use scoring::link_weight;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    /// Timeout for the whole request (connect + body).
    pub timeout_ms: Option<u64>,
    /// Hard cap on bytes read from the response body.
    pub max_bytes: Option<u64>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: None,
            max_bytes: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub truncated: bool,
    pub timings_ms: BTreeMap<String, u128>,
}

impl FetchResponse {
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).to_string()
    }

    /// True when the server labelled the body as HTML, or did not label it.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map_or(true, |ct| ct.to_ascii_lowercase().contains("html"))
    }

    pub fn fetch_ms(&self) -> Option<u128> {
        self.timings_ms.get("network_fetch").copied()
    }
}

/// Anything that can retrieve the raw index page.
///
/// Implementations report transport failures as [`Error::Fetch`] and never retry.
#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(content_type: Option<&str>) -> FetchResponse {
        FetchResponse {
            url: "https://docs.example.org/3/genindex-all.html".to_string(),
            final_url: "https://docs.example.org/3/genindex-all.html".to_string(),
            status: 200,
            content_type: content_type.map(str::to_string),
            bytes: Vec::new(),
            truncated: false,
            timings_ms: BTreeMap::from([("network_fetch".to_string(), 12)]),
        }
    }

    #[test]
    fn html_detection_follows_content_type() {
        assert!(response(Some("text/html; charset=utf-8")).is_html());
        assert!(response(Some("application/xhtml+xml")).is_html());
        assert!(response(None).is_html());
        assert!(!response(Some("application/pdf")).is_html());
    }

    #[test]
    fn fetch_ms_reads_network_timing() {
        assert_eq!(response(None).fetch_ms(), Some(12));
    }
}
