use pydocsearch_core::{Error, FetchBackend, FetchRequest, FetchResponse, Result};
use std::collections::BTreeMap;
use std::time::Duration;

pub mod cache;
pub mod config;

pub use cache::IndexCache;
pub use config::DocsConfig;

#[derive(Debug, Clone)]
pub struct LocalFetcher {
    client: reqwest::Client,
}

impl LocalFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pydocsearch/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            // Per-request timeouts (FetchRequest.timeout_ms) can still override this.
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Fetch(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl FetchBackend for LocalFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        let mut timings_ms = BTreeMap::new();
        let t_req = std::time::Instant::now();
        let url = url::Url::parse(&req.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        tracing::info!(url = %url, "fetching index page");

        let mut rb = self.client.get(url);
        if let Some(to) = req.timeout() {
            rb = rb.timeout(to);
        }
        let resp = rb.send().await.map_err(|e| Error::Fetch(e.to_string()))?;
        let final_url = resp.url().to_string();
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("{final_url}: http status {}", status.as_u16())));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let max_bytes = req.max_bytes.unwrap_or(u64::MAX) as usize;
        let mut truncated = false;
        let mut bytes = Vec::new();
        let mut stream = resp.bytes_stream();
        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Fetch(e.to_string()))?;
            if bytes.len().saturating_add(chunk.len()) > max_bytes {
                let can_take = max_bytes.saturating_sub(bytes.len());
                bytes.extend_from_slice(&chunk[..can_take]);
                truncated = true;
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        timings_ms.insert("network_fetch".to_string(), t_req.elapsed().as_millis());
        tracing::info!(
            url = %final_url,
            status = status.as_u16(),
            bytes = bytes.len(),
            truncated,
            elapsed_ms = t_req.elapsed().as_millis() as u64,
            "fetched index page"
        );
        Ok(FetchResponse {
            url: req.url.clone(),
            final_url,
            status: status.as_u16(),
            content_type,
            bytes,
            truncated,
            timings_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::header, http::StatusCode, routing::get, Router};
    use std::net::SocketAddr;

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn local_fetcher_returns_body_and_metadata() {
        let addr = serve(Router::new().route(
            "/3.5/genindex-all.html",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "text/html")],
                    r#"<a href="glossary.html#term-lambda">lambda</a>"#,
                )
            }),
        ))
        .await;

        let fetcher = LocalFetcher::new().unwrap();
        let mut req = FetchRequest::get(format!("http://{addr}/3.5/genindex-all.html"));
        req.timeout_ms = Some(2_000);
        let resp = fetcher.fetch(&req).await.unwrap();
        assert_eq!(resp.status, 200);
        assert!(!resp.truncated);
        assert_eq!(resp.content_type.as_deref(), Some("text/html"));
        assert!(resp.text_lossy().contains("term-lambda"));
        assert!(resp.is_html());
        assert!(resp.fetch_ms().is_some());
    }

    #[tokio::test]
    async fn local_fetcher_maps_http_errors_to_fetch_error() {
        let addr = serve(Router::new().route(
            "/",
            get(|| async { (StatusCode::NOT_FOUND, "no such version") }),
        ))
        .await;

        let fetcher = LocalFetcher::new().unwrap();
        let err = fetcher
            .fetch(&FetchRequest::get(format!("http://{addr}/")))
            .await
            .unwrap_err();
        match err {
            Error::Fetch(msg) => assert!(msg.contains("404"), "unexpected message: {msg}"),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn local_fetcher_reports_connection_failure_as_fetch_error() {
        // Bind then drop so the port is (very likely) closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher = LocalFetcher::new().unwrap();
        let mut req = FetchRequest::get(format!("http://{addr}/"));
        req.timeout_ms = Some(2_000);
        let err = fetcher.fetch(&req).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn local_fetcher_rejects_invalid_url() {
        let fetcher = LocalFetcher::new().unwrap();
        let err = fetcher
            .fetch(&FetchRequest::get("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn local_fetcher_truncates_at_max_bytes() {
        let big = "x".repeat(20_000);
        let addr = serve(Router::new().route(
            "/",
            get(move || {
                let body = big.clone();
                async move { ([(header::CONTENT_TYPE, "text/html")], body) }
            }),
        ))
        .await;

        let fetcher = LocalFetcher::new().unwrap();
        let mut req = FetchRequest::get(format!("http://{addr}/"));
        req.max_bytes = Some(200);
        let resp = fetcher.fetch(&req).await.unwrap();
        assert!(resp.truncated);
        assert_eq!(resp.bytes.len(), 200);
    }
}
