//! Memoized fetch-and-build, keyed by documentation version.
//!
//! At most `capacity` versions are retained; the least recently used one is
//! evicted beyond that. Concurrent loads of the same version share a single
//! fetch. A failed load leaves nothing behind, so the next call retries.

use lru::LruCache;
use pydocsearch_core::{FetchBackend, FetchRequest, IndexBuilder, Result, SearchIndex};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

use crate::config::DocsConfig;

pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(16) {
    Some(n) => n,
    None => unreachable!(),
};

type Slot = Arc<OnceCell<Arc<SearchIndex>>>;

pub struct IndexCache<F> {
    fetcher: F,
    config: DocsConfig,
    slots: Mutex<LruCache<String, Slot>>,
}

impl<F: FetchBackend> IndexCache<F> {
    pub fn new(fetcher: F, config: DocsConfig) -> Self {
        Self::with_capacity(fetcher, config, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(fetcher: F, config: DocsConfig, capacity: NonZeroUsize) -> Self {
        Self {
            fetcher,
            config,
            slots: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn config(&self) -> &DocsConfig {
        &self.config
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, LruCache<String, Slot>> {
        // No operation under this lock can leave the map half-updated.
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn slot_for(&self, version: &str) -> Slot {
        let mut slots = self.slots();
        if let Some(slot) = slots.get(version) {
            tracing::debug!(version, "index cache hit");
            return Arc::clone(slot);
        }
        tracing::debug!(version, "index cache miss");
        let slot: Slot = Arc::new(OnceCell::new());
        if let Some((evicted, _)) = slots.push(version.to_string(), Arc::clone(&slot)) {
            tracing::debug!(version = %evicted, "index cache evicted");
        }
        slot
    }

    /// Index for `version`, fetching and building it on first use.
    pub async fn load(&self, version: &str) -> Result<Arc<SearchIndex>> {
        let slot = self.slot_for(version);
        match slot.get_or_try_init(|| self.build(version)).await {
            Ok(index) => {
                // A failed load by another caller may have dropped this slot
                // while it was still being filled.
                self.retain(version, &slot);
                Ok(Arc::clone(index))
            }
            Err(e) => {
                let mut slots = self.slots();
                if slots
                    .peek(version)
                    .is_some_and(|current| Arc::ptr_eq(current, &slot))
                {
                    slots.pop(version);
                }
                Err(e)
            }
        }
    }

    fn retain(&self, version: &str, slot: &Slot) {
        let mut slots = self.slots();
        if slots.get(version).is_some_and(|current| current.initialized()) {
            return;
        }
        tracing::debug!(version, "index cache refilled");
        if let Some((evicted, _)) = slots.push(version.to_string(), Arc::clone(slot)) {
            if evicted != version {
                tracing::debug!(version = %evicted, "index cache evicted");
            }
        }
    }

    /// Lookup `keyword` in the index for `version`.
    pub async fn search(&self, version: &str, keyword: &str) -> Result<Option<String>> {
        Ok(self.load(version).await?.lookup(keyword))
    }

    /// Versions currently held, most recently used first.
    pub fn cached_versions(&self) -> Vec<String> {
        self.slots().iter().map(|(k, _)| k.clone()).collect()
    }

    async fn build(&self, version: &str) -> Result<Arc<SearchIndex>> {
        let base_url = self.config.base_url(version)?;
        let mut req = FetchRequest::get(format!("{base_url}{}", self.config.index_page));
        req.timeout_ms = Some(self.config.timeout_ms);
        let resp = self.fetcher.fetch(&req).await?;
        if resp.truncated {
            tracing::warn!(url = %resp.final_url, "index page was truncated");
        }
        if !resp.is_html() {
            tracing::warn!(
                url = %resp.final_url,
                content_type = resp.content_type.as_deref().unwrap_or(""),
                "index page is not html"
            );
        }
        let index = IndexBuilder::new(base_url).build(&resp.text_lossy());
        tracing::info!(
            version,
            keywords = index.len(),
            fetch_ms = resp.fetch_ms().map(|ms| ms as u64),
            "index ready"
        );
        Ok(Arc::new(index))
    }
}
