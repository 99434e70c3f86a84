use pydocsearch_core::{Error, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL_TEMPLATE: &str = "https://docs.python.org/{version}/";
pub const DEFAULT_INDEX_PAGE: &str = "genindex-all.html";
pub const DEFAULT_VERSION: &str = "3.5";
pub const DEFAULT_TIMEOUT_MS: u64 = 20_000;

/// Where to find the index page for a given documentation version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocsConfig {
    /// `{version}` is replaced by the requested version identifier.
    pub base_url_template: String,
    /// Index page, relative to the base URL.
    pub index_page: String,
    pub timeout_ms: u64,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            base_url_template: DEFAULT_BASE_URL_TEMPLATE.to_string(),
            index_page: DEFAULT_INDEX_PAGE.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl DocsConfig {
    /// Base documentation URL for `version`, always ending with `/`.
    pub fn base_url(&self, version: &str) -> Result<String> {
        let mut base = self.base_url_template.replace("{version}", version);
        if !base.ends_with('/') {
            base.push('/');
        }
        url::Url::parse(&base).map_err(|e| Error::InvalidUrl(format!("{base}: {e}")))?;
        Ok(base)
    }

    pub fn index_url(&self, version: &str) -> Result<String> {
        Ok(format!("{}{}", self.base_url(version)?, self.index_page))
    }
}
