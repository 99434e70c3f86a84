use serde::Serialize;
use std::collections::BTreeMap;

use crate::scoring::link_weight;

/// Keywords whose canonical page can't be derived from the index page.
pub const OVERRIDES: &[(&str, &str)] = &[("pip", "installing/index.html")];

/// All candidate links seen for one normalized keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    keyword: String,
    candidates: BTreeMap<String, f64>,
    best_link: Option<String>,
}

impl Entry {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            candidates: BTreeMap::new(),
            best_link: None,
        }
    }

    /// Add `link` as a candidate. It becomes the best link only when it
    /// strictly outscores the current one, so the first of equal scores stays.
    pub fn register(mut self, link: &str) -> Self {
        let score = link_weight(link);
        self.candidates.insert(link.to_string(), score);
        let replace = match self.best_link.as_deref() {
            None => true,
            Some(best) => score > self.candidates.get(best).copied().unwrap_or(f64::MIN),
        };
        if replace {
            self.best_link = Some(link.to_string());
        }
        self
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn candidates(&self) -> &BTreeMap<String, f64> {
        &self.candidates
    }

    pub fn best_link(&self) -> Option<&str> {
        self.best_link.as_deref()
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best_link
            .as_deref()
            .and_then(|l| self.candidates.get(l).copied())
    }
}

/// Frozen keyword -> best link mapping for one documentation version.
#[derive(Debug, Clone, Serialize)]
pub struct SearchIndex {
    base_url: String,
    entries: BTreeMap<String, Entry>,
}

impl SearchIndex {
    pub(crate) fn from_entries(base_url: String, entries: BTreeMap<String, Entry>) -> Self {
        Self { base_url, entries }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `keyword`, case-insensitively. Overrides win over the
    /// built mapping.
    pub fn lookup(&self, keyword: &str) -> Option<String> {
        let keyword = keyword.to_lowercase();
        if let Some((_, path)) = OVERRIDES.iter().find(|(k, _)| *k == keyword) {
            return Some(format!("{}{}", self.base_url, path));
        }
        self.entries
            .get(&keyword)
            .and_then(Entry::best_link)
            .map(|link| format!("{}{}", self.base_url, link))
    }

    pub fn entry(&self, keyword: &str) -> Option<&Entry> {
        self.entries.get(&keyword.to_lowercase())
    }

    /// Entries ordered by keyword.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
