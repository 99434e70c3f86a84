//! Markup -> [`SearchIndex`].
//!
//! Only HTML anchors are scanned: they are both the relevant keywords and
//! directly linkable. Each anchor is registered under its full fragment and
//! every dotted suffix of it, so `term-lambda` is also known as `lambda` and
//! `urllib.request.FTPHandler` as `FTPHandler`.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::index::{Entry, SearchIndex};

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="(.+?#.+?)">([^<]+)</a>"#).expect("anchor pattern compiles")
});
static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W").expect("non-word pattern compiles"));
static PAGE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\.html").expect("page name pattern compiles"));

/// One `<a href="link#fragment">text</a>` match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor<'a> {
    pub link: &'a str,
    pub text: &'a str,
}

impl<'a> Anchor<'a> {
    /// Page part of the link (before the first `#`).
    pub fn page_url(&self) -> &'a str {
        self.link.split_once('#').map_or(self.link, |(url, _)| url)
    }

    pub fn fragment(&self) -> &'a str {
        self.link.split_once('#').map_or("", |(_, frag)| frag)
    }
}

/// Anchors with a fragment and non-empty text. Anything else is skipped.
pub fn scan_anchors(markup: &str) -> impl Iterator<Item = Anchor<'_>> {
    ANCHOR_RE.captures_iter(markup).filter_map(|caps| {
        Some(Anchor {
            link: caps.get(1)?.as_str(),
            text: caps.get(2)?.as_str(),
        })
    })
}

/// `(key, link)` pairs for one anchor, in registration order.
///
/// Keys are lower-cased. Fragment suffixes come first (shortest first), then
/// the page name (pointing at the page itself), then the visible text.
pub fn derive_keys(anchor: &Anchor<'_>) -> Vec<(String, String)> {
    let chunks: Vec<&str> = NON_WORD_RE.split(anchor.fragment()).collect();
    let mut out: Vec<(String, String)> = (0..chunks.len())
        .rev()
        .map(|start| (chunks[start..].join(".").to_lowercase(), anchor.link.to_string()))
        .collect();

    let page_url = anchor.page_url();
    if let Some(name) = PAGE_NAME_RE.captures(page_url).and_then(|c| c.get(1)) {
        out.push((name.as_str().to_lowercase(), page_url.to_string()));
    }

    out.push((anchor.text.to_lowercase(), anchor.link.to_string()));
    out
}

#[derive(Debug, Clone)]
pub struct IndexBuilder {
    base_url: String,
}

impl IndexBuilder {
    /// `base_url` is prefixed verbatim to every relative link, so it should
    /// end with `/`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Parse `markup` into a frozen index. Markup without any matching anchor
    /// gives an empty index, never an error.
    pub fn build(&self, markup: &str) -> SearchIndex {
        let mut anchors = 0usize;
        let mut candidates = 0usize;
        let entries = scan_anchors(markup)
            .inspect(|_| anchors += 1)
            .flat_map(|a| derive_keys(&a))
            .inspect(|_| candidates += 1)
            .fold(BTreeMap::<String, Entry>::new(), |mut acc, (key, link)| {
                let entry = acc.remove(&key).unwrap_or_else(|| Entry::new(key.as_str()));
                acc.insert(key, entry.register(&link));
                acc
            });

        tracing::debug!(
            base_url = %self.base_url,
            anchors,
            candidates,
            keywords = entries.len(),
            "built search index"
        );
        SearchIndex::from_entries(self.base_url.clone(), entries)
    }
}
