//! Link scoring.
//!
//! Two signals, each roughly in `0..=1`:
//! - shorter links are generally more canonical (`library/os.html#os.wait`
//!   beats `library/asyncio-subprocess.html#asyncio.subprocess.Process.wait`);
//! - highly visited pages get a fixed bonus.

use regex::Regex;
use std::sync::LazyLock;

static PAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+\.html").expect("page pattern compiles"));

/// Page filename -> bonus. Mostly visitor counts, plus two manual bonuses:
/// `datamodel.html` so `__str__` doesn't resolve to `datetime.html`, and
/// `operator.html` so `__add__` doesn't resolve to `datamodel.html`.
pub const POPULARITY: &[(&str, f64)] = &[
    ("functions.html", 1.0),
    ("glossary.html", 1.0),
    ("stdtypes.html", 0.9),
    ("string.html", 0.8),
    ("re.html", 0.7),
    ("datetime.html", 0.6),
    ("builtins.html", 0.5),
    ("exceptions.html", 0.1),
    ("datamodel.html", 0.8),
    ("operator.html", 0.8),
];

/// First `<word-chars>.html` found anywhere in `link`.
pub fn page_of(link: &str) -> Option<&str> {
    PAGE_RE.find(link).map(|m| m.as_str())
}

pub fn visit_weight(page: &str) -> f64 {
    POPULARITY
        .iter()
        .find(|(name, _)| *name == page)
        .map(|(_, w)| *w)
        .unwrap_or(0.0)
}

pub fn length_weight(link: &str) -> f64 {
    let len = link.chars().count();
    if len == 0 {
        return 0.0;
    }
    1.0 / (len as f64).sqrt()
}

/// Score of a candidate link; higher is better.
pub fn link_weight(link: &str) -> f64 {
    let visit = page_of(link).map(visit_weight).unwrap_or(0.0);
    length_weight(link) + visit
}
