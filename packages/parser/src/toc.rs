//! Table of contents extraction over raw source
//!
//! Works on the text directly, independent of whether the document compiles,
//! so the outline stays available while the preview shows an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(#{1,4})[ \t]+(.+)$").expect("heading pattern is valid"));

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// Headings of depth 1-4, in document order
pub fn extract_headings(source: &str) -> Vec<TocEntry> {
    HEADING
        .captures_iter(source)
        .map(|caps| {
            let level = caps[1].len() as u8;
            let text = caps[2].trim().to_string();
            TocEntry {
                id: slugify(&text),
                text,
                level,
            }
        })
        .collect()
}

/// Lowercase, collapse runs of anything outside `[a-z0-9]` to `-`, trim `-`
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}
