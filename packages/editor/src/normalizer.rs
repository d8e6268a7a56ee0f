//! Source normalization
//!
//! Editors hand over either a flat string or an ordered list of fragments
//! (one per authoring block). Both become a single immutable `SourceText`.

use livemark_evaluator::CustomComponentSpec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable source consumed whole by one compile
pub type SourceText = Arc<str>;

/// One authoring block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub content: String,
}

impl Fragment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    Text(String),
    Fragments(Vec<Fragment>),
}

impl From<&str> for SourceInput {
    fn from(text: &str) -> Self {
        SourceInput::Text(text.to_string())
    }
}

impl From<String> for SourceInput {
    fn from(text: String) -> Self {
        SourceInput::Text(text)
    }
}

impl From<Vec<Fragment>> for SourceInput {
    fn from(fragments: Vec<Fragment>) -> Self {
        SourceInput::Fragments(fragments)
    }
}

impl From<&[Fragment]> for SourceInput {
    fn from(fragments: &[Fragment]) -> Self {
        SourceInput::Fragments(fragments.to_vec())
    }
}

/// Produce the source text for a compile. Fragments are joined with `\n` in
/// order; `\r\n` line endings become `\n`.
pub fn normalize(input: impl Into<SourceInput>) -> SourceText {
    let text = match input.into() {
        SourceInput::Text(text) => text,
        SourceInput::Fragments(fragments) => fragments
            .iter()
            .map(|fragment| fragment.content.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    };

    if text.contains('\r') {
        Arc::from(text.replace("\r\n", "\n"))
    } else {
        Arc::from(text)
    }
}

/// Insert a custom component's template as a new fragment at `index`
/// (clamped to the end of the list). Returns the index it landed at.
pub fn insert_template(fragments: &mut Vec<Fragment>, index: usize, spec: &CustomComponentSpec) -> usize {
    let index = index.min(fragments.len());
    fragments.insert(index, Fragment::new(format!("\n{}\n", spec.template)));
    index
}
