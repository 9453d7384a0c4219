//! Message state, token placeholders, and the transformation callback
//! contract.

use crate::settings::SettingsStore;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PLACEHOLDER: AtomicU64 = AtomicU64::new(0);

/// A placeholder standing in for finished markup until all structural
/// processing completes.
///
/// Callback output can contain characters a later callback or a tree
/// re-parse would misinterpret; tokens defer the raw-HTML substitution until
/// after the document has been serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Unique marker string embedded in the callback's html output.
    pub placeholder: String,
    /// Markup substituted for the placeholder at resolution time.
    pub html: String,
}

impl Token {
    /// Wrap finished markup in a token with a fresh process-unique
    /// placeholder.
    ///
    /// The placeholder contains no markup or delimiter characters, so later
    /// passes treat it as inert text.
    pub fn wrap(html: impl Into<String>) -> Self {
        let id = NEXT_PLACEHOLDER.fetch_add(1, Ordering::Relaxed);
        Self {
            placeholder: format!("=!={id}=!="),
            html: html.into(),
        }
    }
}

/// Output of one transformation callback over one text span.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transformed {
    /// Replacement html, possibly containing token placeholders.
    pub html: String,
    /// Tokens minted by this callback, in creation order.
    pub tokens: Vec<Token>,
}

impl Transformed {
    /// Output that leaves the input text untouched.
    pub fn passthrough(text: impl Into<String>) -> Self {
        Self {
            html: text.into(),
            tokens: Vec::new(),
        }
    }
}

/// One inbound text unit being rendered.
///
/// Created per pipeline run, mutated by each stage, discarded after final
/// token resolution; never shared across runs.
#[derive(Debug, Clone, Default)]
pub struct Message {
    /// Original text as received.
    pub raw: String,
    /// Accumulated html, rewritten by each pipeline stage.
    pub html: String,
    /// Tokens accumulated across all callbacks and text spans.
    pub tokens: Vec<Token>,
}

impl Message {
    /// Create a message from raw text.
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            html: String::new(),
            tokens: Vec::new(),
        }
    }
}

/// A text-to-markup transformation callback.
///
/// Callbacks receive one text span at a time, already entity-escaped, plus
/// the settings collaborator for capability checks. They must never panic on
/// malformed input; degrading to passthrough is the expected failure mode.
pub trait MessageTransform {
    /// Transform one text span into replacement html and deferred tokens.
    fn transform(&self, text: &str, settings: &dyn SettingsStore) -> Transformed;
}

impl<F> MessageTransform for F
where
    F: Fn(&str, &dyn SettingsStore) -> Transformed,
{
    fn transform(&self, text: &str, settings: &dyn SettingsStore) -> Transformed {
        (self)(text, settings)
    }
}

/// Resolve token placeholders in serialized html.
///
/// Tokens are consumed in reverse creation order (innermost/latest first)
/// and each placeholder is replaced exactly once, so markup nested inside a
/// later token's replacement still resolves.
pub fn replace_tokens(html: &str, tokens: &[Token]) -> String {
    let mut out = html.to_string();
    for token in tokens.iter().rev() {
        out = out.replacen(token.placeholder.as_str(), token.html.as_str(), 1);
    }
    out
}
