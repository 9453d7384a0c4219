//! The math transformation callback: delimiter scanning wired to a renderer.

use crate::message::{MessageTransform, Transformed};
use crate::render::MathRenderer;
use crate::scanner::{DelimiterDefinition, DelimiterScanner, RenderMode};
use crate::settings::{SettingsStore, flags};
use once_cell::sync::Lazy;

static DEFAULT_DELIMITERS: Lazy<Vec<DelimiterDefinition>> = Lazy::new(|| {
    vec![
        DelimiterDefinition::new(
            "\\[",
            "\\]",
            RenderMode::Block,
            flags::MATH_PARENTHESIS_SYNTAX,
        ),
        DelimiterDefinition::new(
            "\\(",
            "\\)",
            RenderMode::Inline,
            flags::MATH_PARENTHESIS_SYNTAX,
        ),
        DelimiterDefinition::new("$$", "$$", RenderMode::Block, flags::MATH_DOLLAR_SYNTAX),
        DelimiterDefinition::new("$", "$", RenderMode::Inline, flags::MATH_DOLLAR_SYNTAX),
    ]
});

/// The default delimiter table.
///
/// `$$` is listed before `$` so the longer opener wins when both start at
/// the same offset.
pub fn default_delimiters() -> &'static [DelimiterDefinition] {
    &DEFAULT_DELIMITERS
}

/// Renders delimited math segments inside message text.
///
/// One instance is registered as a pipeline callback; each invocation
/// constructs a fresh scanner against the current settings, so flag toggles
/// apply to the next message.
pub struct MathTransform {
    delimiters: Vec<DelimiterDefinition>,
    renderer: Box<dyn MathRenderer>,
}

impl MathTransform {
    /// Create a transform with the default delimiter table.
    pub fn new(renderer: Box<dyn MathRenderer>) -> Self {
        Self::with_delimiters(renderer, default_delimiters().to_vec())
    }

    /// Create a transform with a custom delimiter table.
    pub fn with_delimiters(
        renderer: Box<dyn MathRenderer>,
        delimiters: Vec<DelimiterDefinition>,
    ) -> Self {
        Self {
            delimiters,
            renderer,
        }
    }
}

impl MessageTransform for MathTransform {
    fn transform(&self, text: &str, settings: &dyn SettingsStore) -> Transformed {
        if !settings.get(flags::MATH_ENABLED) {
            return Transformed::passthrough(text);
        }
        DelimiterScanner::new(&self.delimiters, settings).transform(text, self.renderer.as_ref())
    }
}
