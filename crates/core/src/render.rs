//! Segment rendering: the math renderer boundary and per-segment failure
//! isolation.

use crate::scanner::RenderMode;
use std::collections::HashMap;
use thiserror::Error;

/// Failure reported by a math renderer for malformed input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RenderError {
    /// Human-readable failure description, shown in the fallback markup.
    pub message: String,
}

impl RenderError {
    /// Create a render error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Options handed to the math renderer for one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Whether the segment is typeset as its own block.
    pub display_mode: bool,
    /// Macro overrides applied by the renderer.
    pub macros: HashMap<String, String>,
}

impl RenderOptions {
    /// Options for the given rendering mode.
    ///
    /// `\href` is overridden to a no-op: the renderer does not enforce URL
    /// protocol allow-listing.
    pub fn for_mode(mode: RenderMode) -> Self {
        let mut macros = HashMap::new();
        macros.insert("\\href".to_string(), String::new());
        Self {
            display_mode: matches!(mode, RenderMode::Block),
            macros,
        }
    }
}

/// External math typesetting renderer.
///
/// A pure function from markup source and options to an HTML string; any
/// rejection of the input surfaces as a [`RenderError`].
pub trait MathRenderer {
    /// Render math source to an HTML string.
    fn render_to_string(&self, content: &str, options: &RenderOptions)
    -> Result<String, RenderError>;
}

impl<F> MathRenderer for F
where
    F: Fn(&str, &RenderOptions) -> Result<String, RenderError>,
{
    fn render_to_string(
        &self,
        content: &str,
        options: &RenderOptions,
    ) -> Result<String, RenderError> {
        (self)(content, options)
    }
}

/// Render one segment, folding any renderer failure into inline diagnostic
/// markup.
///
/// A failed segment never aborts the surrounding scan: the fallback is a
/// container tagged with an error class for the mode, holding the escaped
/// failure message.
pub fn render_segment(renderer: &dyn MathRenderer, content: &str, mode: RenderMode) -> String {
    match renderer.render_to_string(content, &RenderOptions::for_mode(mode)) {
        Ok(html) => html,
        Err(err) => {
            log::debug!("math render failed, emitting fallback markup: {err}");
            let mode_class = match mode {
                RenderMode::Inline => "inline",
                RenderMode::Block => "block",
            };
            format!(
                "<div class=\"math-error math-{mode_class}-error\">{}</div>",
                html_escape::encode_text(&err.message)
            )
        }
    }
}
