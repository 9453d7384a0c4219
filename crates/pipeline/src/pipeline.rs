//! The safe substitution pipeline: escape, walk, transform, resolve.

use crate::registry::CallbackRegistry;
use crate::walker::{DocumentWalker, HtmlWalker};
use mathflow_core::{Message, SettingsStore, replace_tokens};

/// Applies registered transformation callbacks over a message and resolves
/// token placeholders into the final html.
///
/// The raw text is entity-escaped before any callback sees it, so message
/// content itself is never interpreted as markup. Each callback runs in its
/// own walker pass over the current html; markup produced by one callback is
/// therefore parsed structure (with verbatim exclusions applied) by the
/// time the next callback runs, while rendered output stays hidden behind
/// token placeholders until the very end.
pub struct MessagePipeline {
    registry: CallbackRegistry,
    walker: Box<dyn DocumentWalker>,
    gate_flag: Option<String>,
}

impl MessagePipeline {
    /// Pipeline over the given callbacks, walking messages as HTML trees.
    pub fn new(registry: CallbackRegistry) -> Self {
        Self::with_walker(registry, Box::new(HtmlWalker::new()))
    }

    /// Pipeline with an explicit document walker backend.
    pub fn with_walker(registry: CallbackRegistry, walker: Box<dyn DocumentWalker>) -> Self {
        Self {
            registry,
            walker,
            gate_flag: None,
        }
    }

    /// Gate the whole pipeline on a settings flag, queried once per run.
    pub fn gated_by(mut self, flag: impl Into<String>) -> Self {
        self.gate_flag = Some(flag.into());
        self
    }

    /// Render a message to its final html.
    ///
    /// Never fails: a walker failure downgrades that pass to a whole-string
    /// transformation, and per-segment render failures have already been
    /// folded into diagnostic markup by the callbacks themselves.
    pub fn run(&self, raw: &str, settings: &dyn SettingsStore) -> String {
        if let Some(flag) = &self.gate_flag
            && !settings.get(flag)
        {
            return raw.to_string();
        }

        let mut message = Message::new(raw);
        message.html = html_escape::encode_text(&message.raw).into_owned();

        for transform in self.registry.transforms() {
            let tokens = &mut message.tokens;
            let mut apply = |text: &str| {
                let out = transform.transform(text, settings);
                tokens.extend(out.tokens);
                out.html
            };
            let rewritten = match self.walker.rewrite(&message.html, &mut apply) {
                Ok(html) => html,
                Err(err) => {
                    log::warn!("tree walk failed, falling back to whole-string pass: {err}");
                    apply(&message.html)
                }
            };
            message.html = rewritten;
        }

        replace_tokens(&message.html, &message.tokens)
    }
}
