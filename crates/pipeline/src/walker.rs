//! Document walking: visiting text-bearing leaf nodes and splicing
//! replacement markup in place.
//!
//! The pipeline is written against [`DocumentWalker`]; the tree-backed and
//! flat backends are observably equivalent for input without nested
//! structure.

use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, doc_text, element, rewrite_str};
use std::cell::Cell;
use std::rc::Rc;
use thiserror::Error;

/// Failure while walking a document.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The underlying html rewriter rejected the document.
    #[error("html rewriting failed: {0}")]
    Rewrite(#[from] lol_html::errors::RewritingError),
}

/// A sequence of text spans to transform, with a way to splice replacement
/// markup back into the source.
pub trait DocumentWalker {
    /// Apply `apply` to every transformable text span of `html` and return
    /// the document with the replacements spliced in.
    fn rewrite(
        &self,
        html: &str,
        apply: &mut dyn FnMut(&str) -> String,
    ) -> Result<String, WalkError>;
}

/// Tree-backed walker over parsed HTML.
///
/// Visits every text node in document order, excluding subtrees rooted at a
/// verbatim element (`<code>` and `<pre>` by default). Replacement markup is
/// spliced as HTML, not re-escaped.
pub struct HtmlWalker {
    verbatim: Vec<String>,
}

impl HtmlWalker {
    /// Walker with the default verbatim exclusion list.
    pub fn new() -> Self {
        Self {
            verbatim: vec!["code".to_string(), "pre".to_string()],
        }
    }

    /// Walker excluding subtrees rooted at the given element names.
    pub fn with_verbatim(verbatim: Vec<String>) -> Self {
        Self { verbatim }
    }
}

impl Default for HtmlWalker {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentWalker for HtmlWalker {
    fn rewrite(
        &self,
        html: &str,
        apply: &mut dyn FnMut(&str) -> String,
    ) -> Result<String, WalkError> {
        // Depth of nested verbatim elements around the current position.
        let verbatim_depth = Rc::new(Cell::new(0usize));

        let mut element_content_handlers = Vec::new();
        for tag in &self.verbatim {
            let depth = verbatim_depth.clone();
            element_content_handlers.push(element!(
                tag.as_str(),
                move |el: &mut lol_html::html_content::Element| {
                    depth.set(depth.get() + 1);
                    let leave = depth.clone();
                    if let Some(handlers) = el.end_tag_handlers() {
                        handlers.push(Box::new(move |_end| {
                            leave.set(leave.get().saturating_sub(1));
                            Ok(())
                        }));
                    } else {
                        // No end tag will ever arrive for this element.
                        depth.set(depth.get().saturating_sub(1));
                    }
                    Ok(())
                }
            ));
        }

        // Text nodes can arrive split across chunks; buffer until the final
        // chunk so the callback always sees whole spans.
        let mut pending = String::new();
        let depth = verbatim_depth.clone();
        let document_content_handlers = vec![doc_text!(move |chunk| {
            if depth.get() > 0 {
                return Ok(());
            }
            if chunk.last_in_text_node() {
                let text = if pending.is_empty() {
                    chunk.as_str().to_string()
                } else {
                    let mut text = std::mem::take(&mut pending);
                    text.push_str(chunk.as_str());
                    text
                };
                chunk.replace(&apply(&text), ContentType::Html);
            } else {
                pending.push_str(chunk.as_str());
                chunk.remove();
            }
            Ok(())
        })];

        let output = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers,
                document_content_handlers,
                ..RewriteStrSettings::default()
            },
        )?;
        Ok(output)
    }
}

/// Whole-string walker: treats the entire input as one text span.
///
/// Used when no tree-walking capability is wanted, and as the pipeline's
/// fallback when the tree walk fails.
pub struct FlatWalker;

impl DocumentWalker for FlatWalker {
    fn rewrite(
        &self,
        html: &str,
        apply: &mut dyn FnMut(&str) -> String,
    ) -> Result<String, WalkError> {
        Ok(apply(html))
    }
}
