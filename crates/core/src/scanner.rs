//! Delimiter scanning: locating and replacing math segments in a text buffer.
//!
//! The scanner works on a single pre-escaped text buffer and knows nothing
//! about document structure; the pipeline crate feeds it one text node at a
//! time.

use crate::message::{Token, Transformed};
use crate::render::{MathRenderer, render_segment};
use crate::settings::SettingsStore;

/// Rendering mode of a math segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Flows with the surrounding text.
    Inline,
    /// Rendered as its own visual block.
    Block,
}

/// Byte-offset span over a single text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Boundary {
    /// Start offset, inclusive.
    pub start: usize,
    /// End offset, exclusive.
    pub end: usize,
}

impl Boundary {
    /// Create a boundary from start and end offsets.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Extract the spanned slice from the buffer this boundary indexes.
    pub fn extract<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }
}

/// One opener/closer pair with its rendering mode and gating flag.
///
/// The listed order of definitions is significant: when two openers start at
/// the same offset the one listed first wins, which lets `$$` (listed before
/// `$`) claim a double-dollar opener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterDefinition {
    /// Opening delimiter string.
    pub opener: String,
    /// Closing delimiter string.
    pub closer: String,
    /// Mode applied to segments matched by this pair.
    pub mode: RenderMode,
    /// Settings flag gating this pair, if any. `None` means always enabled.
    pub flag: Option<String>,
}

impl DelimiterDefinition {
    /// Create a definition gated on a settings flag.
    pub fn new(
        opener: impl Into<String>,
        closer: impl Into<String>,
        mode: RenderMode,
        flag: impl Into<String>,
    ) -> Self {
        Self {
            opener: opener.into(),
            closer: closer.into(),
            mode,
            flag: Some(flag.into()),
        }
    }

    /// Create a definition that is always enabled.
    pub fn always(opener: impl Into<String>, closer: impl Into<String>, mode: RenderMode) -> Self {
        Self {
            opener: opener.into(),
            closer: closer.into(),
            mode,
            flag: None,
        }
    }

    fn enabled(&self, settings: &dyn SettingsStore) -> bool {
        match &self.flag {
            Some(flag) => settings.get(flag),
            None => true,
        }
    }
}

/// A well-formed delimited segment found in a buffer.
///
/// `outer` spans opener through closer inclusive; `inner` spans the content
/// between them. The inner text, trimmed, is never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentMatch {
    /// Span including the delimiters.
    pub outer: Boundary,
    /// Span of the content between the delimiters.
    pub inner: Boundary,
    /// Mode of the matched definition.
    pub mode: RenderMode,
}

struct OpenerMatch<'d> {
    definition: &'d DelimiterDefinition,
    pos: usize,
}

/// Finds delimited segments and drives the left-to-right replace loop.
///
/// Constructed per run with a borrowed definition list and settings store;
/// the enablement flags are re-read on every scan so a toggled flag takes
/// effect on the next message.
pub struct DelimiterScanner<'a> {
    delimiters: &'a [DelimiterDefinition],
    settings: &'a dyn SettingsStore,
}

impl<'a> DelimiterScanner<'a> {
    /// Create a scanner over the given delimiter definitions.
    pub fn new(delimiters: &'a [DelimiterDefinition], settings: &'a dyn SettingsStore) -> Self {
        Self {
            delimiters,
            settings,
        }
    }

    /// First occurrence, at or after `from`, of any enabled opener.
    ///
    /// Ties at the same offset resolve to the definition listed first.
    fn find_opening_delimiter(&self, buffer: &str, from: usize) -> Option<OpenerMatch<'a>> {
        let mut best: Option<OpenerMatch<'a>> = None;
        for definition in self.delimiters {
            if !definition.enabled(self.settings) {
                continue;
            }
            if let Some(offset) = buffer[from..].find(definition.opener.as_str()) {
                let pos = from + offset;
                if best.as_ref().is_none_or(|b| pos < b.pos) {
                    best = Some(OpenerMatch { definition, pos });
                }
            }
        }
        best
    }

    /// Outer and inner boundaries of the segment starting at the given
    /// opener, or `None` when no matching closer follows.
    fn segment_boundaries(&self, buffer: &str, opener: &OpenerMatch<'_>) -> Option<SegmentMatch> {
        let closer = opener.definition.closer.as_str();
        let inner_start = opener.pos + opener.definition.opener.len();
        let closer_offset = buffer[inner_start..].find(closer)?;
        let inner = Boundary::new(inner_start, inner_start + closer_offset);
        let outer = Boundary::new(opener.pos, inner.end + closer.len());
        Some(SegmentMatch {
            outer,
            inner,
            mode: opener.definition.mode,
        })
    }

    /// Leftmost well-formed segment at or after `from`.
    ///
    /// An opener with no closer, or with whitespace-only content, is not a
    /// segment: the search resumes one character past the opener's start, so
    /// malformed markup degrades to literal text instead of failing the scan.
    pub fn find_segment(&self, buffer: &str, from: usize) -> Option<SegmentMatch> {
        let mut from = from;
        while let Some(opener) = self.find_opening_delimiter(buffer, from) {
            if let Some(segment) = self.segment_boundaries(buffer, &opener)
                && !segment.inner.extract(buffer).trim().is_empty()
            {
                return Some(segment);
            }
            // Unmatchable opener: step one char past its start and retry.
            let step = buffer[opener.pos..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            from = opener.pos + step;
        }
        None
    }

    /// Replace every segment in `buffer` with a token placeholder carrying
    /// its rendered markup; text outside segments is copied verbatim.
    ///
    /// The buffer is assumed pre-escaped, so segment content is
    /// entity-decoded back to its literal form before rendering. After each
    /// match the remainder of the buffer is re-scanned from its own start;
    /// quadratic for pathological inputs, but segment counts per message are
    /// small.
    pub fn transform(&self, buffer: &str, renderer: &dyn MathRenderer) -> Transformed {
        let mut html = String::with_capacity(buffer.len());
        let mut tokens = Vec::new();
        let mut rest = buffer;
        while let Some(segment) = self.find_segment(rest, 0) {
            html.push_str(&rest[..segment.outer.start]);
            let source = html_escape::decode_html_entities(segment.inner.extract(rest));
            let rendered = render_segment(renderer, &source, segment.mode);
            let token = Token::wrap(rendered);
            html.push_str(&token.placeholder);
            tokens.push(token);
            rest = &rest[segment.outer.end..];
        }
        html.push_str(rest);
        Transformed { html, tokens }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::default_delimiters;
    use crate::message::replace_tokens;
    use crate::render::{RenderError, RenderOptions};
    use crate::settings::flags;
    use std::collections::HashMap;

    fn all_on(_flag: &str) -> bool {
        true
    }

    fn plain_renderer(content: &str, options: &RenderOptions) -> Result<String, RenderError> {
        let tag = if options.display_mode { "div" } else { "span" };
        Ok(format!("<{tag}>{content}</{tag}>"))
    }

    fn scan(buffer: &str) -> Option<SegmentMatch> {
        let definitions = default_delimiters();
        DelimiterScanner::new(definitions, &all_on).find_segment(buffer, 0)
    }

    fn rendered(buffer: &str) -> String {
        let definitions = default_delimiters();
        let scanner = DelimiterScanner::new(definitions, &all_on);
        let out = scanner.transform(buffer, &plain_renderer);
        replace_tokens(&out.html, &out.tokens)
    }

    #[test]
    fn finds_leftmost_segment() {
        let segment = scan("a $x$ and $y$").expect("segment");
        assert_eq!(segment.outer, Boundary::new(2, 5));
        assert_eq!(segment.inner, Boundary::new(3, 4));
        assert_eq!(segment.mode, RenderMode::Inline);
    }

    #[test]
    fn double_dollar_wins_tie_at_same_offset() {
        let segment = scan("$$x$$").expect("segment");
        assert_eq!(segment.mode, RenderMode::Block);
        assert_eq!(segment.inner.extract("$$x$$"), "x");
        assert_eq!(segment.outer, Boundary::new(0, 5));
    }

    #[test]
    fn parenthesis_syntax_modes() {
        let block = scan("\\[x\\]").expect("segment");
        assert_eq!(block.mode, RenderMode::Block);
        let inline = scan("\\(x\\)").expect("segment");
        assert_eq!(inline.mode, RenderMode::Inline);
    }

    #[test]
    fn unmatched_opener_is_skipped() {
        assert_eq!(scan("$unterminated"), None);
    }

    #[test]
    fn empty_content_is_rejected() {
        assert_eq!(scan("$$"), None);
        assert_eq!(scan("$ $"), None);
        assert_eq!(scan("$$$$"), None);
    }

    #[test]
    fn recovers_past_unmatchable_opener() {
        // The `\[` opener never closes; the scan steps past it and still
        // finds the dollar pair.
        let buffer = "\\[ broken $x$";
        let segment = scan(buffer).expect("segment");
        assert_eq!(segment.inner.extract(buffer), "x");
        assert_eq!(segment.mode, RenderMode::Inline);
    }

    #[test]
    fn disabled_family_is_ignored() {
        let settings: HashMap<String, bool> = HashMap::from([
            (flags::MATH_DOLLAR_SYNTAX.to_string(), false),
            (flags::MATH_PARENTHESIS_SYNTAX.to_string(), true),
        ]);
        let definitions = default_delimiters();
        let scanner = DelimiterScanner::new(definitions, &settings);
        assert_eq!(scanner.find_segment("$x$", 0), None);
        assert!(scanner.find_segment("\\(x\\)", 0).is_some());
    }

    #[test]
    fn earlier_definition_wins_prefix_collision() {
        // A longer opener that is a prefix of a shorter one must be listed
        // first to win; the default table relies on this for $$ vs $.
        let buffer = "$$x$$ then $y$";
        let first = scan(buffer).expect("segment");
        assert_eq!(first.mode, RenderMode::Block);
        let second = {
            let definitions = default_delimiters();
            DelimiterScanner::new(definitions, &all_on)
                .find_segment(buffer, first.outer.end)
                .expect("segment")
        };
        assert_eq!(second.mode, RenderMode::Inline);
        assert_eq!(second.inner.extract(buffer), "y");
    }

    #[test]
    fn transform_without_openers_is_passthrough() {
        let definitions = default_delimiters();
        let scanner = DelimiterScanner::new(definitions, &all_on);
        let out = scanner.transform("no math here", &plain_renderer);
        assert_eq!(out.html, "no math here");
        assert!(out.tokens.is_empty());
    }

    #[test]
    fn transform_replaces_all_segments_in_order() {
        assert_eq!(
            rendered("a \\[x^2\\] b $y$ c"),
            "a <div>x^2</div> b <span>y</span> c"
        );
    }

    #[test]
    fn transform_emits_placeholders_not_markup() {
        let definitions = default_delimiters();
        let scanner = DelimiterScanner::new(definitions, &all_on);
        let out = scanner.transform("a $x$ b", &plain_renderer);
        assert!(!out.html.contains('<'));
        assert_eq!(out.tokens.len(), 1);
        assert!(out.html.contains(&out.tokens[0].placeholder));
        assert_eq!(out.tokens[0].html, "<span>x</span>");
    }

    #[test]
    fn transform_decodes_entities_in_content() {
        assert_eq!(rendered("$x &lt; y$"), "<span>x < y</span>");
    }

    #[test]
    fn transform_leaves_trailing_unmatched_opener_literal() {
        assert_eq!(rendered("$x$ then $oops"), "<span>x</span> then $oops");
    }

    #[test]
    fn transform_handles_multibyte_text() {
        assert_eq!(rendered("π≈3 $α+β$ 素晴らしい"), "π≈3 <span>α+β</span> 素晴らしい");
    }

    #[test]
    fn failed_segment_does_not_block_siblings() {
        fn picky(content: &str, _options: &RenderOptions) -> Result<String, RenderError> {
            if content.contains("bad") {
                Err(RenderError::new("ParseError: unexpected token"))
            } else {
                Ok(format!("<span>{content}</span>"))
            }
        }
        let definitions = default_delimiters();
        let scanner = DelimiterScanner::new(definitions, &all_on);
        let out = scanner.transform("$bad$ and $good$", &picky);
        let html = replace_tokens(&out.html, &out.tokens);
        assert!(html.contains("math-error"));
        assert!(html.contains("<span>good</span>"));
    }

    #[test]
    fn rescan_of_resolved_output_is_a_no_op() {
        // Idempotence holds as long as the rendered markup contains no
        // residual delimiter sequences.
        let first = rendered("a $x+y$ b");
        let definitions = default_delimiters();
        let scanner = DelimiterScanner::new(definitions, &all_on);
        let second = scanner.transform(&first, &plain_renderer);
        assert_eq!(second.html, first);
        assert!(second.tokens.is_empty());
    }
}
