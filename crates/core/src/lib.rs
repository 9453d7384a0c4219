#![deny(missing_docs)]
//! Mathflow core: delimiter scanning, math segment rendering, and the
//! message/token model.

/// The math transformation callback and default delimiter table.
pub mod math;
/// Message state, tokens, and the callback contract.
pub mod message;
/// Segment rendering and the math renderer boundary.
pub mod render;
/// Delimiter scanning and boundary matching.
pub mod scanner;
/// Settings store capability queries.
pub mod settings;

pub use math::{MathTransform, default_delimiters};
pub use message::{Message, MessageTransform, Token, Transformed, replace_tokens};
pub use render::{MathRenderer, RenderError, RenderOptions, render_segment};
pub use scanner::{Boundary, DelimiterDefinition, DelimiterScanner, RenderMode, SegmentMatch};
pub use settings::{SettingsStore, flags};
