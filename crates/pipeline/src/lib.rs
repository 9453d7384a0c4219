#![deny(missing_docs)]
//! Mathflow pipeline: safe substitution of rendered markup into message
//! HTML, with token indirection and verbatim-region exclusion.

/// The message rendering pipeline.
pub mod pipeline;
/// Prioritized callback registry.
pub mod registry;
/// Document walking backends.
pub mod walker;

pub use pipeline::MessagePipeline;
pub use registry::{CallbackRegistry, PRIORITY_HIGH, PRIORITY_LOW, PRIORITY_MEDIUM};
pub use walker::{DocumentWalker, FlatWalker, HtmlWalker, WalkError};
