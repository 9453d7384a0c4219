//! Prioritized registry of message transformation callbacks.

use mathflow_core::MessageTransform;

/// Runs before most other callbacks.
pub const PRIORITY_HIGH: i32 = 1000;
/// Default priority.
pub const PRIORITY_MEDIUM: i32 = 500;
/// Runs after most other callbacks.
pub const PRIORITY_LOW: i32 = 0;

struct Entry {
    name: String,
    priority: i32,
    transform: Box<dyn MessageTransform>,
}

/// Ordered collection of transformation callbacks.
///
/// Higher priority runs first; callbacks registered with equal priority keep
/// their registration order. An explicit value injected into the pipeline,
/// not a process-wide singleton, so independent pipelines can carry
/// independent callback sets.
#[derive(Default)]
pub struct CallbackRegistry {
    entries: Vec<Entry>,
}

impl CallbackRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named callback at the given priority.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        priority: i32,
        transform: Box<dyn MessageTransform>,
    ) {
        self.entries.push(Entry {
            name: name.into(),
            priority,
            transform,
        });
        // Stable sort keeps registration order for equal priorities.
        self.entries.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Remove a callback by name. Returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.name != name);
        self.entries.len() != before
    }

    /// Callbacks in execution order.
    pub fn transforms(&self) -> impl Iterator<Item = &dyn MessageTransform> {
        self.entries.iter().map(|entry| entry.transform.as_ref())
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathflow_core::{SettingsStore, Transformed};

    fn tag(label: &'static str) -> Box<dyn MessageTransform> {
        Box::new(move |text: &str, _settings: &dyn SettingsStore| {
            Transformed::passthrough(format!("{text}{label}"))
        })
    }

    fn run_all(registry: &CallbackRegistry) -> String {
        let settings = |_: &str| true;
        let mut text = String::new();
        for transform in registry.transforms() {
            text = transform.transform(&text, &settings).html;
        }
        text
    }

    #[test]
    fn higher_priority_runs_first() {
        let mut registry = CallbackRegistry::new();
        registry.add("late", PRIORITY_LOW, tag("c"));
        registry.add("early", PRIORITY_HIGH, tag("a"));
        registry.add("middle", PRIORITY_MEDIUM, tag("b"));
        assert_eq!(run_all(&registry), "abc");
    }

    #[test]
    fn equal_priority_keeps_registration_order() {
        let mut registry = CallbackRegistry::new();
        registry.add("first", PRIORITY_MEDIUM, tag("1"));
        registry.add("second", PRIORITY_MEDIUM, tag("2"));
        assert_eq!(run_all(&registry), "12");
    }

    #[test]
    fn remove_by_name() {
        let mut registry = CallbackRegistry::new();
        registry.add("keep", PRIORITY_MEDIUM, tag("k"));
        registry.add("drop", PRIORITY_MEDIUM, tag("d"));
        assert!(registry.remove("drop"));
        assert!(!registry.remove("drop"));
        assert_eq!(registry.len(), 1);
        assert_eq!(run_all(&registry), "k");
    }
}
