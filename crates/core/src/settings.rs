//! Capability queries against the host's settings store.

use std::collections::HashMap;

/// Well-known settings flags.
pub mod flags {
    /// Gates math rendering as a whole.
    pub const MATH_ENABLED: &str = "math_enabled";
    /// Gates the `$…$` / `$$…$$` delimiter family.
    pub const MATH_DOLLAR_SYNTAX: &str = "math_dollar_syntax";
    /// Gates the `\(…\)` / `\[…\]` delimiter family.
    pub const MATH_PARENTHESIS_SYNTAX: &str = "math_parenthesis_syntax";
}

/// Read-only view of the host's feature flags.
///
/// Queried on every scan invocation, never cached here, so toggling a flag
/// takes effect on the next message processed.
pub trait SettingsStore {
    /// Current value of a boolean flag; unknown flags read as `false`.
    fn get(&self, flag: &str) -> bool;
}

impl SettingsStore for HashMap<String, bool> {
    fn get(&self, flag: &str) -> bool {
        HashMap::get(self, flag).copied().unwrap_or(false)
    }
}

impl<F> SettingsStore for F
where
    F: Fn(&str) -> bool,
{
    fn get(&self, flag: &str) -> bool {
        (self)(flag)
    }
}
