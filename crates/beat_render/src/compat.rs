//! Hardware compatibility table.
//!
//! Some adapters are known to misbehave on the primary backend. Each rule
//! matches a case-insensitive substring of the hardware description and
//! names the backend that must be used instead.

use crate::backend::BackendKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatRule {
    pub pattern: &'static str,
    pub forced: BackendKind,
}

pub const DEFAULT_COMPAT_RULES: &[CompatRule] = &[CompatRule {
    pattern: "voodoo",
    forced: BackendKind::Gl,
}];

/// First rule matching `hardware`, if any.
pub fn forced_backend(rules: &[CompatRule], hardware: &str) -> Option<BackendKind> {
    let hardware = hardware.to_ascii_lowercase();
    rules
        .iter()
        .find(|rule| hardware.contains(&rule.pattern.to_ascii_lowercase()))
        .map(|rule| rule.forced)
}
