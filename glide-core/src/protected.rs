//! Names reserved for built-in commands.
//!
//! Declared commands and plugins may never shadow these tokens.

/// Canonical names and aliases owned by built-in commands.
pub const PROTECTED_NAMES: &[&str] = &[
    "help",
    "setup",
    "plugins",
    "plugin",
    "self-update",
    "update",
    "upgrade",
    "version",
    "completion",
    "global",
    "g",
    "config",
    "context",
];

pub fn is_protected(name: &str) -> bool {
    PROTECTED_NAMES.contains(&name)
}
