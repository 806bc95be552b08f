//! Front-end neutral command tree.
//!
//! Factories produce `CommandNode` values; the CLI converts them into its
//! argument parser. Nodes are plain owned data, so every build pass yields an
//! independent tree.

use std::collections::BTreeMap;

/// Annotation holding the command's category identifier.
pub const ANNOTATION_CATEGORY: &str = "category";
/// Marker set on commands declared in project configuration.
pub const ANNOTATION_DECLARED: &str = "declared_command";
/// Shell template of a declared command.
pub const ANNOTATION_COMMAND: &str = "command";
/// Program line a built-in passthrough command forwards to.
pub const ANNOTATION_EXEC: &str = "exec";
/// Visibility tag the command was registered with.
pub const ANNOTATION_VISIBILITY: &str = "visibility";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandNode {
    pub name: String,
    /// One-line description.
    pub about: String,
    pub long_about: Option<String>,
    pub aliases: Vec<String>,
    pub hidden: bool,
    /// Pass every trailing token through untouched instead of parsing flags.
    pub disable_flag_parsing: bool,
    pub annotations: BTreeMap<String, String>,
    pub children: Vec<CommandNode>,
}

impl CommandNode {
    pub fn new(name: impl Into<String>, about: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: about.into(),
            ..Self::default()
        }
    }

    pub fn long_about(mut self, text: impl Into<String>) -> Self {
        self.long_about = Some(text.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn disable_flag_parsing(mut self, disable: bool) -> Self {
        self.disable_flag_parsing = disable;
        self
    }

    pub fn annotate(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn child(mut self, child: CommandNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Whether this node was declared in project configuration.
    pub fn is_declared(&self) -> bool {
        self.annotation(ANNOTATION_DECLARED) == Some("true")
    }

    /// Find a direct child by name or alias.
    pub fn find_child(&self, key: &str) -> Option<&CommandNode> {
        self.children
            .iter()
            .find(|c| c.name == key || c.aliases.iter().any(|a| a == key))
    }
}
