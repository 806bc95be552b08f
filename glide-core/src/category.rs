//! Command categories used for grouping in help output.

use serde::{Deserialize, Serialize};

/// Category a command is listed under.
///
/// The known categories form a closed set; `Other` carries any unrecognized
/// category string through unchanged so that newer configuration keeps
/// working with an older binary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Core,
    Global,
    Setup,
    Docker,
    Testing,
    Developer,
    Database,
    Plugin,
    Help,
    Yaml,
    Debug,
    Other(String),
}

impl Category {
    /// Parse a category string. Unknown strings become `Category::Other`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "core" => Category::Core,
            "global" => Category::Global,
            "setup" => Category::Setup,
            "docker" => Category::Docker,
            "testing" => Category::Testing,
            "developer" => Category::Developer,
            "database" => Category::Database,
            "plugin" => Category::Plugin,
            "help" => Category::Help,
            "yaml" => Category::Yaml,
            "debug" => Category::Debug,
            _ => Category::Other(s.to_string()),
        }
    }

    /// The identifier used in configuration and node annotations.
    pub fn as_str(&self) -> &str {
        match self {
            Category::Core => "core",
            Category::Global => "global",
            Category::Setup => "setup",
            Category::Docker => "docker",
            Category::Testing => "testing",
            Category::Developer => "developer",
            Category::Database => "database",
            Category::Plugin => "plugin",
            Category::Help => "help",
            Category::Yaml => "yaml",
            Category::Debug => "debug",
            Category::Other(s) => s,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Category::Core => "Core Commands",
            Category::Global => "Global Commands",
            Category::Setup => "Setup & Configuration",
            Category::Docker => "Docker Management",
            Category::Testing => "Testing",
            Category::Developer => "Developer Tools",
            Category::Database => "Database",
            Category::Plugin => "Plugins",
            Category::Help => "Help & Documentation",
            Category::Yaml => "Project Commands",
            Category::Debug => "Debugging",
            Category::Other(s) => s,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Core => "Essential commands available everywhere",
            Category::Global => "Commands that operate across all worktrees",
            Category::Setup => "Initial setup and configuration",
            Category::Docker => "Container lifecycle for the current project",
            Category::Testing => "Run and manage test suites",
            Category::Developer => "Code generation, linting, and package management",
            Category::Database => "Database access and maintenance",
            Category::Plugin => "Commands provided by installed plugins",
            Category::Help => "Help topics and guides",
            Category::Yaml => "Commands declared in the project configuration",
            Category::Debug => "Diagnostics for Glide itself",
            Category::Other(_) => "Additional commands",
        }
    }

    /// Display priority. Lower sorts first; `Core` is first and `Help` is last.
    pub fn priority(&self) -> u32 {
        match self {
            Category::Core => 10,
            Category::Global => 15,
            Category::Docker => 20,
            Category::Testing => 30,
            Category::Developer => 40,
            Category::Database => 50,
            Category::Yaml => 60,
            Category::Plugin => 70,
            Category::Setup => 80,
            Category::Debug => 85,
            Category::Other(_) => 88,
            Category::Help => 90,
        }
    }

    /// All known categories in display order.
    pub fn all() -> &'static [Category] {
        &[
            Category::Core,
            Category::Global,
            Category::Docker,
            Category::Testing,
            Category::Developer,
            Category::Database,
            Category::Yaml,
            Category::Plugin,
            Category::Setup,
            Category::Debug,
            Category::Help,
        ]
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::parse(&s)
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Category::parse(s)
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.as_str().to_string()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
