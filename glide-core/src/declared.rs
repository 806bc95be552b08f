//! Commands declared in project configuration.
//!
//! A project's `.glide.yml` may carry a `commands:` mapping. Each entry is
//! either a bare shell line or a mapping with `cmd`, `description`, `help`,
//! `alias` and `category`:
//!
//! ```yaml
//! commands:
//!   fresh: "php artisan migrate:fresh --seed"
//!   deploy:
//!     cmd: "./scripts/deploy.sh $1"
//!     description: Deploy to an environment
//!     alias: d
//!     category: developer
//! ```
//!
//! Declared commands are registered after the built-ins. An entry whose name
//! or alias is protected is skipped, so the built-in keeps the token.

use crate::category::Category;
use crate::error::{ConfigError, RegistryError};
use crate::node::{ANNOTATION_COMMAND, ANNOTATION_DECLARED, CommandNode};
use crate::protected::is_protected;
use crate::registry::{CommandMetadata, Registry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// A command declared in project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDeclared")]
pub struct DeclaredCommand {
    /// Shell template; see [`render_template`].
    pub cmd: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDeclared {
    Shorthand(String),
    Full {
        cmd: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        help: Option<String>,
        #[serde(default)]
        alias: Option<String>,
        #[serde(default)]
        category: Option<String>,
    },
}

impl From<RawDeclared> for DeclaredCommand {
    fn from(raw: RawDeclared) -> Self {
        match raw {
            RawDeclared::Shorthand(cmd) => DeclaredCommand::new(cmd),
            RawDeclared::Full {
                cmd,
                description,
                help,
                alias,
                category,
            } => DeclaredCommand {
                cmd,
                description,
                help,
                alias: alias.filter(|a| !a.is_empty()),
                category,
            },
        }
    }
}

impl DeclaredCommand {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            description: String::new(),
            help: None,
            alias: None,
            category: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Category to list the command under. Unknown or missing categories
    /// fall into the project-command bucket.
    pub fn resolved_category(&self) -> Category {
        match self.category.as_deref().map(Category::parse) {
            None | Some(Category::Other(_)) => Category::Yaml,
            Some(known) => known,
        }
    }

    /// One-line description, falling back to the shell line itself.
    pub fn summary(&self) -> String {
        if self.description.is_empty() {
            format!("Run: {}", self.cmd)
        } else {
            self.description.clone()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProjectFile {
    #[serde(default)]
    commands: BTreeMap<String, DeclaredCommand>,
}

/// Parse the `commands:` mapping out of a project configuration document.
pub fn parse_declared_commands(yaml: &str) -> Result<BTreeMap<String, DeclaredCommand>, ConfigError> {
    if yaml.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let file: Option<ProjectFile> =
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
    Ok(file.map(|f| f.commands).unwrap_or_default())
}

/// Read declared commands from `path`. A missing file declares nothing.
pub fn load_declared_file(path: &Path) -> Result<BTreeMap<String, DeclaredCommand>, ConfigError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_declared_commands(&content).map_err(|e| match e {
        ConfigError::ParseError { message } => ConfigError::ParseError {
            message: format!("{}: {}", path.display(), message),
        },
        other => other,
    })
}

/// Result of adding one declared command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredOutcome {
    Registered,
    /// The name or alias is reserved for a built-in; nothing was registered.
    Skipped,
}

/// Register a declared command.
///
/// Protected names are skipped rather than reported. Any other collision is a
/// configuration defect and surfaces as a `RegistryError`.
pub fn add_declared_command(
    registry: &mut Registry,
    name: &str,
    declared: DeclaredCommand,
) -> Result<DeclaredOutcome, RegistryError> {
    if is_protected(name) || declared.alias.as_deref().is_some_and(is_protected) {
        debug!(command = %name, "Skipping declared command that shadows a built-in");
        return Ok(DeclaredOutcome::Skipped);
    }

    let metadata = CommandMetadata::new(declared.resolved_category(), declared.summary())
        .with_aliases(declared.alias.iter().cloned());

    let node_name = name.to_string();
    registry.register_fn(
        name,
        move |_ctx| {
            let mut node = CommandNode::new(node_name.clone(), declared.summary())
                .disable_flag_parsing(true)
                .annotate(ANNOTATION_DECLARED, "true")
                .annotate(ANNOTATION_COMMAND, declared.cmd.clone());
            if let Some(help) = &declared.help {
                node = node.long_about(help.clone());
            }
            node
        },
        metadata,
    )?;
    Ok(DeclaredOutcome::Registered)
}

/// Names registered and skipped by [`load_declared_commands`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub registered: Vec<String>,
    pub skipped: Vec<String>,
}

/// Register every declared command, in name order.
pub fn load_declared_commands(
    registry: &mut Registry,
    commands: BTreeMap<String, DeclaredCommand>,
) -> Result<LoadReport, RegistryError> {
    let mut report = LoadReport::default();
    for (name, declared) in commands {
        match add_declared_command(registry, &name, declared)? {
            DeclaredOutcome::Registered => report.registered.push(name),
            DeclaredOutcome::Skipped => report.skipped.push(name),
        }
    }
    info!(
        registered = report.registered.len(),
        skipped = report.skipped.len(),
        "Loaded declared commands"
    );
    Ok(report)
}

/// Expand a declared command's shell template with the caller's arguments.
///
/// `$@` and `$*` expand to every argument, `$1`..`$9` to a single argument
/// (empty when missing). A template without placeholders gets the arguments
/// appended. Arguments are quoted for `sh`.
pub fn render_template(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut used_placeholder = false;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('@' | '*') => {
                chars.next();
                used_placeholder = true;
                out.push_str(&join_quoted(args));
            }
            Some(d @ '1'..='9') => {
                chars.next();
                used_placeholder = true;
                let index = d as usize - '1' as usize;
                if let Some(arg) = args.get(index) {
                    out.push_str(&shell_quote(arg));
                }
            }
            _ => out.push('$'),
        }
    }

    if !used_placeholder && !args.is_empty() {
        out.push(' ');
        out.push_str(&join_quoted(args));
    }
    out
}

fn join_quoted(args: &[String]) -> String {
    args.iter()
        .map(|a| shell_quote(a))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote `arg` for a POSIX shell when it holds anything but safe characters.
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
