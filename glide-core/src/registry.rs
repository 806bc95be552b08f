//! Command registry: owns every command descriptor known to this invocation.
//!
//! Commands are registered once at startup (built-ins, then plugins, then
//! declared commands) and the registry is read-only afterwards. Names and
//! aliases share one namespace: a token resolves to at most one command, and
//! registration fails instead of overwriting.

use crate::category::Category;
use crate::context::ProjectContext;
use crate::error::RegistryError;
use crate::node::{ANNOTATION_CATEGORY, ANNOTATION_VISIBILITY, CommandNode};
use crate::visibility::VisibilityTag;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Inputs available to a factory while a command tree is built.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildContext<'a> {
    pub project: Option<&'a ProjectContext>,
}

impl<'a> BuildContext<'a> {
    pub fn new(project: Option<&'a ProjectContext>) -> Self {
        Self { project }
    }
}

/// Builds the runnable node for a command.
///
/// Factories must be cheap and free of side effects: they run once per build
/// pass and may run several times per process.
pub type CommandFactory = Arc<dyn Fn(&BuildContext<'_>) -> CommandNode + Send + Sync>;

/// Metadata recorded alongside a command's factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMetadata {
    pub category: Category,
    pub description: String,
    pub aliases: Vec<String>,
    pub hidden: bool,
    pub visibility: Option<VisibilityTag>,
}

impl CommandMetadata {
    pub fn new(category: Category, description: impl Into<String>) -> Self {
        Self {
            category,
            description: description.into(),
            aliases: Vec::new(),
            hidden: false,
            visibility: None,
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_visibility(mut self, tag: VisibilityTag) -> Self {
        self.visibility = Some(tag);
        self
    }
}

/// A registered command: canonical name, factory, and metadata.
#[derive(Clone)]
pub struct CommandDescriptor {
    pub name: String,
    pub factory: CommandFactory,
    pub metadata: CommandMetadata,
}

impl CommandDescriptor {
    /// Run the factory and stamp the registry-owned fields onto the node.
    pub fn build(&self, ctx: &BuildContext<'_>) -> CommandNode {
        let mut node = (self.factory)(ctx);
        node.aliases = self.metadata.aliases.clone();
        node.hidden = self.metadata.hidden;
        node.annotations.insert(
            ANNOTATION_CATEGORY.to_string(),
            self.metadata.category.as_str().to_string(),
        );
        if let Some(tag) = &self.metadata.visibility {
            node.annotations
                .insert(ANNOTATION_VISIBILITY.to_string(), tag.as_str().to_string());
        }
        node
    }
}

impl std::fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Name → descriptor map with alias resolution and stable ordering.
#[derive(Default)]
pub struct Registry {
    items: HashMap<String, CommandDescriptor>,
    order: Vec<String>,
    aliases: HashMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command.
    ///
    /// Every conflict check runs before the registry is touched, so a failed
    /// call leaves no partial state behind.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: CommandFactory,
        metadata: CommandMetadata,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        self.check_available(&name, &metadata.aliases)?;

        debug!(command = %name, category = %metadata.category, aliases = ?metadata.aliases, "Registering command");
        for alias in &metadata.aliases {
            self.aliases.insert(alias.clone(), name.clone());
        }
        self.order.push(name.clone());
        self.items.insert(
            name.clone(),
            CommandDescriptor {
                name,
                factory,
                metadata,
            },
        );
        Ok(())
    }

    /// Register a command from a plain closure.
    pub fn register_fn<F>(
        &mut self,
        name: impl Into<String>,
        factory: F,
        metadata: CommandMetadata,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&BuildContext<'_>) -> CommandNode + Send + Sync + 'static,
    {
        self.register(name, Arc::new(factory), metadata)
    }

    fn check_available(&self, name: &str, aliases: &[String]) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.items.contains_key(name) {
            return Err(RegistryError::DuplicateName {
                name: name.to_string(),
            });
        }
        if self.aliases.contains_key(name) {
            return Err(RegistryError::NameConflictsWithAlias {
                name: name.to_string(),
            });
        }

        for (i, alias) in aliases.iter().enumerate() {
            let repeated = alias == name || aliases[..i].contains(alias);
            if alias.is_empty()
                || repeated
                || self.items.contains_key(alias)
                || self.aliases.contains_key(alias)
            {
                return Err(RegistryError::DuplicateAlias {
                    alias: alias.clone(),
                });
            }
        }
        Ok(())
    }

    fn canonical<'a>(&'a self, key: &'a str) -> &'a str {
        if self.items.contains_key(key) {
            return key;
        }
        self.aliases.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Look up a command by canonical name or alias.
    pub fn get_descriptor(&self, key: &str) -> Option<&CommandDescriptor> {
        self.items.get(self.canonical(key))
    }

    /// Factory for a canonical name or alias.
    pub fn get(&self, key: &str) -> Option<&CommandFactory> {
        self.get_descriptor(key).map(|d| &d.factory)
    }

    /// Metadata for a canonical name or alias.
    pub fn get_metadata(&self, key: &str) -> Option<&CommandMetadata> {
        self.get_descriptor(key).map(|d| &d.metadata)
    }

    /// Canonical target of an alias. Canonical names are not aliases and
    /// resolve to `None`, as do unknown keys.
    pub fn resolve_alias(&self, key: &str) -> Option<&str> {
        if self.items.contains_key(key) {
            return None;
        }
        self.aliases.get(key).map(String::as_str)
    }

    pub fn is_alias(&self, key: &str) -> bool {
        self.resolve_alias(key).is_some()
    }

    /// Aliases recorded for a canonical name. `None` means the command does
    /// not exist; a command without aliases yields an empty slice.
    pub fn aliases(&self, name: &str) -> Option<&[String]> {
        self.items.get(name).map(|d| d.metadata.aliases.as_slice())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get_descriptor(key).is_some()
    }

    /// Canonical names in registration order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.order.iter().filter_map(|name| self.items.get(name))
    }

    /// Canonical names in `category`, in registration order.
    pub fn names_by_category(&self, category: &Category) -> Vec<&str> {
        self.descriptors()
            .filter(|d| &d.metadata.category == category)
            .map(|d| d.name.as_str())
            .collect()
    }

    /// Build every registered command once, in registration order.
    pub fn create_all(&self, ctx: &BuildContext<'_>) -> Vec<CommandNode> {
        self.descriptors().map(|d| d.build(ctx)).collect()
    }

    /// Build the commands of one category, in registration order.
    pub fn create_by_category(&self, category: &Category, ctx: &BuildContext<'_>) -> Vec<CommandNode> {
        self.descriptors()
            .filter(|d| &d.metadata.category == category)
            .map(|d| d.build(ctx))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Names and aliases starting with `prefix`, sorted.
    pub fn completions(&self, prefix: &str) -> Vec<&str> {
        let mut results: Vec<&str> = self
            .order
            .iter()
            .map(String::as_str)
            .chain(self.aliases.keys().map(String::as_str))
            .filter(|token| token.starts_with(prefix))
            .collect();
        results.sort_unstable();
        results
    }

    /// Closest name or alias to an unknown input, within edit distance 3.
    pub fn suggest(&self, input: &str) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        let mut tokens: Vec<&str> = self
            .order
            .iter()
            .map(String::as_str)
            .chain(self.aliases.keys().map(String::as_str))
            .collect();
        // HashMap iteration order is unstable; sort so ties resolve the same way every run.
        tokens.sort_unstable();

        for token in tokens {
            let dist = edit_distance(input, token);
            if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
                best = Some((token, dist));
            }
        }
        best.map(|(token, _)| token)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.order)
            .field("aliases", &self.aliases)
            .finish()
    }
}

/// Levenshtein distance used for "did you mean" hints.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev = (0..=b.len()).collect::<Vec<_>>();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
