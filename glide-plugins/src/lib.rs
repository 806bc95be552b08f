//! # Glide Plugins
//!
//! Plugin system for Glide. A plugin contributes one top-level command
//! (usually with sub-commands) that is listed under the plugin category and
//! expanded one level deep in help output.

pub mod loader;
pub mod security;

use async_trait::async_trait;
use glide_core::{
    BuildContext, Category, CommandMetadata, CommandNode, Registry, RegistryError, VisibilityTag,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub use loader::{ManifestLoader, ManifestPlugin, PluginManifest};
pub use security::{PluginCapability, PluginSecurityValidator, SecurityValidationResult};

/// Errors from plugin operations.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Plugin not found: {0}")]
    NotFound(String),
    #[error("Plugin already loaded: {0}")]
    AlreadyLoaded(String),
    #[error("Failed to load plugin: {0}")]
    LoadFailed(String),
    #[error("Security validation failed: {0}")]
    SecurityViolation(String),
    #[error("Plugin command registration failed: {0}")]
    Registration(#[from] RegistryError),
}

/// Metadata about a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Plugin name; also the name of its top-level command.
    pub name: String,
    /// Plugin version (semver).
    pub version: String,
    /// Human-readable description.
    pub description: String,
    /// Author.
    pub author: Option<String>,
    /// Aliases for the plugin's top-level command.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Where the plugin's command is shown.
    #[serde(default)]
    pub visibility: Option<VisibilityTag>,
    /// Required Glide core version.
    pub min_core_version: Option<String>,
    /// Plugin capabilities.
    #[serde(default)]
    pub capabilities: Vec<PluginCapability>,
}

/// The Plugin trait that all plugins must implement.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Get plugin metadata.
    fn metadata(&self) -> PluginMetadata;

    /// Called when the plugin is loaded.
    async fn on_load(&mut self) -> Result<(), PluginError>;

    /// Called when the plugin is unloaded. The plugin may still be shared
    /// with command factories at this point, hence `&self`.
    async fn on_unload(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Build the plugin's command tree. Must be free of side effects.
    fn command(&self, ctx: &BuildContext<'_>) -> CommandNode;
}

/// State of a loaded plugin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginState {
    pub metadata: PluginMetadata,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
    pub source_path: Option<String>,
}

/// Manages plugin lifecycle: load, unload, list, and command registration.
pub struct PluginManager {
    plugins: BTreeMap<String, PluginEntry>,
    plugins_dir: PathBuf,
    validator: PluginSecurityValidator,
}

struct PluginEntry {
    plugin: Arc<dyn Plugin>,
    state: PluginState,
}

impl PluginManager {
    /// Create a new plugin manager.
    pub fn new(plugins_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugins: BTreeMap::new(),
            plugins_dir: plugins_dir.into(),
            validator: PluginSecurityValidator::new(),
        }
    }

    /// Refuse to load any plugin in `names`.
    pub fn with_disabled<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.validator.block_name(name);
        }
        self
    }

    /// Refuse plugins requesting more than `max` capabilities.
    pub fn with_max_capabilities(mut self, max: Option<usize>) -> Self {
        self.validator.set_max_capabilities(max);
        self
    }

    /// Validate and load a plugin.
    pub async fn load(&mut self, plugin: Box<dyn Plugin>) -> Result<(), PluginError> {
        self.load_from(plugin, None).await
    }

    /// Validate and load a plugin, recording where it came from.
    pub async fn load_from(
        &mut self,
        mut plugin: Box<dyn Plugin>,
        source_path: Option<&Path>,
    ) -> Result<(), PluginError> {
        let metadata = plugin.metadata();
        let name = metadata.name.clone();

        if self.plugins.contains_key(&name) {
            return Err(PluginError::AlreadyLoaded(name));
        }

        let validation = self.validator.validate(&metadata);
        for warning in &validation.warnings {
            warn!(plugin = %name, "{}", warning);
        }
        if !validation.is_valid {
            return Err(PluginError::SecurityViolation(
                validation
                    .errors
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "Unknown validation issue".into()),
            ));
        }

        plugin.on_load().await?;
        debug!(plugin = %name, version = %metadata.version, "Plugin loaded");

        let state = PluginState {
            metadata,
            loaded_at: chrono::Utc::now(),
            source_path: source_path.map(|p| p.display().to_string()),
        };
        self.plugins.insert(
            name,
            PluginEntry {
                plugin: Arc::from(plugin),
                state,
            },
        );
        Ok(())
    }

    /// Load every manifest plugin found in the plugins directory.
    ///
    /// A plugin that fails to parse or validate does not stop the others;
    /// failures are logged and returned.
    pub async fn load_manifests(&mut self) -> Vec<(PathBuf, PluginError)> {
        let mut loader = ManifestLoader::new();
        loader.add_search_dir(&self.plugins_dir);

        let mut failures = Vec::new();
        for path in loader.discover() {
            let result = match loader.load(&path) {
                Ok(plugin) => self.load_from(Box::new(plugin), Some(&path)).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                warn!(path = %path.display(), error = %e, "Skipping plugin");
                failures.push((path, e));
            }
        }
        failures
    }

    /// Unload a plugin by name.
    pub async fn unload(&mut self, name: &str) -> Result<(), PluginError> {
        let entry = self
            .plugins
            .remove(name)
            .ok_or_else(|| PluginError::NotFound(name.into()))?;
        entry.plugin.on_unload().await
    }

    /// Register one command per loaded plugin, in plugin-name order.
    ///
    /// Returns the registered command names.
    pub fn register_commands(&self, registry: &mut Registry) -> Result<Vec<String>, PluginError> {
        let mut registered = Vec::new();
        for (name, entry) in &self.plugins {
            let meta = &entry.state.metadata;
            let mut metadata = CommandMetadata::new(Category::Plugin, meta.description.clone())
                .with_aliases(meta.aliases.iter().cloned());
            if let Some(tag) = &meta.visibility {
                metadata = metadata.with_visibility(tag.clone());
            }

            let plugin = Arc::clone(&entry.plugin);
            let command_name = name.clone();
            registry.register_fn(
                name.clone(),
                move |ctx| {
                    let mut node = plugin.command(ctx);
                    node.name = command_name.clone();
                    node
                },
                metadata,
            )?;
            registered.push(name.clone());
        }
        Ok(registered)
    }

    /// List all loaded plugins, sorted by name.
    pub fn list(&self) -> Vec<&PluginState> {
        self.plugins.values().map(|e| &e.state).collect()
    }

    /// Get a plugin state by name.
    pub fn get(&self, name: &str) -> Option<&PluginState> {
        self.plugins.get(name).map(|e| &e.state)
    }

    /// Number of loaded plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugins are loaded.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Get the plugins directory.
    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }
}
