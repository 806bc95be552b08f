//! Startup state: configuration, detected context, and the command registry.

use crate::builtins;
use anyhow::Context;
use glide_core::declared::{load_declared_commands, load_declared_file};
use glide_core::{
    BuildContext, CommandNode, GlideConfig, ProjectContext, Registry, config_exists, context,
    is_visible, load_config,
};
use glide_plugins::PluginManager;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Everything a command handler needs.
pub struct App {
    pub workspace: PathBuf,
    pub config_file: Option<PathBuf>,
    pub config: GlideConfig,
    pub context: Option<ProjectContext>,
    pub registry: Registry,
    pub plugins: PluginManager,
}

impl App {
    /// Load configuration, detect the context, load plugins, and build the
    /// registry.
    pub async fn bootstrap(workspace: PathBuf, config_file: Option<PathBuf>) -> anyhow::Result<Self> {
        let context = context::detect(&workspace);
        let root = config_root(&workspace, context.as_ref()).to_path_buf();
        if config_file.is_none() && !config_exists(Some(&root)) {
            debug!("No configuration file found, using defaults");
        }
        let config = load_config(Some(&root), config_file.as_deref(), None)?;

        let mut plugins = PluginManager::new(config.plugins_dir())
            .with_disabled(config.plugins.disabled.iter().cloned())
            .with_max_capabilities(config.plugins.max_capabilities);
        let failures = plugins.load_manifests().await;
        if !failures.is_empty() {
            info!(failed = failures.len(), "Some plugins were not loaded");
        }

        Self::new(workspace, config_file, config, context, plugins)
    }

    /// Build the registry from already-loaded parts.
    ///
    /// Registration order is built-ins, plugins, then declared commands, so a
    /// built-in always owns its name.
    pub fn new(
        workspace: PathBuf,
        config_file: Option<PathBuf>,
        config: GlideConfig,
        context: Option<ProjectContext>,
        plugins: PluginManager,
    ) -> anyhow::Result<Self> {
        let problems = config.validate();
        if !problems.is_empty() {
            anyhow::bail!("Invalid configuration: {}", problems.join("; "));
        }
        debug!(?context, "Detected project context");

        let mut registry = Registry::new();
        builtins::register_builtins(&mut registry).context("registering built-in commands")?;
        plugins
            .register_commands(&mut registry)
            .context("registering plugin commands")?;

        if config.commands.enabled {
            if let Some(root) = context.as_ref().and_then(|c| c.project_root.as_deref()) {
                register_declared(&mut registry, root, &config.commands.file)?;
            }
        }

        Ok(Self {
            workspace,
            config_file,
            config,
            context,
            registry,
            plugins,
        })
    }

    pub fn context(&self) -> Option<&ProjectContext> {
        self.context.as_ref()
    }

    /// Directory holding `.glide/config.toml`: the project root when one was
    /// detected, the workspace otherwise.
    pub fn config_root(&self) -> &Path {
        config_root(&self.workspace, self.context())
    }

    /// Every registered command, built once.
    pub fn nodes(&self) -> Vec<CommandNode> {
        self.registry.create_all(&BuildContext::new(self.context()))
    }

    /// Commands visible in the current context, hidden ones included.
    pub fn visible_nodes(&self) -> Vec<CommandNode> {
        self.nodes()
            .into_iter()
            .filter(|node| {
                self.registry
                    .get_metadata(&node.name)
                    .is_none_or(|m| is_visible(m, self.context()))
            })
            .collect()
    }
}

fn config_root<'a>(workspace: &'a Path, context: Option<&'a ProjectContext>) -> &'a Path {
    context
        .and_then(|c| c.project_root.as_deref())
        .unwrap_or(workspace)
}

fn register_declared(registry: &mut Registry, root: &Path, file: &str) -> anyhow::Result<()> {
    let path = root.join(file);
    let declared = load_declared_file(&path)?;
    let report = load_declared_commands(registry, declared)
        .with_context(|| format!("registering commands from {}", path.display()))?;
    for name in &report.skipped {
        info!(command = %name, "Declared command shadows a built-in and was skipped");
    }
    Ok(())
}
