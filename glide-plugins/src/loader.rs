//! Manifest plugin loader.
//!
//! A manifest plugin is a TOML file in the plugins directory that describes
//! the plugin and the shell commands it contributes:
//!
//! ```toml
//! [plugin]
//! name = "cloud"
//! version = "0.1.0"
//! description = "Sync the project with the cloud workspace"
//! aliases = ["cl"]
//! visibility = "project-only"
//!
//! [[commands]]
//! name = "push"
//! description = "Push local state"
//! run = "cloud-cli push"
//! aliases = ["p"]
//! ```

use crate::{Plugin, PluginError, PluginMetadata};
use async_trait::async_trait;
use glide_core::node::ANNOTATION_EXEC;
use glide_core::{BuildContext, CommandNode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Parsed manifest file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    pub plugin: PluginMetadata,
    #[serde(default)]
    pub commands: Vec<ManifestCommand>,
}

/// One sub-command contributed by a manifest plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestCommand {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Program line; caller arguments are appended.
    pub run: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub hidden: bool,
}

impl PluginManifest {
    /// Parse a manifest from TOML text.
    pub fn parse(text: &str) -> Result<Self, PluginError> {
        toml::from_str(text).map_err(|e| PluginError::LoadFailed(e.to_string()))
    }
}

/// Plugin backed by a manifest file.
#[derive(Debug, Clone)]
pub struct ManifestPlugin {
    manifest: PluginManifest,
}

impl ManifestPlugin {
    pub fn new(manifest: PluginManifest) -> Self {
        Self { manifest }
    }

    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }
}

#[async_trait]
impl Plugin for ManifestPlugin {
    fn metadata(&self) -> PluginMetadata {
        self.manifest.plugin.clone()
    }

    async fn on_load(&mut self) -> Result<(), PluginError> {
        let mut seen = HashSet::new();
        for cmd in &self.manifest.commands {
            if cmd.name.trim().is_empty() {
                return Err(PluginError::LoadFailed(format!(
                    "plugin {} declares a command without a name",
                    self.manifest.plugin.name
                )));
            }
            if cmd.run.trim().is_empty() {
                return Err(PluginError::LoadFailed(format!(
                    "command {} of plugin {} has nothing to run",
                    cmd.name, self.manifest.plugin.name
                )));
            }
            for token in std::iter::once(&cmd.name).chain(&cmd.aliases) {
                if !seen.insert(token.as_str()) {
                    return Err(PluginError::LoadFailed(format!(
                        "plugin {} uses {} more than once",
                        self.manifest.plugin.name, token
                    )));
                }
            }
        }
        Ok(())
    }

    fn command(&self, _ctx: &BuildContext<'_>) -> CommandNode {
        let meta = &self.manifest.plugin;
        let mut node = CommandNode::new(meta.name.clone(), meta.description.clone());
        for cmd in &self.manifest.commands {
            let mut child = CommandNode::new(cmd.name.clone(), cmd.description.clone())
                .hidden(cmd.hidden)
                .disable_flag_parsing(true)
                .annotate(ANNOTATION_EXEC, cmd.run.clone());
            for alias in &cmd.aliases {
                child = child.alias(alias.clone());
            }
            node = node.child(child);
        }
        node
    }
}

/// Finds and parses manifest plugins in a set of directories.
pub struct ManifestLoader {
    search_dirs: Vec<PathBuf>,
}

impl ManifestLoader {
    pub fn new() -> Self {
        Self {
            search_dirs: Vec::new(),
        }
    }

    /// Add a directory to search for manifests.
    pub fn add_search_dir(&mut self, dir: impl Into<PathBuf>) {
        self.search_dirs.push(dir.into());
    }

    /// List manifest files in the search directories, sorted by path.
    /// Missing directories are ignored.
    pub fn discover(&self) -> Vec<PathBuf> {
        let mut manifests = Vec::new();
        for dir in &self.search_dirs {
            if let Ok(entries) = std::fs::read_dir(dir) {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if is_manifest(&path) {
                        manifests.push(path);
                    }
                }
            }
        }
        manifests.sort();
        manifests
    }

    /// Read and parse one manifest.
    pub fn load(&self, path: &Path) -> Result<ManifestPlugin, PluginError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PluginError::LoadFailed(format!("{}: {}", path.display(), e)))?;
        let manifest = PluginManifest::parse(&text).map_err(|e| match e {
            PluginError::LoadFailed(msg) => {
                PluginError::LoadFailed(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        Ok(ManifestPlugin::new(manifest))
    }
}

impl Default for ManifestLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_manifest(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("toml")
}
