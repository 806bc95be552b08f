//! Configuration system for Glide.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from `~/.config/glide/config.toml` and/or `.glide/config.toml`
//! in the project directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::context::PROJECT_FILE;
use crate::error::{ConfigError, Result};

/// Top-level Glide configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlideConfig {
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub plugins: PluginsConfig,
}

/// Help output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Print aliases next to command names in help.
    pub show_aliases: bool,
    /// List commands registered as hidden.
    pub show_hidden: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_aliases: true,
            show_hidden: false,
        }
    }
}

/// Declared-command settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Load commands declared in the project file.
    pub enabled: bool,
    /// Project file holding the `commands:` mapping, relative to the project root.
    pub file: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: PROJECT_FILE.to_string(),
        }
    }
}

/// Plugin settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginsConfig {
    /// Directory scanned for plugins. Defaults to the user data directory.
    pub dir: Option<PathBuf>,
    /// Plugin names that are never registered.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Refuse plugins requesting more capabilities than this.
    #[serde(default)]
    pub max_capabilities: Option<usize>,
}

impl GlideConfig {
    /// Return a list of problems with this configuration.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.commands.file.trim().is_empty() {
            problems.push("commands.file must not be empty".to_string());
        }
        if Path::new(&self.commands.file).is_absolute() {
            problems.push(format!(
                "commands.file must be relative to the project root, got {}",
                self.commands.file
            ));
        }
        for name in &self.plugins.disabled {
            if name.trim().is_empty() {
                problems.push("plugins.disabled contains an empty name".to_string());
            }
        }
        problems
    }

    /// Directory plugins are loaded from.
    pub fn plugins_dir(&self) -> PathBuf {
        self.plugins.dir.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|d| d.data_dir().join("plugins"))
                .unwrap_or_else(|| PathBuf::from(".glide").join("plugins"))
        })
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "glide", "glide")
}

/// Path of the user-level configuration file.
pub fn user_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
}

/// Path of the project-level configuration file.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".glide").join("config.toml")
}

/// Load configuration with layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `GLIDE_`)
/// 3. Explicit config file, when given
/// 4. Workspace-local config (`.glide/config.toml`)
/// 5. User config (`~/.config/glide/config.toml`)
/// 6. Built-in defaults
///
/// An explicit `config_file` must exist; the user and workspace files are
/// optional.
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
    overrides: Option<&GlideConfig>,
) -> Result<GlideConfig> {
    let mut figment = Figment::from(Serialized::defaults(GlideConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = config_file {
        if !path.is_file() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        figment = figment.merge(Toml::file(path));
    }

    // GLIDE_UI__SHOW_HIDDEN, GLIDE_COMMANDS__FILE, etc.
    figment = figment.merge(Env::prefixed("GLIDE_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(|e| {
        ConfigError::ParseError {
            message: e.to_string(),
        }
        .into()
    })
}

/// Check whether any Glide configuration file exists.
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if user_config_path().is_some_and(|p| p.exists()) {
        return true;
    }
    workspace.is_some_and(|ws| workspace_config_path(ws).exists())
}

/// Write the default configuration to `.glide/config.toml` under `workspace`.
///
/// Returns `Ok(None)` when the file already exists.
pub fn write_default_config(workspace: &Path) -> std::result::Result<Option<PathBuf>, ConfigError> {
    let path = workspace_config_path(workspace);
    if path.exists() {
        return Ok(None);
    }
    let toml_str =
        toml::to_string_pretty(&GlideConfig::default()).map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })?;
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &toml_str)
    };
    write().map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    Ok(Some(path))
}
