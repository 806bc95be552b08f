//! Plugin metadata validation.
//!
//! Checks plugin names, versions, and requested capabilities before a plugin
//! is allowed to contribute commands.

use crate::PluginMetadata;
use glide_core::is_protected;
use serde::{Deserialize, Serialize};

/// Capabilities a plugin can request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginCapability {
    /// Contribute top-level commands.
    CommandRegistration,
    /// Talk to the Docker daemon.
    DockerAccess,
    /// Access the filesystem outside the project.
    FileSystemAccess,
    /// Access network.
    NetworkAccess,
    /// Execute shell commands.
    ShellExecution,
}

/// Result of validation.
#[derive(Debug)]
pub struct SecurityValidationResult {
    pub is_valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Validates plugin metadata and capabilities.
pub struct PluginSecurityValidator {
    /// Blocked plugin names.
    blocked_names: Vec<String>,
    /// Maximum allowed capabilities (if set).
    max_capabilities: Option<usize>,
}

impl PluginSecurityValidator {
    /// Create a new validator with default settings.
    pub fn new() -> Self {
        Self {
            blocked_names: Vec::new(),
            max_capabilities: None,
        }
    }

    /// Block a specific plugin name.
    pub fn block_name(&mut self, name: impl Into<String>) {
        self.blocked_names.push(name.into());
    }

    /// Set maximum number of capabilities allowed. `None` lifts the cap.
    pub fn set_max_capabilities(&mut self, max: Option<usize>) {
        self.max_capabilities = max;
    }

    /// Validate plugin metadata.
    pub fn validate(&self, metadata: &PluginMetadata) -> SecurityValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.blocked_names.contains(&metadata.name) {
            errors.push(format!("Plugin '{}' is blocked", metadata.name));
        }

        if metadata.name.is_empty() {
            errors.push("Plugin name cannot be empty".into());
        } else if !is_valid_command_token(&metadata.name) {
            errors.push(format!(
                "Plugin name '{}' must use lowercase letters, digits, and dashes",
                metadata.name
            ));
        }

        // Built-in commands always win; a plugin may not claim their tokens.
        if is_protected(&metadata.name) {
            errors.push(format!(
                "Plugin name '{}' is reserved for a built-in command",
                metadata.name
            ));
        }
        for alias in &metadata.aliases {
            if !is_valid_command_token(alias) {
                errors.push(format!("Plugin alias '{}' is not a valid command name", alias));
            } else if is_protected(alias) {
                errors.push(format!(
                    "Plugin alias '{}' is reserved for a built-in command",
                    alias
                ));
            }
        }

        if metadata.version.is_empty() {
            errors.push("Plugin version cannot be empty".into());
        } else if semver::Version::parse(&metadata.version).is_err() {
            errors.push(format!(
                "Plugin version '{}' is not a semantic version",
                metadata.version
            ));
        }

        if let Some(max) = self.max_capabilities {
            if metadata.capabilities.len() > max {
                errors.push(format!(
                    "Plugin requests {} capabilities (max: {})",
                    metadata.capabilities.len(),
                    max
                ));
            }
        }

        for cap in &metadata.capabilities {
            match cap {
                PluginCapability::ShellExecution => {
                    warnings.push("Plugin requests shell execution capability".into());
                }
                PluginCapability::DockerAccess => {
                    warnings.push("Plugin requests Docker daemon access".into());
                }
                PluginCapability::FileSystemAccess => {
                    warnings.push("Plugin requests filesystem access".into());
                }
                PluginCapability::NetworkAccess => {
                    warnings.push("Plugin requests network access".into());
                }
                PluginCapability::CommandRegistration => {}
            }
        }

        if let Some(ref min_version) = metadata.min_core_version {
            if !is_version_compatible(min_version, env!("CARGO_PKG_VERSION")) {
                errors.push(format!(
                    "Plugin requires core version >= {} (current: {})",
                    min_version,
                    env!("CARGO_PKG_VERSION")
                ));
            }
        }

        let is_valid = errors.is_empty();
        SecurityValidationResult {
            is_valid,
            warnings,
            errors,
        }
    }
}

impl Default for PluginSecurityValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn is_valid_command_token(token: &str) -> bool {
    !token.is_empty()
        && !token.starts_with('-')
        && token
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Returns true if `current >= required`. Unparseable versions are incompatible.
fn is_version_compatible(required: &str, current: &str) -> bool {
    match (
        semver::Version::parse(required),
        semver::Version::parse(current),
    ) {
        (Ok(req), Ok(cur)) => cur >= req,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_metadata(name: &str, caps: Vec<PluginCapability>) -> PluginMetadata {
        PluginMetadata {
            name: name.into(),
            version: "1.0.0".into(),
            description: "Test".into(),
            author: None,
            aliases: Vec::new(),
            visibility: None,
            min_core_version: None,
            capabilities: caps,
        }
    }

    #[test]
    fn test_validate_clean_plugin() {
        let validator = PluginSecurityValidator::new();
        let meta = make_metadata("cloud-sync", vec![PluginCapability::CommandRegistration]);
        let result = validator.validate(&meta);
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_validate_blocked_name() {
        let mut validator = PluginSecurityValidator::new();
        validator.block_name("legacy");
        let result = validator.validate(&make_metadata("legacy", vec![]));
        assert!(!result.is_valid);
    }

    #[test]
    fn test_validate_empty_name() {
        let validator = PluginSecurityValidator::new();
        let result = validator.validate(&make_metadata("", vec![]));
        assert!(!result.is_valid);
    }

    #[test]
    fn test_validate_name_charset() {
        let validator = PluginSecurityValidator::new();
        for bad in ["Cloud", "cloud sync", "-x", "a_b"] {
            assert!(!validator.validate(&make_metadata(bad, vec![])).is_valid, "{bad}");
        }
    }

    #[test]
    fn test_validate_protected_name_and_alias() {
        let validator = PluginSecurityValidator::new();
        assert!(!validator.validate(&make_metadata("help", vec![])).is_valid);

        let mut meta = make_metadata("cloud", vec![]);
        meta.aliases = vec!["upgrade".into()];
        let result = validator.validate(&meta);
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("upgrade"));
    }

    #[test]
    fn test_validate_bad_version() {
        let validator = PluginSecurityValidator::new();
        let mut meta = make_metadata("cloud", vec![]);
        meta.version = "one".into();
        assert!(!validator.validate(&meta).is_valid);
    }

    #[test]
    fn test_validate_dangerous_capabilities_warn() {
        let validator = PluginSecurityValidator::new();
        let meta = make_metadata(
            "risky",
            vec![
                PluginCapability::ShellExecution,
                PluginCapability::DockerAccess,
            ],
        );
        let result = validator.validate(&meta);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn test_validate_max_capabilities() {
        let mut validator = PluginSecurityValidator::new();
        validator.set_max_capabilities(Some(1));
        let meta = make_metadata(
            "greedy",
            vec![
                PluginCapability::CommandRegistration,
                PluginCapability::NetworkAccess,
            ],
        );
        assert!(!validator.validate(&meta).is_valid);
    }

    #[test]
    fn test_version_compatible() {
        assert!(is_version_compatible("0.1.0", "0.1.0"));
        assert!(is_version_compatible("0.1.0", "0.2.0"));
        assert!(is_version_compatible("0.1.0", "1.0.0"));
        assert!(!is_version_compatible("1.0.0", "0.9.0"));
        assert!(!is_version_compatible("0.2.0", "0.1.9"));
        assert!(!is_version_compatible("latest", "0.1.0"));
    }

    #[test]
    fn test_version_incompatible_core() {
        let validator = PluginSecurityValidator::new();
        let mut meta = make_metadata("new-plugin", vec![]);
        meta.min_core_version = Some("999.0.0".into());
        assert!(!validator.validate(&meta).is_valid);
    }
}
