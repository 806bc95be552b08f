//! # Glide Core
//!
//! Core library for the Glide developer CLI.
//! Provides the command registry, the project context model, the
//! context-aware visibility rules, declared (configuration-defined) commands,
//! help composition, and configuration loading.

pub mod category;
pub mod config;
pub mod context;
pub mod declared;
pub mod error;
pub mod help;
pub mod node;
pub mod protected;
pub mod registry;
pub mod visibility;

// Re-export commonly used types at the crate root.
pub use category::Category;
pub use config::{GlideConfig, config_exists, load_config};
pub use context::{DevelopmentMode, Location, ProjectContext};
pub use declared::{DeclaredCommand, DeclaredOutcome, LoadReport};
pub use error::{ConfigError, GlideError, RegistryError, Result};
pub use help::{HelpChild, HelpEntry, HelpOptions, HelpSection, compose_help, compose_help_with};
pub use node::CommandNode;
pub use protected::{PROTECTED_NAMES, is_protected};
pub use registry::{BuildContext, CommandDescriptor, CommandFactory, CommandMetadata, Registry};
pub use visibility::{VisibilityTag, is_visible, should_show_category, should_show_command};
