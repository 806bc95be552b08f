//! Error types for the Glide core library.
//!
//! Uses `thiserror` for structured error variants covering command
//! registration and configuration loading.

use std::path::PathBuf;

/// Top-level error type for the Glide core library.
#[derive(Debug, thiserror::Error)]
pub enum GlideError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from command registration.
///
/// These are raised eagerly while the registry is populated at startup and
/// always name the colliding token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("item name cannot be empty")]
    EmptyName,

    #[error("item name {name} already registered")]
    DuplicateName { name: String },

    #[error("item name {name} conflicts with existing alias")]
    NameConflictsWithAlias { name: String },

    #[error("alias {alias} already registered")]
    DuplicateAlias { alias: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A type alias for results using the top-level `GlideError`.
pub type Result<T> = std::result::Result<T, GlideError>;
