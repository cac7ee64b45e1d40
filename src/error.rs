// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for pakr
#[derive(Error, Debug)]
pub enum Error {
    /// Catalog unreachable, non-200, or undecodable
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Package name absent from the catalog
    #[error("Package '{0}' not found in the catalog")]
    NotFound(String),

    /// Install requested for a package the registry already holds
    #[error("Package '{0}' is already installed")]
    AlreadyInstalled(String),

    /// Uninstall/run requested for a package the registry does not hold
    #[error("Package '{0}' is not installed")]
    NotInstalled(String),

    /// Network or I/O failure while downloading a payload
    #[error("Download of '{name}' failed: {reason}")]
    Download { name: String, reason: String },

    /// Descriptor missing a field required for installation
    #[error("Invalid metadata for package '{name}': missing field '{field}'")]
    InvalidMetadata { name: String, field: &'static str },

    /// Install-kind tag not one of `exe`, `setup`, `zip`
    #[error("Unknown install type for package '{0}'")]
    UnknownInstallKind(String),

    /// Archive entry malformed or unwritable
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Archive entry attempts to escape the extraction destination
    #[error("Archive entry '{0}' escapes the destination directory")]
    PathTraversal(String),

    /// Platform installer process failed
    #[error("External installer for '{name}' failed: {reason}")]
    ExternalInstaller { name: String, reason: String },

    /// Registry file unreadable, unwritable, or malformed
    #[error("Registry error: {0}")]
    Registry(String),

    /// Home directory could not be resolved
    #[error("Could not determine the current user's home directory")]
    NoHomeDir,

    /// Layout root missing, `pakr init` has not been run
    #[error("pakr is not initialized at {} (run 'pakr init')", .0.display())]
    NotInitialized(PathBuf),

    /// I/O errors from directory creation/removal and file moves
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using pakr's Error type
pub type Result<T> = std::result::Result<T, Error>;
