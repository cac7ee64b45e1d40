// src/layout.rs

//! On-disk layout for pakr
//!
//! Everything lives under a single root directory (`~/.pakr` by default):
//! installed payloads under `programs/<name>/` and the registry document at
//! `installed.json`. The root is created once by [`Layout::init`]; the
//! install/uninstall flows require it to exist already.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the registry document inside the root
const REGISTRY_FILE: &str = "installed.json";

/// Subdirectory holding one directory per installed package
const PROGRAMS_DIR: &str = "programs";

/// Filesystem layout rooted at a single directory
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Layout rooted at an explicit directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout rooted at `~/.pakr`
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().ok_or(Error::NoHomeDir)?;
        Ok(Self::new(home.join(".pakr")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry_file(&self) -> PathBuf {
        self.root.join(REGISTRY_FILE)
    }

    pub fn programs_dir(&self) -> PathBuf {
        self.root.join(PROGRAMS_DIR)
    }

    /// Directory a package's payload is installed into
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.programs_dir().join(name)
    }

    /// Full path to a package's entry point, given its relative `executable`
    pub fn executable_path(&self, name: &str, executable: &str) -> PathBuf {
        self.package_dir(name).join(executable)
    }

    /// Create the root, the programs directory, and an empty registry file.
    ///
    /// Idempotent - existing directories are kept and an existing registry
    /// file is left untouched.
    pub fn init(&self) -> Result<()> {
        debug!("Initializing layout at {}", self.root.display());

        fs::create_dir_all(&self.root)?;
        fs::create_dir_all(self.programs_dir())?;

        let registry = self.registry_file();
        if !registry.exists() {
            fs::write(&registry, "{\n    \"packages\": []\n}")?;
            info!("Created empty registry at {}", registry.display());
        }

        Ok(())
    }

    /// Verify `init` has been run, for flows that refuse to self-initialize
    pub fn ensure_initialized(&self) -> Result<()> {
        if !self.registry_file().exists() {
            return Err(Error::NotInitialized(self.root.clone()));
        }
        Ok(())
    }
}
