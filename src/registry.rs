// src/registry.rs

//! Installed-package registry
//!
//! The registry is a single JSON document, `{ "packages": [record, ...] }`,
//! pretty-printed with a 4-space indent. It is the sole authority for "is
//! package X installed" - install state is never inferred from the
//! filesystem. Every mutation rewrites the whole file atomically (write to a
//! temp file in the same directory, then rename), so a reader never observes
//! a torn document.
//!
//! Duplicate prevention is not enforced here; the orchestrator checks
//! [`RegistryStore::is_installed`] before calling [`RegistryStore::add`].

use crate::catalog::PackageDescriptor;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What gets persisted per installed package: the catalog descriptor
/// verbatim, so uninstall and run need no network access.
pub type InstalledRecord = PackageDescriptor;

/// The registry document shape on disk
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryDocument {
    packages: Vec<InstalledRecord>,
}

/// Handle on the registry file
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `name` appears among the stored records.
    ///
    /// A missing, unreadable, or malformed registry answers `false` - "not
    /// installed" is the safe default for a pre-flight check.
    pub fn is_installed(&self, name: &str) -> bool {
        match self.load() {
            Ok(doc) => doc.packages.iter().any(|record| record.name == name),
            Err(e) => {
                debug!("Registry unreadable, treating '{}' as not installed: {}", name, e);
                false
            }
        }
    }

    /// Append a record and rewrite the file.
    ///
    /// Starts from an empty document if the file is absent.
    pub fn add(&self, record: InstalledRecord) -> Result<()> {
        let mut doc = if self.path.exists() {
            self.load()?
        } else {
            RegistryDocument::default()
        };

        debug!("Recording '{}' in {}", record.name, self.path.display());
        doc.packages.push(record);
        self.store(&doc)
    }

    /// Remove every record named `name` and rewrite the file.
    ///
    /// A missing registry file makes removal a no-op success. When `name` is
    /// not found the file is still rewritten, unchanged.
    pub fn remove(&self, name: &str) -> Result<()> {
        if !self.path.exists() {
            warn!("Registry {} absent, nothing to remove", self.path.display());
            return Ok(());
        }

        let mut doc = self.load()?;
        let before = doc.packages.len();
        doc.packages.retain(|record| record.name != name);
        if doc.packages.len() == before {
            debug!("'{}' not present in registry", name);
        }
        self.store(&doc)
    }

    /// All stored records. Unlike [`Self::is_installed`], load and decode
    /// failures are surfaced - a listing has no safe default.
    pub fn list(&self) -> Result<Vec<InstalledRecord>> {
        Ok(self.load()?.packages)
    }

    /// The stored record for `name`, if any
    pub fn find(&self, name: &str) -> Result<Option<InstalledRecord>> {
        let doc = self.load()?;
        Ok(doc.packages.into_iter().find(|record| record.name == name))
    }

    fn load(&self) -> Result<RegistryDocument> {
        let body = fs::read_to_string(&self.path).map_err(|e| {
            Error::Registry(format!("Cannot read {}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&body).map_err(|e| {
            Error::Registry(format!("Malformed registry {}: {}", self.path.display(), e))
        })
    }

    /// Serialize `doc` in canonical pretty form (4-space indent) and replace
    /// the registry file atomically.
    fn store(&self, doc: &RegistryDocument) -> Result<()> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        doc.serialize(&mut serializer)
            .map_err(|e| Error::Registry(format!("Failed to serialize registry: {}", e)))?;

        let dir = self.path.parent().ok_or_else(|| {
            Error::Registry(format!("Registry path {} has no parent", self.path.display()))
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
            Error::Registry(format!("Cannot create temp file in {}: {}", dir.display(), e))
        })?;
        use std::io::Write;
        tmp.write_all(&buf)
            .map_err(|e| Error::Registry(format!("Failed to write registry: {}", e)))?;
        tmp.persist(&self.path).map_err(|e| {
            Error::Registry(format!("Cannot replace {}: {}", self.path.display(), e))
        })?;

        Ok(())
    }
}
