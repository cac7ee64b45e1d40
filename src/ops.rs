// src/ops.rs

//! Install and uninstall orchestration
//!
//! Sequencing for the top-level flows. Install: registry membership check,
//! catalog lookup, download/materialize, registry write. Uninstall: registry
//! membership check, file removal, registry write. The registry is consulted
//! first in both flows - the filesystem is never inspected to decide install
//! state - and a file-removal failure aborts the uninstall before the
//! registry is touched.

use crate::catalog::CatalogClient;
use crate::error::{Error, Result};
use crate::installer::{self, Progress};
use crate::layout::Layout;
use crate::registry::{InstalledRecord, RegistryStore};
use std::fs;
use std::process::{Command, ExitStatus};
use tracing::{info, warn};

/// Install `name` from the catalog.
///
/// Returns the record that was persisted. Already-installed packages
/// short-circuit before any network or filesystem activity.
pub fn install(
    client: &CatalogClient,
    layout: &Layout,
    name: &str,
    progress: &mut dyn Progress,
) -> Result<InstalledRecord> {
    layout.ensure_initialized()?;
    let registry = RegistryStore::new(layout.registry_file());

    if registry.is_installed(name) {
        return Err(Error::AlreadyInstalled(name.to_string()));
    }

    let catalog = client.fetch_catalog()?;
    let descriptor = catalog
        .find(name)
        .ok_or_else(|| Error::NotFound(name.to_string()))?;

    let record = installer::install_package(client, layout, descriptor, progress)?;
    registry.add(record.clone())?;

    info!("'{}' installed and recorded", name);
    Ok(record)
}

/// Uninstall `name`: remove its files, then its registry record.
///
/// A missing package directory is tolerated (re-running uninstall after a
/// partial failure clears the stale registry entry); any other removal
/// failure aborts before the registry is modified.
pub fn uninstall(layout: &Layout, name: &str) -> Result<()> {
    layout.ensure_initialized()?;
    let registry = RegistryStore::new(layout.registry_file());

    if !registry.is_installed(name) {
        return Err(Error::NotInstalled(name.to_string()));
    }

    let package_dir = layout.package_dir(name);
    match fs::remove_dir_all(&package_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Package directory {} already gone", package_dir.display());
        }
        Err(e) => return Err(e.into()),
    }

    registry.remove(name)?;
    info!("'{}' uninstalled", name);
    Ok(())
}

/// Run an installed package's entry point, inheriting stdio
pub fn run(layout: &Layout, name: &str) -> Result<ExitStatus> {
    layout.ensure_initialized()?;
    let registry = RegistryStore::new(layout.registry_file());

    let record = registry
        .find(name)?
        .ok_or_else(|| Error::NotInstalled(name.to_string()))?;
    let executable = record.executable.as_deref().ok_or(Error::InvalidMetadata {
        name: name.to_string(),
        field: "executable",
    })?;

    let executable_path = layout.executable_path(name, executable);
    info!("Running {}", executable_path.display());

    let status = Command::new(&executable_path).status()?;
    Ok(status)
}

/// All installed records, in registry order
pub fn list_installed(layout: &Layout) -> Result<Vec<InstalledRecord>> {
    layout.ensure_initialized()?;
    RegistryStore::new(layout.registry_file()).list()
}
