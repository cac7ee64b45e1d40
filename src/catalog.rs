// src/catalog.rs

//! Remote package catalog
//!
//! The catalog is a static JSON document served over HTTP:
//! `{ "packages": [PackageDescriptor, ...] }`. It is read-only and fetched
//! fresh for every command that needs it - no caching, no retries.

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Default catalog location
pub const DEFAULT_CATALOG_URL: &str = "https://jooapa.akonpelto.net/db.json";

/// Connect timeout for catalog and payload requests. Transfers themselves
/// are not time-limited; payload downloads may legitimately run long.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// How a downloaded artifact is turned into a runnable installation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallKind {
    /// The artifact itself is the entry point; mark it executable
    Exe,
    /// Hand the artifact to the platform installer, targeting the package dir
    Setup,
    /// Extract the artifact into the package dir, then delete it
    Zip,
    /// Catalog carried a tag this version does not understand
    #[serde(other)]
    Unknown,
}

/// One installable package as described by the catalog.
///
/// Only `name` is required at the decode boundary; the fields installation
/// needs (`download`, `install`, `executable`) are validated by the installer
/// so one incomplete catalog entry cannot poison the whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<InstallKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
}

/// The decoded catalog document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub packages: Vec<PackageDescriptor>,
}

impl Catalog {
    /// Exact-name lookup
    pub fn find(&self, name: &str) -> Option<&PackageDescriptor> {
        self.packages.iter().find(|pkg| pkg.name == name)
    }

    /// Substring search over package names
    pub fn search<'a>(&'a self, query: &str) -> Vec<&'a PackageDescriptor> {
        self.packages
            .iter()
            .filter(|pkg| pkg.name.contains(query))
            .collect()
    }
}

/// Blocking HTTP client for the catalog and payload downloads
pub struct CatalogClient {
    client: Client,
    catalog_url: String,
}

impl CatalogClient {
    pub fn new(catalog_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(None)
            .build()
            .map_err(|e| Error::Catalog(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            catalog_url: catalog_url.into(),
        })
    }

    /// Fetch and decode the catalog. Single attempt; any non-success status
    /// or decode failure is fatal to the calling command.
    pub fn fetch_catalog(&self) -> Result<Catalog> {
        info!("Fetching catalog from {}", self.catalog_url);

        let response = self
            .client
            .get(&self.catalog_url)
            .send()
            .map_err(|e| Error::Catalog(format!("Request to {} failed: {}", self.catalog_url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Catalog(format!(
                "HTTP {} from {}",
                response.status(),
                self.catalog_url
            )));
        }

        let catalog: Catalog = response
            .json()
            .map_err(|e| Error::Catalog(format!("Failed to decode catalog JSON: {}", e)))?;

        info!("Catalog lists {} packages", catalog.packages.len());
        Ok(catalog)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> PackageDescriptor {
        PackageDescriptor {
            name: name.to_string(),
            title: None,
            version: None,
            author: None,
            description: None,
            download: None,
            install: None,
            executable: None,
        }
    }

    #[test]
    fn test_decode_full_descriptor() {
        let body = r#"{
            "packages": [{
                "name": "foo",
                "title": "Foo",
                "version": "1.2",
                "author": "someone",
                "description": "a thing",
                "download": "https://example.com/dl/foo.zip",
                "install": "zip",
                "executable": "foo.exe"
            }]
        }"#;

        let catalog: Catalog = serde_json::from_str(body).unwrap();
        let pkg = catalog.find("foo").unwrap();
        assert_eq!(pkg.install, Some(InstallKind::Zip));
        assert_eq!(pkg.executable.as_deref(), Some("foo.exe"));
    }

    #[test]
    fn test_decode_tolerates_missing_install_fields() {
        let body = r#"{"packages": [{"name": "bare"}]}"#;
        let catalog: Catalog = serde_json::from_str(body).unwrap();
        let pkg = catalog.find("bare").unwrap();
        assert!(pkg.download.is_none());
        assert!(pkg.install.is_none());
    }

    #[test]
    fn test_decode_unknown_install_kind() {
        let body = r#"{"packages": [{"name": "odd", "install": "tarball"}]}"#;
        let catalog: Catalog = serde_json::from_str(body).unwrap();
        assert_eq!(catalog.find("odd").unwrap().install, Some(InstallKind::Unknown));
    }

    #[test]
    fn test_decode_missing_packages_key_is_error() {
        let result: std::result::Result<Catalog, _> = serde_json::from_str(r#"{"pkgs": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_search_is_substring_match() {
        let catalog = Catalog {
            packages: vec![descriptor("ripgrep"), descriptor("grep"), descriptor("fd")],
        };

        let hits = catalog.search("grep");
        assert_eq!(hits.len(), 2);
        assert!(catalog.search("zzz").is_empty());
    }

    #[test]
    fn test_find_is_exact() {
        let catalog = Catalog {
            packages: vec![descriptor("ripgrep")],
        };
        assert!(catalog.find("ripgrep").is_some());
        assert!(catalog.find("grep").is_none());
    }
}
