// src/installer/mod.rs

//! Download and install-strategy dispatch
//!
//! Given a catalog descriptor, this module downloads the payload into the
//! package directory and materializes it according to the descriptor's
//! install kind: raw executable, platform installer, or zip archive. Any
//! step failure aborts the sequence; partially created directories are left
//! for a re-run to overwrite, but a partially downloaded artifact is deleted
//! (best effort) so re-install starts clean.

pub mod archive;

use crate::catalog::{CatalogClient, InstallKind, PackageDescriptor};
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::registry::InstalledRecord;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};

/// Observer for download progress, invoked synchronously as bytes arrive
pub trait Progress {
    /// `transferred` bytes copied so far, out of `total` when the server
    /// declared a content length
    fn update(&mut self, transferred: u64, total: Option<u64>);
}

/// Observer that discards all progress events
pub struct NoProgress;

impl Progress for NoProgress {
    fn update(&mut self, _transferred: u64, _total: Option<u64>) {}
}

/// Read adapter that reports cumulative bytes to a [`Progress`] observer
/// without altering the stream
struct ProgressReader<'a, R> {
    inner: R,
    observer: &'a mut dyn Progress,
    transferred: u64,
    total: Option<u64>,
}

impl<'a, R: Read> ProgressReader<'a, R> {
    fn new(inner: R, observer: &'a mut dyn Progress, total: Option<u64>) -> Self {
        Self {
            inner,
            observer,
            transferred: 0,
            total,
        }
    }
}

impl<R: Read> Read for ProgressReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.transferred += n as u64;
        self.observer.update(self.transferred, self.total);
        Ok(n)
    }
}

/// The descriptor fields installation requires, validated up front
#[derive(Debug)]
struct InstallPlan<'a> {
    name: &'a str,
    download: &'a str,
    kind: InstallKind,
    artifact_name: &'a str,
}

fn plan<'a>(descriptor: &'a PackageDescriptor) -> Result<InstallPlan<'a>> {
    let missing = |field| Error::InvalidMetadata {
        name: descriptor.name.clone(),
        field,
    };

    if descriptor.name.is_empty() {
        return Err(missing("name"));
    }
    let download = descriptor.download.as_deref().ok_or_else(|| missing("download"))?;
    let kind = descriptor.install.ok_or_else(|| missing("install"))?;
    descriptor.executable.as_deref().ok_or_else(|| missing("executable"))?;

    // Artifact file name is the final path segment of the download URL
    let artifact_name = download.rsplit('/').next().unwrap_or_default();
    if artifact_name.is_empty() {
        return Err(missing("download"));
    }

    Ok(InstallPlan {
        name: &descriptor.name,
        download,
        kind,
        artifact_name,
    })
}

/// Download and materialize `descriptor` under the layout's programs tree.
///
/// On success the package directory holds a runnable entry point at the
/// descriptor's `executable` path and the returned record can be persisted.
pub fn install_package(
    client: &CatalogClient,
    layout: &Layout,
    descriptor: &PackageDescriptor,
    progress: &mut dyn Progress,
) -> Result<InstalledRecord> {
    let plan = plan(descriptor)?;

    let package_dir = layout.package_dir(plan.name);
    fs::create_dir_all(&package_dir)?;

    let artifact_path = package_dir.join(plan.artifact_name);
    download_to(client, plan.name, plan.download, &artifact_path, progress)?;

    materialize(plan.kind, plan.name, &artifact_path, &package_dir)?;

    info!("Installed '{}' into {}", plan.name, package_dir.display());
    Ok(descriptor.clone())
}

/// Stream `url` into `dest`, reporting progress incrementally.
///
/// A failed transfer deletes the partial file before returning the error.
fn download_to(
    client: &CatalogClient,
    name: &str,
    url: &str,
    dest: &Path,
    progress: &mut dyn Progress,
) -> Result<()> {
    info!("Downloading {} to {}", url, dest.display());

    let download_err = |reason: String| Error::Download {
        name: name.to_string(),
        reason,
    };

    let response = client
        .http()
        .get(url)
        .send()
        .map_err(|e| download_err(format!("request to {} failed: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(download_err(format!("HTTP {} from {}", response.status(), url)));
    }

    let total = response.content_length();
    let mut reader = ProgressReader::new(response, progress, total);

    let result = File::create(dest)
        .map_err(|e| download_err(format!("cannot create {}: {}", dest.display(), e)))
        .and_then(|mut file| {
            io::copy(&mut reader, &mut file)
                .map_err(|e| download_err(format!("transfer from {} failed: {}", url, e)))
        });

    if let Err(e) = result {
        if let Err(cleanup) = fs::remove_file(dest) {
            warn!("Could not clean up partial download {}: {}", dest.display(), cleanup);
        }
        return Err(e);
    }

    Ok(())
}

/// Turn the downloaded artifact into a runnable installation
fn materialize(kind: InstallKind, name: &str, artifact_path: &Path, package_dir: &Path) -> Result<()> {
    match kind {
        InstallKind::Exe => mark_executable(artifact_path),
        InstallKind::Setup => run_platform_installer(name, artifact_path, package_dir),
        InstallKind::Zip => {
            archive::extract(artifact_path, package_dir)?;
            fs::remove_file(artifact_path)?;

            // Upstream archives conventionally wrap their payload in one
            // top-level folder named after the archive; flatten it away.
            let stem = artifact_path.file_stem().unwrap_or_default();
            let wrapper = package_dir.join(stem);
            if wrapper.is_dir() {
                archive::flatten_into(&wrapper)?;
            }
            Ok(())
        }
        InstallKind::Unknown => Err(Error::UnknownInstallKind(name.to_string())),
    }
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<()> {
    // Windows derives executability from the file extension
    Ok(())
}

/// Run the platform's native installer against the artifact, targeting the
/// package directory, non-interactively. Exit status decides success.
fn run_platform_installer(name: &str, artifact_path: &Path, package_dir: &Path) -> Result<()> {
    let mut command = platform_installer_command(artifact_path, package_dir)?;
    debug!("Running installer: {:?}", command);

    let status = command.status().map_err(|e| Error::ExternalInstaller {
        name: name.to_string(),
        reason: format!("failed to launch installer: {}", e),
    })?;

    if !status.success() {
        return Err(Error::ExternalInstaller {
            name: name.to_string(),
            reason: format!("installer exited with {}", status),
        });
    }
    Ok(())
}

#[cfg(windows)]
fn platform_installer_command(artifact_path: &Path, package_dir: &Path) -> Result<Command> {
    let mut command = Command::new("msiexec");
    command
        .arg("/i")
        .arg(artifact_path)
        .arg("/qn")
        .arg(format!("INSTALLDIR={}", package_dir.display()));
    Ok(command)
}

#[cfg(not(windows))]
fn platform_installer_command(artifact_path: &Path, package_dir: &Path) -> Result<Command> {
    // No msiexec outside Windows; run the installer itself with the target
    // directory as its argument.
    mark_executable(artifact_path)?;
    let mut command = Command::new(artifact_path);
    command.arg(package_dir);
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn descriptor(name: &str, kind: Option<InstallKind>) -> PackageDescriptor {
        PackageDescriptor {
            name: name.to_string(),
            title: None,
            version: None,
            author: None,
            description: None,
            download: Some(format!("https://example.com/dl/{}.zip", name)),
            install: kind,
            executable: Some("run.bin".to_string()),
        }
    }

    #[test]
    fn test_plan_requires_download_field() {
        let mut d = descriptor("foo", Some(InstallKind::Zip));
        d.download = None;
        let err = plan(&d).unwrap_err();
        assert!(matches!(err, Error::InvalidMetadata { field: "download", .. }));
    }

    #[test]
    fn test_plan_requires_install_kind() {
        let d = descriptor("foo", None);
        let err = plan(&d).unwrap_err();
        assert!(matches!(err, Error::InvalidMetadata { field: "install", .. }));
    }

    #[test]
    fn test_plan_requires_executable() {
        let mut d = descriptor("foo", Some(InstallKind::Exe));
        d.executable = None;
        let err = plan(&d).unwrap_err();
        assert!(matches!(err, Error::InvalidMetadata { field: "executable", .. }));
    }

    #[test]
    fn test_plan_derives_artifact_name_from_url() {
        let d = descriptor("foo", Some(InstallKind::Zip));
        let plan = plan(&d).unwrap();
        assert_eq!(plan.artifact_name, "foo.zip");
    }

    #[test]
    fn test_plan_rejects_url_with_trailing_slash() {
        let mut d = descriptor("foo", Some(InstallKind::Zip));
        d.download = Some("https://example.com/dl/".to_string());
        assert!(plan(&d).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_materialize_exe_sets_execute_bit() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let artifact = temp.path().join("tool.bin");
        fs::write(&artifact, b"#!/bin/sh\n").unwrap();

        materialize(InstallKind::Exe, "tool", &artifact, temp.path()).unwrap();

        let mode = fs::metadata(&artifact).unwrap().permissions().mode();
        assert_ne!(mode & 0o111, 0);
    }

    #[test]
    fn test_materialize_zip_extracts_deletes_and_flattens() {
        let temp = tempfile::tempdir().unwrap();
        let package_dir = temp.path().join("bar");
        fs::create_dir_all(&package_dir).unwrap();

        // Archive wraps its payload in a single "payload/" folder
        let artifact = package_dir.join("payload.zip");
        let file = File::create(&artifact).unwrap();
        let mut writer = ZipWriter::new(file);
        writer.add_directory("payload/app/", FileOptions::default()).unwrap();
        writer.start_file("payload/app/run.bin", FileOptions::default()).unwrap();
        writer.write_all(b"binary").unwrap();
        writer.finish().unwrap();

        materialize(InstallKind::Zip, "bar", &artifact, &package_dir).unwrap();

        assert!(package_dir.join("app/run.bin").is_file());
        assert!(!package_dir.join("payload").exists());
        assert!(!artifact.exists());
    }

    #[test]
    fn test_materialize_zip_without_wrapper_dir() {
        let temp = tempfile::tempdir().unwrap();
        let package_dir = temp.path().join("flat");
        fs::create_dir_all(&package_dir).unwrap();

        let artifact = package_dir.join("flat.zip");
        let file = File::create(&artifact).unwrap();
        let mut writer = ZipWriter::new(file);
        writer.start_file("run.bin", FileOptions::default()).unwrap();
        writer.write_all(b"binary").unwrap();
        writer.finish().unwrap();

        materialize(InstallKind::Zip, "flat", &artifact, &package_dir).unwrap();

        assert!(package_dir.join("run.bin").is_file());
        assert!(!artifact.exists());
    }

    #[test]
    fn test_materialize_unknown_kind_errors() {
        let temp = tempfile::tempdir().unwrap();
        let artifact = temp.path().join("mystery.dat");
        fs::write(&artifact, b"?").unwrap();

        let result = materialize(InstallKind::Unknown, "mystery", &artifact, temp.path());
        assert!(matches!(result, Err(Error::UnknownInstallKind(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_setup_kind_runs_installer_and_checks_status() {
        let temp = tempfile::tempdir().unwrap();
        let package_dir = temp.path().join("pkg");
        fs::create_dir_all(&package_dir).unwrap();

        // Fake installer: drops a marker file into its target directory
        let installer = package_dir.join("setup.sh");
        fs::write(&installer, "#!/bin/sh\ntouch \"$1/installed.marker\"\n").unwrap();

        materialize(InstallKind::Setup, "pkg", &installer, &package_dir).unwrap();
        assert!(package_dir.join("installed.marker").is_file());

        // Failing installer surfaces as ExternalInstaller
        let bad = package_dir.join("bad.sh");
        fs::write(&bad, "#!/bin/sh\nexit 3\n").unwrap();
        let result = materialize(InstallKind::Setup, "pkg", &bad, &package_dir);
        assert!(matches!(result, Err(Error::ExternalInstaller { .. })));
    }

    #[test]
    fn test_progress_reader_reports_cumulative_bytes() {
        struct Capture(Vec<u64>);
        impl Progress for Capture {
            fn update(&mut self, transferred: u64, total: Option<u64>) {
                assert_eq!(total, Some(10));
                self.0.push(transferred);
            }
        }

        let mut capture = Capture(Vec::new());
        let data = [0u8; 10];
        let mut reader = ProgressReader::new(&data[..], &mut capture, Some(10));
        let mut sink = Vec::new();
        io::copy(&mut reader, &mut sink).unwrap();

        assert_eq!(sink.len(), 10);
        assert_eq!(capture.0.last(), Some(&10));
    }
}
