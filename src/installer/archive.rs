// src/installer/archive.rs

//! Zip extraction and post-extraction normalization
//!
//! Extraction is entry-by-entry with no transactional rollback: the first
//! failing entry aborts the whole operation and anything already written
//! stays on disk. Every entry path must resolve inside the destination
//! directory; an entry that escapes it (ZipSlip) is rejected outright.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{debug, trace};
use zip::ZipArchive;

/// Extract `archive_path` into `dest_dir`.
///
/// Directory entries are created with their stored permission bits; file
/// entries overwrite anything already at their target path.
pub fn extract(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    debug!(
        "Extracting {} into {}",
        archive_path.display(),
        dest_dir.display()
    );

    let file = File::open(archive_path).map_err(|e| {
        Error::Extraction(format!("Cannot open archive {}: {}", archive_path.display(), e))
    })?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        Error::Extraction(format!("Cannot read archive {}: {}", archive_path.display(), e))
    })?;

    fs::create_dir_all(dest_dir)?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| {
            Error::Extraction(format!("Cannot read archive entry {}: {}", index, e))
        })?;

        // Mandatory containment check: the stored path, joined to the
        // destination, must not escape it.
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| Error::PathTraversal(entry.name().to_string()))?;
        let target = dest_dir.join(relative);
        trace!("Entry {} -> {}", entry.name(), target.display());

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            set_unix_mode(&target, entry.unix_mode())?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target).map_err(|e| {
                Error::Extraction(format!("Cannot create {}: {}", target.display(), e))
            })?;
            io::copy(&mut entry, &mut out).map_err(|e| {
                Error::Extraction(format!("Cannot write {}: {}", target.display(), e))
            })?;
            set_unix_mode(&target, entry.unix_mode())?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn set_unix_mode(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_unix_mode(_path: &Path, _mode: Option<u32>) -> Result<()> {
    Ok(())
}

/// Move the immediate children of `source_dir` up into its parent, then
/// remove the emptied `source_dir`.
///
/// Used when an archive wraps its payload in a single top-level folder. Name
/// collisions in the parent are resolved by the rename's replacement
/// semantics.
pub fn flatten_into(source_dir: &Path) -> Result<()> {
    let parent = source_dir
        .parent()
        .ok_or_else(|| Error::Extraction(format!("{} has no parent", source_dir.display())))?;

    debug!("Flattening {} into {}", source_dir.display(), parent.display());

    for child in fs::read_dir(source_dir)? {
        let child = child?;
        fs::rename(child.path(), parent.join(child.file_name()))?;
    }
    fs::remove_dir(source_dir)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, entries: &[(&str, Option<&[u8]>)]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        for (name, content) in entries {
            match content {
                Some(bytes) => {
                    writer.start_file(*name, FileOptions::default()).unwrap();
                    writer.write_all(bytes).unwrap();
                }
                None => {
                    writer.add_directory(*name, FileOptions::default()).unwrap();
                }
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extract_files_and_dirs() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("payload.zip");
        write_zip(
            &archive,
            &[
                ("app/", None),
                ("app/run.bin", Some(b"#!/bin/sh\n")),
                ("readme.txt", Some(b"hello")),
            ],
        );

        let dest = temp.path().join("out");
        extract(&archive, &dest).unwrap();

        assert!(dest.join("app/run.bin").is_file());
        assert_eq!(fs::read(dest.join("readme.txt")).unwrap(), b"hello");
    }

    #[test]
    fn test_extract_overwrites_existing_file() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("payload.zip");
        write_zip(&archive, &[("data.txt", Some(b"new"))]);

        let dest = temp.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("data.txt"), b"old").unwrap();

        extract(&archive, &dest).unwrap();
        assert_eq!(fs::read(dest.join("data.txt")).unwrap(), b"new");
    }

    #[test]
    fn test_extract_rejects_traversal_entry() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("evil.zip");
        write_zip(&archive, &[("../evil.txt", Some(b"pwned"))]);

        let dest = temp.path().join("out");
        let result = extract(&archive, &dest);

        assert!(matches!(result, Err(Error::PathTraversal(_))));
        assert!(!temp.path().join("evil.txt").exists());
    }

    #[test]
    fn test_flatten_into_moves_children_and_removes_wrapper() {
        let temp = tempfile::tempdir().unwrap();
        let wrapper = temp.path().join("payload");
        fs::create_dir_all(wrapper.join("app")).unwrap();
        fs::write(wrapper.join("app/run.bin"), b"x").unwrap();
        fs::write(wrapper.join("top.txt"), b"y").unwrap();

        flatten_into(&wrapper).unwrap();

        assert!(temp.path().join("app/run.bin").is_file());
        assert!(temp.path().join("top.txt").is_file());
        assert!(!wrapper.exists());
    }
}
