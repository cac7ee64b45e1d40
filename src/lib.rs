// src/lib.rs

//! pakr Package Manager
//!
//! A small per-user package manager: packages are described by a remote JSON
//! catalog, downloaded into `~/.pakr/programs/<name>/`, materialized according
//! to their install kind (raw executable, platform installer, or zip archive),
//! and tracked in a pretty-printed `installed.json` registry.
//!
//! # Architecture
//!
//! - Registry-first: `installed.json` is the sole authority for install state
//! - Closed install-kind dispatch: `exe` / `setup` / `zip`, unknown tags error
//! - Streaming downloads with incremental progress observation
//! - Zip extraction rejects entries that escape the destination directory

pub mod catalog;
mod error;
pub mod installer;
pub mod layout;
pub mod ops;
pub mod registry;

pub use error::{Error, Result};
