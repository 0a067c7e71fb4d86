//! homedrive - a personal cloud drive.
//!
//! A single directory tree served over HTTP: browse, upload, download
//! (directories as zip), rename, delete and report usage against a quota.

pub mod config;
pub mod error;
pub mod logging;
pub mod store;
pub mod web;

pub use config::Config;
pub use error::{DriveError, Result};
pub use store::{
    format_bytes, validate_name, DownloadTarget, Entry, EntryKind, FileStore, Quota, RelPath,
    StorageUsage,
};
