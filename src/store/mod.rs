//! File store for homedrive.
//!
//! Path-safe CRUD over a directory tree rooted at a single directory:
//! - Relative path parsing that never escapes the root
//! - Collision-free naming for uploads
//! - Recursive size accounting against a quota
//! - Streaming zip archives for directory downloads

pub mod archive;
mod path;
mod quota;
mod storage;

pub use path::{validate_name, RelPath};
pub use quota::{format_bytes, Quota, StorageUsage};
pub use storage::{ClaimedFile, DownloadTarget, Entry, EntryKind, FileStore};

/// Default quota (100 GiB).
pub const DEFAULT_QUOTA_BYTES: u64 = 100 * 1024 * 1024 * 1024;
