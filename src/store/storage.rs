//! On-disk file store.
//!
//! Every operation resolves its target beneath a single root directory:
//! ```text
//! {root}/
//! ├── notes.txt
//! ├── notes(1).txt
//! └── photos/
//!     └── 2024/
//!         └── beach.jpg
//! ```
//! The store keeps no in-memory state between calls; sizes and timestamps
//! are read from the filesystem on demand.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::archive;
use super::path::{validate_name, RelPath};
use super::quota::{Quota, StorageUsage};
use crate::{DriveError, Result};

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A direct child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Entry name.
    pub name: String,
    /// File or directory.
    pub kind: EntryKind,
    /// File length in bytes (0 for directories).
    pub size: u64,
    /// Last modification time, when the platform reports one.
    pub modified: Option<DateTime<Utc>>,
}

impl Entry {
    /// Whether this entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// What a download request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    /// A regular file, served as-is.
    File(PathBuf),
    /// A directory, served as a zip archive.
    Directory(PathBuf),
}

/// A newly created, empty file claimed under a collision-free name.
#[derive(Debug)]
pub struct ClaimedFile {
    /// Open handle, positioned at the start.
    pub file: File,
    /// Absolute path of the claimed file.
    pub path: PathBuf,
    /// Name the file was created under.
    pub name: String,
}

/// File store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Canonical root directory.
    root: PathBuf,
    quota: Quota,
}

impl FileStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let root = root.canonicalize()?;

        Ok(Self {
            root,
            quota: Quota::default(),
        })
    }

    /// Replace the quota settings.
    pub fn with_quota(mut self, quota: Quota) -> Self {
        self.quota = quota;
        self
    }

    /// Canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current quota settings.
    pub fn quota(&self) -> Quota {
        self.quota
    }

    /// List the direct children of a directory. Order is unspecified.
    pub fn list(&self, rel: &RelPath) -> Result<Vec<Entry>> {
        let dir = self.resolve_dir(rel)?;
        let mut entries = Vec::new();

        for dir_entry in fs::read_dir(&dir)? {
            let dir_entry = dir_entry?;
            // Names that are not UTF-8 cannot be addressed through the API.
            let name = match dir_entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    tracing::warn!(path = %rel, name = ?raw, "Skipping entry with non UTF-8 name");
                    continue;
                }
            };
            // Follow symlinks for the kind; a dangling link still lists as a file.
            let metadata = match fs::metadata(dir_entry.path()) {
                Ok(metadata) => metadata,
                Err(_) => dir_entry.metadata()?,
            };
            let kind = if metadata.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };

            entries.push(Entry {
                name,
                kind,
                size: if kind == EntryKind::File {
                    metadata.len()
                } else {
                    0
                },
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        Ok(entries)
    }

    /// Pick a name in `rel_dir` that no existing entry uses.
    ///
    /// Returns `proposed` unchanged when it is free, otherwise the first free
    /// `base(n)ext`. This is a probe only; [`FileStore::store`] claims names
    /// atomically.
    pub fn unique_name(&self, rel_dir: &RelPath, proposed: &str) -> Result<String> {
        let proposed = validate_name(proposed)?;
        let dir = self.resolve_dir(rel_dir)?;
        Ok(unique_name_in(&dir, proposed))
    }

    /// Create an empty file in `rel_dir` under a collision-free name.
    ///
    /// Candidates are claimed with an exclusive create, so concurrent writers
    /// with the same desired name always end up in distinct files.
    pub fn create_unique(&self, rel_dir: &RelPath, file_name: &str) -> Result<ClaimedFile> {
        let file_name = validate_name(file_name)?;
        let dir = self.resolve_dir(rel_dir)?;

        let (file, name) = claim_unique(&dir, file_name)?;
        Ok(ClaimedFile {
            file,
            path: dir.join(&name),
            name,
        })
    }

    /// Write `content` into `rel_dir` under a collision-free name.
    ///
    /// Returns the name actually used. A partially written file is removed
    /// when reading `content` fails.
    pub fn store<R: Read>(
        &self,
        rel_dir: &RelPath,
        file_name: &str,
        mut content: R,
    ) -> Result<String> {
        let ClaimedFile {
            mut file,
            path,
            name,
        } = self.create_unique(rel_dir, file_name)?;

        if let Err(e) = io::copy(&mut content, &mut file) {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }

        Ok(name)
    }

    /// Fail with `QuotaExceeded` if the quota is enforced and `incoming`
    /// more bytes would not fit.
    pub fn ensure_capacity(&self, incoming: u64) -> Result<()> {
        if !self.quota.enforce {
            return Ok(());
        }

        let used = self.size_of(&RelPath::root())?;
        if used.saturating_add(incoming) > self.quota.limit_bytes {
            return Err(DriveError::QuotaExceeded {
                used,
                incoming,
                quota: self.quota.limit_bytes,
            });
        }
        Ok(())
    }

    /// Fail with `QuotaExceeded` if the quota is enforced and usage, which
    /// already includes `written` freshly stored bytes, is above the limit.
    pub fn ensure_within_quota(&self, written: u64) -> Result<()> {
        if !self.quota.enforce {
            return Ok(());
        }

        let used = self.size_of(&RelPath::root())?;
        if used > self.quota.limit_bytes {
            return Err(DriveError::QuotaExceeded {
                used: used.saturating_sub(written),
                incoming: written,
                quota: self.quota.limit_bytes,
            });
        }
        Ok(())
    }

    /// Create a single directory `name` inside `rel`.
    pub fn make_directory(&self, rel: &RelPath, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        let dir = self.resolve_dir(rel)?;

        match fs::create_dir(dir.join(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(DriveError::AlreadyExists(describe(rel, name)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Rename a file or directory within `rel`.
    ///
    /// An existing target is never overwritten; the rename fails with
    /// `OperationFailed` instead.
    pub fn rename(&self, rel: &RelPath, old_name: &str, new_name: &str) -> Result<()> {
        let old_name = validate_name(old_name)?;
        let new_name = validate_name(new_name)?;
        let dir = self.resolve_dir(rel)?;

        let from = dir.join(old_name);
        let to = dir.join(new_name);

        if !exists_no_follow(&from) {
            return Err(DriveError::NotFound(describe(rel, old_name)));
        }
        if old_name == new_name {
            return Ok(());
        }
        if exists_no_follow(&to) {
            return Err(DriveError::OperationFailed(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", describe(rel, new_name)),
            )));
        }

        fs::rename(&from, &to)?;
        Ok(())
    }

    /// Delete a single file. Directories are not removed.
    pub fn delete(&self, rel: &RelPath, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        let dir = self.resolve_dir(rel)?;

        match fs::remove_file(dir.join(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DriveError::NotFound(describe(rel, name)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Recursive size in bytes. Symlinks below the target are not followed.
    pub fn size_of(&self, rel: &RelPath) -> Result<u64> {
        let path = self.resolve_existing(rel)?;
        let metadata = fs::metadata(&path)?;

        if metadata.is_dir() {
            Ok(dir_size(&path)?)
        } else {
            Ok(metadata.len())
        }
    }

    /// Usage of the whole root against the quota.
    pub fn usage(&self) -> Result<StorageUsage> {
        Ok(StorageUsage {
            used_bytes: self.size_of(&RelPath::root())?,
            quota_bytes: self.quota.limit_bytes,
            enforced: self.quota.enforce,
        })
    }

    /// Resolve `name` inside `rel_dir` for download.
    pub fn download_target(&self, rel_dir: &RelPath, name: &str) -> Result<DownloadTarget> {
        let rel = rel_dir.join(name)?;
        let path = self.resolve_existing(&rel)?;

        if path.is_dir() {
            Ok(DownloadTarget::Directory(path))
        } else {
            Ok(DownloadTarget::File(path))
        }
    }

    /// Resolve `rel` to a regular file inside the root.
    ///
    /// Directories are reported as `NotFound`.
    pub fn file_path(&self, rel: &RelPath) -> Result<PathBuf> {
        let path = self.resolve_existing(rel)?;
        if !path.is_file() {
            return Err(DriveError::NotFound(describe_rel(rel)));
        }
        Ok(path)
    }

    /// Write a zip archive of the directory at `rel` into `writer`.
    pub fn archive<W: Write + Seek>(&self, rel: &RelPath, writer: W) -> Result<W> {
        let dir = self.resolve_dir(rel)?;
        archive::write_zip(&dir, writer)
    }

    /// Resolve an existing path, refusing anything that lands outside the root
    /// (for example through a symlink).
    fn resolve_existing(&self, rel: &RelPath) -> Result<PathBuf> {
        let canonical = match rel.to_path(&self.root).canonicalize() {
            Ok(path) => path,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DriveError::NotFound(describe_rel(rel)));
            }
            Err(e) => return Err(e.into()),
        };

        if !canonical.starts_with(&self.root) {
            return Err(DriveError::InvalidPath(format!(
                "{} resolves outside the storage root",
                describe_rel(rel)
            )));
        }
        Ok(canonical)
    }

    fn resolve_dir(&self, rel: &RelPath) -> Result<PathBuf> {
        let path = self.resolve_existing(rel)?;
        if !path.is_dir() {
            return Err(DriveError::InvalidPath(format!(
                "{} is not a directory",
                describe_rel(rel)
            )));
        }
        Ok(path)
    }
}

fn describe_rel(rel: &RelPath) -> String {
    if rel.is_root() {
        "/".to_string()
    } else {
        rel.to_string()
    }
}

fn describe(rel: &RelPath, name: &str) -> String {
    if rel.is_root() {
        name.to_string()
    } else {
        format!("{rel}/{name}")
    }
}

fn exists_no_follow(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Split `name` into base and extension the way a browser would expect:
/// `.hidden` has no extension and `a.tar.gz` splits into `a.tar` + `.gz`.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Candidate number `attempt` for `proposed`; attempt 0 is the name itself.
fn candidate_name(proposed: &str, attempt: u64) -> String {
    if attempt == 0 {
        return proposed.to_string();
    }
    let (base, ext) = split_extension(proposed);
    format!("{base}({attempt}){ext}")
}

fn unique_name_in(dir: &Path, proposed: &str) -> String {
    let mut attempt = 0;
    let mut candidate = candidate_name(proposed, attempt);
    while exists_no_follow(&dir.join(&candidate)) {
        attempt += 1;
        candidate = candidate_name(proposed, attempt);
    }
    candidate
}

fn claim_unique(dir: &Path, proposed: &str) -> io::Result<(File, String)> {
    let mut attempt = 0;
    loop {
        let candidate = candidate_name(proposed, attempt);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dir.join(&candidate))
        {
            Ok(file) => return Ok((file, candidate)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

fn dir_size(dir: &Path) -> io::Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            total += dir_size(&entry.path())?;
        } else if file_type.is_file() {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}
