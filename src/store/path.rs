//! Relative path parsing and entry name validation.
//!
//! Everything here is pure string work; nothing touches the filesystem, so a
//! rejected path can never have side effects.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::{DriveError, Result};

/// A validated path relative to the storage root.
///
/// The empty path is the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelPath {
    segments: Vec<String>,
}

impl RelPath {
    /// The storage root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a `/`-separated relative path such as `photos/2024`.
    ///
    /// Empty and `.` segments are skipped, so `""`, `"/"` and `"./"` all
    /// name the root. Any `..` segment is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut segments = Vec::new();

        for segment in raw.split('/') {
            if segment.is_empty() || segment == "." {
                continue;
            }
            if segment == ".." {
                return Err(DriveError::InvalidPath(format!(
                    "parent directory segment in {raw:?}"
                )));
            }
            if !is_plain_segment(segment) {
                return Err(DriveError::InvalidPath(format!(
                    "malformed segment {segment:?}"
                )));
            }
            segments.push(segment.to_string());
        }

        Ok(Self { segments })
    }

    /// Path segments from the root down.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this path names the root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a single validated entry name.
    pub fn join(&self, name: &str) -> Result<Self> {
        let name = validate_name(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(Self { segments })
    }

    /// Last segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Join onto `root` without consulting the filesystem.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.segments);
        path
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// A segment must be exactly one normal path component on this platform.
fn is_plain_segment(segment: &str) -> bool {
    if segment.contains(['\\', '\0']) {
        return false;
    }
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Validate a single entry name (file or directory).
///
/// Rejects empty names, anything containing `..`, path separators and NUL.
pub fn validate_name(name: &str) -> Result<&str> {
    if name.is_empty() || name == "." {
        return Err(DriveError::InvalidPath("empty name".to_string()));
    }
    if name.contains("..") {
        return Err(DriveError::InvalidPath(format!(
            "name must not contain '..': {name:?}"
        )));
    }
    if name.contains('/') || !is_plain_segment(name) {
        return Err(DriveError::InvalidPath(format!(
            "name must be a single path segment: {name:?}"
        )));
    }
    Ok(name)
}
