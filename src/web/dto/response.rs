//! Response DTOs for Web API.

use serde::Serialize;
use utoipa::ToSchema;

use crate::store::{format_bytes, Entry, StorageUsage};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Plain confirmation message.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A directory entry.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    /// Entry name.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_directory: bool,
    /// File size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    /// Guessed MIME type for files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl From<Entry> for EntryResponse {
    fn from(entry: Entry) -> Self {
        let is_directory = entry.is_directory();
        let mime_type = if is_directory {
            None
        } else {
            Some(
                mime_guess::from_path(&entry.name)
                    .first_or_octet_stream()
                    .to_string(),
            )
        };

        Self {
            is_directory,
            size: entry.size,
            modified: entry.modified.map(|t| t.to_rfc3339()),
            mime_type,
            name: entry.name,
        }
    }
}

/// One file accepted by an upload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Name sent by the client.
    pub original_name: String,
    /// Name the file was stored under after collision resolution.
    pub stored_name: String,
    /// Size in bytes.
    pub size: u64,
}

/// Upload result.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub files: Vec<UploadedFile>,
}

/// Storage usage against the quota.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageResponse {
    /// Used space, formatted (e.g. `1.50 GB`).
    pub used: String,
    /// Quota, formatted.
    pub total: String,
    /// Used share of the quota (e.g. `1.50%`); may exceed 100%.
    pub percentage: String,
    /// Used space in bytes.
    pub used_bytes: u64,
    /// Quota in bytes.
    pub total_bytes: u64,
    /// Whether uploads are rejected once the quota is reached.
    pub enforced: bool,
}

impl From<StorageUsage> for StorageResponse {
    fn from(usage: StorageUsage) -> Self {
        Self {
            used: format_bytes(usage.used_bytes),
            total: format_bytes(usage.quota_bytes),
            percentage: usage.percentage_display(),
            used_bytes: usage.used_bytes,
            total_bytes: usage.quota_bytes,
            enforced: usage.enforced,
        }
    }
}
