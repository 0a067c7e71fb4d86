//! API handlers for the browser client.

pub mod file;
pub mod storage;

pub use file::*;
pub use storage::*;

use crate::config::Config;
use crate::store::FileStore;
use crate::web::error::ApiError;

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// File store all requests operate on.
    pub store: FileStore,
    /// Maximum size of a single uploaded file in bytes.
    pub max_upload_size: u64,
    /// Maximum number of files per upload request.
    pub max_files_per_upload: usize,
}

impl AppState {
    /// Create application state with the default upload limits.
    pub fn new(store: FileStore) -> Self {
        let defaults = Config::default();
        Self {
            store,
            max_upload_size: defaults.max_upload_size_bytes(),
            max_files_per_upload: defaults.storage.max_files_per_upload,
        }
    }

    /// Set upload limits.
    pub fn with_upload_limits(mut self, max_upload_size: u64, max_files_per_upload: usize) -> Self {
        self.max_upload_size = max_upload_size;
        self.max_files_per_upload = max_files_per_upload;
        self
    }
}

/// Run a blocking store operation on the blocking thread pool.
///
/// Each request gets its own worker so one slow disk call cannot stall the
/// async executor.
pub(crate) async fn run_blocking<T, F>(op: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| {
            tracing::error!("Storage worker failed: {}", e);
            ApiError::internal("Storage worker failed")
        })?
        .map_err(ApiError::from)
}
