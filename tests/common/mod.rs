//! Shared helpers for integration tests.

#![allow(dead_code)]

use axum_test::TestServer;
use homedrive::config::Config;
use homedrive::store::{FileStore, Quota};
use homedrive::web::handlers::AppState;
use homedrive::web::router::create_router;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// A test server over a fresh storage root.
pub struct TestDrive {
    pub server: TestServer,
    pub dir: TempDir,
}

impl TestDrive {
    /// Storage root on disk.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// Create a test server with default limits and an advisory quota.
pub fn create_test_drive() -> TestDrive {
    create_test_drive_with(Quota::default(), 1024 * 1024, 10)
}

/// Create a test server with explicit quota and upload limits.
pub fn create_test_drive_with(
    quota: Quota,
    max_upload_size: u64,
    max_files_per_upload: usize,
) -> TestDrive {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = FileStore::new(dir.path())
        .expect("Failed to create store")
        .with_quota(quota);

    let app_state = Arc::new(
        AppState::new(store).with_upload_limits(max_upload_size, max_files_per_upload),
    );
    let router = create_router(app_state, &Config::default());
    let server = TestServer::new(router).expect("Failed to create test server");

    TestDrive { server, dir }
}
