//! Concurrency tests for homedrive.
//!
//! These tests verify that concurrent writers asking for the same file name
//! always land in distinct files.

mod common;

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use futures::future::join_all;
use homedrive::store::{FileStore, RelPath};
use serde_json::Value;
use tempfile::TempDir;

/// Number of concurrent writers.
const NUM_WRITERS: usize = 16;

/// Test concurrent stores of the same name on blocking threads.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_store_same_name() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FileStore::new(temp_dir.path()).unwrap());

    let mut handles = Vec::new();
    for i in 0..NUM_WRITERS {
        let store = Arc::clone(&store);
        handles.push(tokio::task::spawn_blocking(move || {
            let content = format!("writer {i}");
            let name = store
                .store(&RelPath::root(), "report.txt", content.as_bytes())
                .unwrap();
            (name, content)
        }));
    }

    let mut names = HashSet::new();
    for handle in handles {
        let (name, content) = handle.await.unwrap();
        // Each writer's bytes are intact under the name it was given.
        assert_eq!(
            fs::read_to_string(temp_dir.path().join(&name)).unwrap(),
            content
        );
        assert!(names.insert(name), "two writers got the same name");
    }

    assert_eq!(names.len(), NUM_WRITERS);
    assert!(names.contains("report.txt"));
    for i in 1..NUM_WRITERS {
        assert!(names.contains(&format!("report({i}).txt")));
    }
}

/// Test concurrent uploads of the same name through the HTTP API.
///
/// All requests are in flight together; each one stores on its own blocking
/// worker.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_uploads_same_name() {
    let drive = common::create_test_drive();

    let requests = (0..NUM_WRITERS).map(|i| {
        let part = Part::bytes(format!("upload {i}").into_bytes()).file_name("photo.jpg");
        let form = MultipartForm::new().add_part("files", part);
        drive.server.post("/api/upload").multipart(form)
    });
    let responses = join_all(requests.map(|request| async move { request.await })).await;

    let mut names = HashSet::new();
    let mut contents = HashSet::new();
    for response in responses {
        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        let name = body["data"]["files"][0]["storedName"]
            .as_str()
            .unwrap()
            .to_string();
        contents.insert(fs::read_to_string(drive.root().join(&name)).unwrap());
        names.insert(name);
    }

    assert_eq!(names.len(), NUM_WRITERS);
    assert_eq!(contents.len(), NUM_WRITERS);
    assert_eq!(fs::read_dir(drive.root()).unwrap().count(), NUM_WRITERS);
}
