//! Web server for homedrive.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::Config;
use crate::store::{FileStore, Quota};
use crate::{DriveError, Result};

use super::handlers::AppState;
use super::router::{
    create_health_router, create_router, create_static_router, create_swagger_router,
};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Configuration the server was built from.
    config: Config,
}

impl WebServer {
    /// Create a new web server.
    ///
    /// The storage root is created if missing.
    pub fn new(config: &Config) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| DriveError::Config(format!("invalid server address: {e}")))?;

        let quota = if config.storage.enforce_quota {
            Quota::enforced(config.storage.quota_bytes)
        } else {
            Quota::advisory(config.storage.quota_bytes)
        };
        let store = FileStore::new(&config.storage.root)?.with_quota(quota);
        tracing::info!("File store initialized at: {}", store.root().display());

        let app_state = AppState::new(store).with_upload_limits(
            config.max_upload_size_bytes(),
            config.storage.max_files_per_upload,
        );

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            config: config.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build the complete application router.
    pub fn router(&self) -> Router {
        // Downloads keep their byte ranges intact, so only the frontend and docs are compressed.
        let mut frontend = create_swagger_router();
        if self.config.server.serve_static {
            if let Some(static_router) = create_static_router(&self.config.server.static_path) {
                frontend = frontend.merge(static_router);
            }
        }

        create_router(self.app_state.clone(), &self.config)
            .merge(create_health_router())
            .merge(frontend.layer(CompressionLayer::new()))
    }

    /// Run the web server.
    pub async fn run(self) -> std::io::Result<()> {
        let router = self.router();

        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router).await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let router = self.router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config(root: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.server.serve_static = false;
        config.storage.root = root.join("files").to_string_lossy().into_owned();
        config
    }

    #[test]
    fn test_web_server_new_creates_root() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_test_config(temp_dir.path());

        let server = WebServer::new(&config).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
        assert!(temp_dir.path().join("files").is_dir());
    }

    #[test]
    fn test_web_server_invalid_host() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = create_test_config(temp_dir.path());
        config.server.host = "not a host".to_string();

        assert!(matches!(
            WebServer::new(&config),
            Err(DriveError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let temp_dir = TempDir::new().unwrap();
        let config = create_test_config(temp_dir.path());
        std::fs::create_dir_all(temp_dir.path().join("files")).unwrap();
        std::fs::write(temp_dir.path().join("files/hello.txt"), b"hi").unwrap();

        let server = WebServer::new(&config).unwrap();
        let addr = server.run_with_addr().await.unwrap();

        let client = reqwest::Client::new();
        let resp = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        assert_eq!(resp.text().await.unwrap(), "OK");

        let resp = client
            .get(format!("http://{}/raw/hello.txt", addr))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        assert_eq!(resp.text().await.unwrap(), "hi");

        let resp = client
            .get(format!("http://{}/api/list", addr))
            .send()
            .await
            .unwrap();
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["data"][0]["name"], "hello.txt");
    }
}
