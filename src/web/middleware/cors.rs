//! CORS middleware configuration.

use axum::http::header::{ACCEPT, CONTENT_TYPE, RANGE};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

const METHODS: [Method; 4] = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

fn permissive() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(METHODS)
        .allow_headers(Any)
        .allow_origin(Any)
}

/// Create a CORS layer from configuration.
///
/// An empty origin list (or one with no parseable entries) allows any origin.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    if parsed_origins.is_empty() {
        return permissive();
    }

    CorsLayer::new()
        .allow_methods(METHODS)
        .allow_headers([CONTENT_TYPE, ACCEPT, RANGE])
        .allow_origin(parsed_origins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    fn app(origins: &[String]) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(create_cors_layer(origins))
    }

    #[tokio::test]
    async fn test_any_origin_when_unconfigured() {
        let response = app(&[])
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("origin", "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_configured_origin_is_echoed() {
        let origins = vec!["http://localhost:5173".to_string()];
        let response = app(&origins)
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("origin", "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:5173"
        );
    }

    #[test]
    fn test_invalid_origins_fall_back() {
        let origins = vec!["bad\norigin".to_string()];
        let _layer = create_cors_layer(&origins);
    }
}
