//! HTTP interface for homedrive.
//!
//! JSON API under `/api`, raw file serving under `/raw`, OpenAPI docs and
//! the optional static frontend.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
