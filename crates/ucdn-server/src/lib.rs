//! # ucdn server
//!
//! The request-serving side of ucdn: a [`Handler`](ucdn_http::Handler) that
//! maps URL paths onto a source directory and answers with compressed
//! variants built on first request, plus a small hyper server to run it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ucdn_server::{HttpServer, UcdnConfig, UcdnHandler};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = UcdnConfig::new("public").with_header("Cache-Control", "max-age=300");
//!     let handler = UcdnHandler::new(config);
//!
//!     HttpServer::new(Arc::new(handler))
//!         .listen("127.0.0.1:8080".parse().unwrap())
//!         .await
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`dispatcher`] - The [`UcdnHandler`] request pipeline
//! - [`negotiate`] - `Accept-Encoding` negotiation
//! - [`freshness`] - Metadata freshness and `If-None-Match` evaluation
//! - [`context`] - Per-request context and path resolution
//! - [`config`] - [`UcdnConfig`] and its TOML loader
//! - [`server`] - [`HttpServer`]

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod freshness;
pub mod negotiate;
pub mod server;

pub use config::{ConfigError, UcdnConfig};
pub use context::RequestContext;
pub use dispatcher::UcdnHandler;
pub use freshness::Freshness;
pub use server::{HttpServer, shutdown_signal};
