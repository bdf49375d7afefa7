//! # ucdn
//!
//! A static asset handler that compresses variants on demand.
//!
//! Requests are mapped onto a source directory. For compressible assets the
//! best encoding the client accepts (brotli, then gzip, then deflate) is
//! built on first request, persisted next to a metadata record in a
//! destination directory, and served from there until the source's
//! modification time changes. Conditional requests with a matching
//! `If-None-Match` are answered with 304. Concurrent first requests for the
//! same asset share a single build.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ucdn::{HttpServer, UcdnConfig, UcdnHandler};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let handler = UcdnHandler::new(UcdnConfig::new("public").with_dest("/var/cache/ucdn"));
//!     HttpServer::new(Arc::new(handler))
//!         .listen("0.0.0.0:8080".parse().unwrap())
//!         .await
//! }
//! ```
//!
//! The handler can also sit behind another server: it implements
//! [`Handler`], and [`UcdnHandler::with_fallback`] hands requests for missing
//! assets to the next handler instead of answering 404.
//!
//! ## Crates
//!
//! - [`http`] (`ucdn-http`) - Request, response and handler types
//! - [`cache`] (`ucdn-cache`) - Variant store, metadata and build coordination
//! - [`server`] (`ucdn-server`) - Dispatcher, configuration and HTTP server

pub use ucdn_cache as cache;
pub use ucdn_http as http;
pub use ucdn_server as server;

pub use ucdn_cache::{BuildCoordinator, CacheError, Encoding, VariantMetadata, VariantStore};
pub use ucdn_http::{Body, Handler, Request, Response};
pub use ucdn_server::{ConfigError, HttpServer, UcdnConfig, UcdnHandler};
