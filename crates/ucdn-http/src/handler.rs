//! Handler trait for HTTP request processing.
//!
//! ```rust
//! use ucdn_http::{Handler, Request, Response, Result};
//! use async_trait::async_trait;
//!
//! struct MyHandler;
//!
//! #[async_trait]
//! impl Handler for MyHandler {
//!     async fn handle(&self, _request: Request) -> Result<Response> {
//!         Ok(Response::ok().with_body("Hello!"))
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::{Request, Response, Result};

/// Handler trait for processing requests.
///
/// All request handlers implement this trait, including the fallback a
/// static handler delegates to when an asset does not exist.
#[async_trait]
pub trait Handler: Send + Sync {
	/// Handles an HTTP request and produces a response.
	///
	/// # Errors
	///
	/// Returns an error if the request cannot be processed.
	async fn handle(&self, request: Request) -> Result<Response>;
}

/// Blanket implementation for `Arc<T>` where T: Handler.
///
/// This allows `Arc<dyn Handler>` to be used as a Handler,
/// enabling shared ownership of handlers across threads.
#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::StatusCode;
	use rstest::rstest;

	struct Teapot;

	#[async_trait]
	impl Handler for Teapot {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Ok(Response::new(StatusCode::IM_A_TEAPOT))
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_arc_dyn_handler_delegates() {
		let handler: Arc<dyn Handler> = Arc::new(Teapot);
		let request = Request::builder().uri("/").build().unwrap();
		let response = handler.handle(request).await.unwrap();
		assert_eq!(response.status, StatusCode::IM_A_TEAPOT);
	}
}
