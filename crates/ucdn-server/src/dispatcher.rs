//! Request dispatcher
//!
//! [`UcdnHandler`] runs the per-request pipeline:
//!
//! 1. Map the URL path below the source root and stat the source. A missing
//!    source goes to the fallback handler, or becomes an empty 404.
//! 2. `/favicon.ico` is streamed straight from the source.
//! 3. Otherwise negotiate the encoding, read the variant's metadata and
//!    classify it against the live source. Fresh variants are served (304
//!    when `If-None-Match` matches); stale or missing ones are built through
//!    the [`BuildCoordinator`] and served as a full 200.
//!
//! Any cache failure after the stat is answered with an empty 500.

use async_trait::async_trait;
use hyper::Method;
use hyper::header::ALLOW;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use ucdn_cache::compression::extension_of;
use ucdn_cache::{
	BuildCoordinator, BuildOptions, BuildRequest, CacheError, SourceStat, VariantMetadata,
	VariantStore,
};
use ucdn_http::{Body, Handler, Request, Response, Result};

use crate::config::UcdnConfig;
use crate::context::{RequestContext, resolve_under};
use crate::freshness::{classify, is_not_modified};
use crate::negotiate::negotiate;

/// Path served straight from the source, bypassing variants
pub const FAVICON_PATH: &str = "/favicon.ico";

const FAVICON_CONTENT_TYPE: &str = "image/vnd.microsoft.icon";

/// Static asset handler with on-demand compressed variants.
///
/// Cloning is cheap and clones share the variant store and the build
/// coordinator, so the lock table is scoped to the handler, not the process.
#[derive(Clone)]
pub struct UcdnHandler {
	source: PathBuf,
	dest: PathBuf,
	headers: Vec<(String, String)>,
	options: BuildOptions,
	compressible: BTreeSet<String>,
	cache_timeout: Duration,
	coordinator: BuildCoordinator,
	fallback: Option<Arc<dyn Handler>>,
}

impl UcdnHandler {
	/// Creates a handler from a configuration.
	///
	/// Relative roots are resolved against the current directory once, here.
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_server::{UcdnConfig, UcdnHandler};
	///
	/// let handler = UcdnHandler::new(UcdnConfig::new("/srv/www").with_dest("/tmp/ucdn-doc"));
	/// assert_eq!(handler.source_root(), std::path::Path::new("/srv/www"));
	/// ```
	pub fn new(config: UcdnConfig) -> Self {
		let source = absolute(config.source.clone());
		let dest = absolute(config.dest_root());
		let store = VariantStore::new(config.cache_timeout);
		let coordinator = BuildCoordinator::new(store, config.cache_timeout);

		Self {
			source,
			dest,
			headers: config
				.headers
				.iter()
				.map(|(k, v)| (k.clone(), v.clone()))
				.collect(),
			options: BuildOptions {
				headers: config.headers,
				vary: false,
			},
			compressible: config.compressible,
			cache_timeout: config.cache_timeout,
			coordinator,
			fallback: None,
		}
	}

	/// Delegates requests for missing sources to `fallback` instead of
	/// answering 404
	pub fn with_fallback(mut self, fallback: Arc<dyn Handler>) -> Self {
		self.fallback = Some(fallback);
		self
	}

	/// Resolved source root
	pub fn source_root(&self) -> &std::path::Path {
		&self.source
	}

	/// Resolved destination root
	pub fn dest_root(&self) -> &std::path::Path {
		&self.dest
	}

	/// The variant store (statistics, cleanup)
	pub fn store(&self) -> &VariantStore {
		self.coordinator.store()
	}

	/// The build coordinator shared by clones of this handler
	pub fn coordinator(&self) -> &BuildCoordinator {
		&self.coordinator
	}

	async fn not_found(&self, request: Request) -> Result<Response> {
		match &self.fallback {
			Some(fallback) => fallback.handle(request).await,
			None => Ok(Response::not_found()),
		}
	}

	async fn serve_favicon(&self, ctx: &RequestContext, stat: &SourceStat) -> Response {
		match File::open(&ctx.source).await {
			Ok(file) => Response::ok()
				.with_header("Content-Length", &stat.size.to_string())
				.with_header("Content-Type", FAVICON_CONTENT_TYPE)
				.with_headers(self.headers.iter())
				.with_body(Body::file(file, stat.size)),
			Err(e) => {
				log::warn!("Failed to open {}: {}", ctx.source.display(), e);
				Response::internal_server_error()
			}
		}
	}

	async fn serve_variant(&self, ctx: &RequestContext, stat: &SourceStat) -> Response {
		let uncompressed = self.dest.join(ctx.path.trim_start_matches('/'));
		let options = BuildOptions {
			vary: self.compressible.contains(&extension_of(&ctx.path)),
			..self.options.clone()
		};
		let build = BuildRequest::new(&ctx.source, uncompressed, ctx.encoding, options);

		let cached = match self
			.store()
			.read_metadata(&build.target, self.cache_timeout)
			.await
		{
			Ok(meta) => Some(meta),
			Err(CacheError::NotFound(_)) => None,
			Err(e) => {
				log::debug!("Unusable metadata for {}: {}", build.target.display(), e);
				None
			}
		};

		let freshness = classify(stat, cached.as_ref());
		if freshness.needs_build() {
			log::debug!("{:?} variant {}", freshness, build.target.display());
		} else if let Some(meta) = cached {
			if is_not_modified(&meta, ctx.if_none_match.as_deref()) {
				log::debug!("Not modified: {}", ctx.path);
				return Response::not_modified().with_headers(meta.headers().iter());
			}
			// a variant swapped by a concurrent rebuild, or deleted from disk,
			// falls through to the coordinator, which reuses or rebuilds it
			if let Some(file) = open_variant(&build.target, &meta).await {
				return ok_response(&meta, file);
			}
		}

		let target = build.target.clone();
		match self.coordinator.ensure(build).await {
			Ok(meta) => match open_variant(&target, &meta).await {
				Some(file) => ok_response(&meta, file),
				None => {
					log::warn!("Variant {} changed while being served", target.display());
					Response::internal_server_error()
				}
			},
			Err(e) => {
				log::warn!("Failed to build {}: {}", target.display(), e);
				Response::internal_server_error()
			}
		}
	}
}

#[async_trait]
impl Handler for UcdnHandler {
	async fn handle(&self, request: Request) -> Result<Response> {
		if request.method != Method::GET && request.method != Method::HEAD {
			return Ok(Response::method_not_allowed().with_header(ALLOW.as_str(), "GET, HEAD"));
		}

		let Some(source) = resolve_under(&self.source, request.path()) else {
			log::debug!("Rejected path {}", request.path());
			return self.not_found(request).await;
		};
		let mut ctx = RequestContext::new(&request, source);

		let stat = match self.store().stat(&ctx.source, self.cache_timeout).await {
			Ok(stat) => stat,
			Err(e) => {
				if !e.is_not_found() {
					log::debug!("Stat of {} failed: {}", ctx.source.display(), e);
				}
				return self.not_found(request).await;
			}
		};

		let response = if ctx.path == FAVICON_PATH {
			self.serve_favicon(&ctx, &stat).await
		} else {
			ctx.encoding = negotiate(
				&ctx.path,
				&self.compressible,
				ctx.accept_encoding.as_deref(),
			);
			self.serve_variant(&ctx, &stat).await
		};

		if request.is_head() {
			Ok(response.without_body())
		} else {
			Ok(response)
		}
	}
}

impl std::fmt::Debug for UcdnHandler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("UcdnHandler")
			.field("source", &self.source)
			.field("dest", &self.dest)
			.field("cache_timeout", &self.cache_timeout)
			.field("fallback", &self.fallback.is_some())
			.finish_non_exhaustive()
	}
}

fn absolute(path: PathBuf) -> PathBuf {
	std::path::absolute(&path).unwrap_or(path)
}

/// Opens a variant, checking its size against the record it is served with
async fn open_variant(target: &std::path::Path, meta: &VariantMetadata) -> Option<File> {
	let file = File::open(target).await.ok()?;
	let len = file.metadata().await.ok()?.len();
	(len == meta.content_length).then_some(file)
}

fn ok_response(meta: &VariantMetadata, file: File) -> Response {
	Response::ok()
		.with_headers(meta.headers().iter())
		.with_body(Body::file(file, meta.content_length))
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::StatusCode;
	use rstest::rstest;
	use tempfile::TempDir;

	fn handler(dir: &TempDir) -> UcdnHandler {
		let source = dir.path().join("src");
		std::fs::create_dir_all(&source).unwrap();
		UcdnHandler::new(UcdnConfig::new(&source).with_dest(dir.path().join("dest")))
	}

	#[rstest]
	#[tokio::test]
	async fn test_post_is_not_allowed() {
		let dir = TempDir::new().unwrap();
		let request = Request::builder()
			.method(Method::POST)
			.uri("/a.css")
			.build()
			.unwrap();

		let response = handler(&dir).handle(request).await.unwrap();
		assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
		assert_eq!(response.headers.get(ALLOW).unwrap(), "GET, HEAD");
	}

	#[rstest]
	#[tokio::test]
	async fn test_traversal_is_not_found() {
		let dir = TempDir::new().unwrap();
		std::fs::write(dir.path().join("secret.txt"), "x").unwrap();
		let request = Request::builder().uri("/../secret.txt").build().unwrap();

		let response = handler(&dir).handle(request).await.unwrap();
		assert_eq!(response.status, StatusCode::NOT_FOUND);
	}

	#[rstest]
	#[tokio::test]
	async fn test_directory_is_not_found() {
		let dir = TempDir::new().unwrap();
		let h = handler(&dir);
		std::fs::create_dir_all(dir.path().join("src/css")).unwrap();
		let request = Request::builder().uri("/css").build().unwrap();

		let response = h.handle(request).await.unwrap();
		assert_eq!(response.status, StatusCode::NOT_FOUND);
		assert!(response.body.is_empty());
	}
}
