//! Test fixtures for ucdn-server
//!
//! A [`Site`] is a temporary source root with a few assets, a separate
//! destination root, and a handler serving one from the other.

#![allow(dead_code)]

use hyper::StatusCode;
use rstest::fixture;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use std::time::Duration;
use tempfile::TempDir;
use ucdn_http::{Handler, Request, Response};
use ucdn_server::{UcdnConfig, UcdnHandler};

static INIT: Once = Once::new();

/// Initialize logging for tests (call once)
pub fn init_test_logging() {
	INIT.call_once(|| {
		let _ = env_logger::builder().is_test(true).try_init();
	});
}

pub const CSS: &str = "body { color: red; }\n";
pub const JS: &str = "console.log('test');\n";
pub const ICON: &[u8] = &[0, 0, 1, 0, 1, 0, 16, 16, 0, 0, 1, 0, 32, 0];

/// A source/destination pair and a handler serving it
pub struct Site {
	dir: TempDir,
	pub handler: UcdnHandler,
}

impl Site {
	/// Builds a site with a custom configuration step
	pub fn with_config(configure: impl FnOnce(UcdnConfig) -> UcdnConfig) -> Self {
		init_test_logging();
		let dir = TempDir::new().unwrap();
		let source = dir.path().join("static");
		fs::create_dir_all(source.join("js")).unwrap();
		fs::create_dir_all(source.join("img")).unwrap();

		fs::write(source.join("app.css"), CSS.repeat(100)).unwrap();
		fs::write(source.join("js/app.js"), JS.repeat(100)).unwrap();
		fs::write(source.join("img/logo.png"), [0x89, b'P', b'N', b'G', 0, 1, 2, 3]).unwrap();
		fs::write(source.join("favicon.ico"), ICON).unwrap();

		let config = UcdnConfig::new(&source)
			.with_dest(dir.path().join("cache"))
			.with_cache_timeout(Duration::from_secs(5));
		let handler = UcdnHandler::new(configure(config));
		Self { dir, handler }
	}

	pub fn source(&self) -> PathBuf {
		self.dir.path().join("static")
	}

	pub fn dest(&self) -> PathBuf {
		self.dir.path().join("cache")
	}

	pub fn root(&self) -> &Path {
		self.dir.path()
	}

	/// Issues a GET with the given headers
	pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> Response {
		let mut builder = Request::builder().uri(uri);
		for (name, value) in headers {
			builder = builder.header(*name, *value);
		}
		self.handler.handle(builder.build().unwrap()).await.unwrap()
	}

	pub async fn builds(&self) -> u64 {
		self.handler.store().statistics().await.builds
	}
}

#[fixture]
pub fn site() -> Site {
	Site::with_config(|config| config)
}

/// Reads a response body, asserting a status first
pub async fn body_of(response: Response, status: StatusCode) -> Vec<u8> {
	assert_eq!(response.status, status);
	response.body.collect().await.unwrap().to_vec()
}

pub fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
	response.headers.get(name).and_then(|v| v.to_str().ok())
}

/// Fallback that answers 418 so delegation is observable
pub struct Teapot;

#[async_trait::async_trait]
impl Handler for Teapot {
	async fn handle(&self, _request: Request) -> ucdn_http::Result<Response> {
		Ok(Response::new(StatusCode::IM_A_TEAPOT))
	}
}

pub fn teapot() -> Arc<dyn Handler> {
	Arc::new(Teapot)
}

pub fn gunzip(data: &[u8]) -> Vec<u8> {
	use std::io::Read;
	let mut out = Vec::new();
	flate2::read::GzDecoder::new(data)
		.read_to_end(&mut out)
		.unwrap();
	out
}
