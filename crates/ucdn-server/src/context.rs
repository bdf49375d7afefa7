//! Per-request context

use hyper::header::{ACCEPT_ENCODING, IF_NONE_MATCH};
use std::path::{Component, Path, PathBuf};
use ucdn_cache::Encoding;
use ucdn_cache::metadata::METADATA_DIR;
use ucdn_http::Request;

/// What the dispatcher knows about one request once it has been resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
	/// URL path without the query string
	pub path: String,
	/// Source asset the path maps to
	pub source: PathBuf,
	/// Negotiated variant encoding
	pub encoding: Encoding,
	/// `Accept-Encoding` as sent
	pub accept_encoding: Option<String>,
	/// `If-None-Match` as sent
	pub if_none_match: Option<String>,
}

impl RequestContext {
	/// Captures the request's path, `Accept-Encoding` and `If-None-Match`.
	///
	/// `If-Modified-Since` is not kept: revalidation is decided by the ETag
	/// alone.
	///
	/// The encoding starts as identity; the dispatcher fills it in once the
	/// source is known to exist.
	pub fn new(request: &Request, source: PathBuf) -> Self {
		let header = |name: &str| request.header(name).map(str::to_string);
		Self {
			path: request.path().to_string(),
			source,
			encoding: Encoding::Identity,
			accept_encoding: header(ACCEPT_ENCODING.as_str()),
			if_none_match: header(IF_NONE_MATCH.as_str()),
		}
	}
}

/// Maps a URL path below `root`.
///
/// Returns `None` for paths that could escape the root (any `..` segment or
/// a NUL byte) and for paths through the reserved metadata directory name,
/// which is never served.
///
/// # Examples
///
/// ```
/// use ucdn_server::context::resolve_under;
/// use std::path::{Path, PathBuf};
///
/// let root = Path::new("/srv/www");
/// assert_eq!(resolve_under(root, "/css/site.css"), Some(PathBuf::from("/srv/www/css/site.css")));
/// assert_eq!(resolve_under(root, "//css/site.css"), Some(PathBuf::from("/srv/www/css/site.css")));
/// assert_eq!(resolve_under(root, "/../etc/passwd"), None);
/// ```
pub fn resolve_under(root: &Path, url_path: &str) -> Option<PathBuf> {
	if url_path.contains('\0') {
		return None;
	}
	let relative = Path::new(url_path.trim_start_matches('/'));
	let safe = relative.components().all(|component| match component {
		Component::Normal(name) => name != METADATA_DIR,
		Component::CurDir => true,
		_ => false,
	});
	safe.then(|| root.join(relative))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("/a/../b.css")]
	#[case("/..")]
	#[case("/a\0.css")]
	#[case("/.ucdn-meta/app.css.json")]
	#[case("/js/.ucdn-meta/app.js.json")]
	fn test_rejects_escaping_paths(#[case] path: &str) {
		assert_eq!(resolve_under(Path::new("/srv"), path), None);
	}

	#[rstest]
	fn test_root_path_resolves_to_root() {
		assert_eq!(resolve_under(Path::new("/srv"), "/"), Some(PathBuf::from("/srv")));
	}

	#[rstest]
	fn test_context_captures_conditional_headers() {
		let request = Request::builder()
			.uri("/app.js?v=3")
			.header("Accept-Encoding", "gzip")
			.header("If-None-Match", "\"1-00\"")
			.header("If-Modified-Since", "Wed, 21 Oct 2015 07:28:00 GMT")
			.build()
			.unwrap();

		let ctx = RequestContext::new(&request, PathBuf::from("/srv/app.js"));
		assert_eq!(ctx.path, "/app.js");
		assert_eq!(ctx.accept_encoding.as_deref(), Some("gzip"));
		assert_eq!(ctx.if_none_match.as_deref(), Some("\"1-00\""));
		assert_eq!(ctx.encoding, Encoding::Identity);
	}
}
