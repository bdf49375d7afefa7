//! Inbound request representation.

use bytes::Bytes;
use hyper::{HeaderMap, Method, Uri, Version};
use std::net::SocketAddr;

use crate::{Error, Result};

/// HTTP Request representation
#[derive(Debug, Clone)]
pub struct Request {
	/// Request method
	pub method: Method,
	/// Request target, including any query string
	pub uri: Uri,
	/// Protocol version
	pub version: Version,
	/// Request headers
	pub headers: HeaderMap,
	/// Request body (unused by static handlers)
	pub body: Bytes,
	/// Peer address, when the request came from a socket
	pub remote_addr: Option<SocketAddr>,
}

impl Request {
	/// Create a new request
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_http::Request;
	/// use hyper::{HeaderMap, Method, Uri, Version};
	/// use bytes::Bytes;
	///
	/// let request = Request::new(
	///     Method::GET,
	///     Uri::from_static("/app.js?v=2"),
	///     Version::HTTP_11,
	///     HeaderMap::new(),
	///     Bytes::new(),
	/// );
	/// assert_eq!(request.path(), "/app.js");
	/// ```
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
			remote_addr: None,
		}
	}

	/// Start building a request
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// URL path with the query string stripped
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Returns a header value as a string, if present and valid UTF-8
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_http::Request;
	///
	/// let request = Request::builder()
	///     .uri("/app.css")
	///     .header("accept-encoding", "gzip, br")
	///     .build()
	///     .unwrap();
	/// assert_eq!(request.header("Accept-Encoding"), Some("gzip, br"));
	/// assert_eq!(request.header("if-none-match"), None);
	/// ```
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|v| v.to_str().ok())
	}

	/// Returns `true` for HEAD requests
	pub fn is_head(&self) -> bool {
		self.method == Method::HEAD
	}
}

/// Builder for [`Request`]
#[derive(Debug, Default)]
pub struct RequestBuilder {
	method: Option<Method>,
	uri: Option<String>,
	headers: Vec<(String, String)>,
	body: Bytes,
}

impl RequestBuilder {
	/// Set the request method (defaults to GET)
	pub fn method(mut self, method: Method) -> Self {
		self.method = Some(method);
		self
	}

	/// Set the request URI
	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	/// Append a header
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	/// Set the request body
	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Build the request
	///
	/// # Errors
	///
	/// Returns [`Error::InvalidRequest`] if the URI or a header is malformed.
	pub fn build(self) -> Result<Request> {
		let uri: Uri = self
			.uri
			.as_deref()
			.unwrap_or("/")
			.parse()
			.map_err(|e| Error::InvalidRequest(format!("invalid uri: {}", e)))?;

		let mut headers = HeaderMap::new();
		for (name, value) in self.headers {
			let name = hyper::header::HeaderName::from_bytes(name.as_bytes())
				.map_err(|e| Error::InvalidRequest(format!("invalid header name: {}", e)))?;
			let value = hyper::header::HeaderValue::from_str(&value)
				.map_err(|e| Error::InvalidRequest(format!("invalid header value: {}", e)))?;
			headers.append(name, value);
		}

		Ok(Request::new(
			self.method.unwrap_or(Method::GET),
			uri,
			Version::HTTP_11,
			headers,
			self.body,
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_builder_defaults_to_get() {
		let request = Request::builder().uri("/index.html").build().unwrap();
		assert_eq!(request.method, Method::GET);
		assert!(!request.is_head());
		assert_eq!(request.path(), "/index.html");
	}

	#[rstest]
	fn test_query_string_is_not_part_of_path() {
		let request = Request::builder()
			.uri("/css/site.css?cache=bust&x=1")
			.build()
			.unwrap();
		assert_eq!(request.path(), "/css/site.css");
	}

	#[rstest]
	fn test_invalid_header_is_rejected() {
		let result = Request::builder()
			.uri("/")
			.header("bad header", "value")
			.build();
		assert!(matches!(result, Err(Error::InvalidRequest(_))));
	}
}
