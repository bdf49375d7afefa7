use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};

use crate::Body;

/// HTTP Response representation
#[derive(Debug)]
pub struct Response {
	/// Status code
	pub status: StatusCode,
	/// Response headers
	pub headers: HeaderMap,
	/// Response body
	pub body: Body,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Body::Empty,
		}
	}
	/// Create a Response with HTTP 200 OK status
	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}
	/// Create a Response with HTTP 304 Not Modified status
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::not_modified();
	/// assert_eq!(response.status, StatusCode::NOT_MODIFIED);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn not_modified() -> Self {
		Self::new(StatusCode::NOT_MODIFIED)
	}
	/// Create a Response with HTTP 404 Not Found status
	pub fn not_found() -> Self {
		Self::new(StatusCode::NOT_FOUND)
	}
	/// Create a Response with HTTP 405 Method Not Allowed status
	pub fn method_not_allowed() -> Self {
		Self::new(StatusCode::METHOD_NOT_ALLOWED)
	}
	/// Create a Response with HTTP 500 Internal Server Error status
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::internal_server_error();
	/// assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}
	/// Set the response body
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_http::Response;
	///
	/// let response = Response::ok().with_body("Hello, World!");
	/// assert_eq!(response.body.len(), 13);
	/// ```
	pub fn with_body(mut self, body: impl Into<Body>) -> Self {
		self.body = body.into();
		self
	}
	/// Add a custom header to the response
	///
	/// Invalid names or values are skipped silently.
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_http::Response;
	///
	/// let response = Response::ok().with_header("X-Custom-Header", "custom-value");
	/// assert_eq!(
	///     response.headers.get("X-Custom-Header").unwrap().to_str().unwrap(),
	///     "custom-value"
	/// );
	/// ```
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let Ok(header_name) = HeaderName::from_bytes(name.as_bytes())
			&& let Ok(header_value) = HeaderValue::from_str(value)
		{
			self.headers.insert(header_name, header_value);
		}
		self
	}
	/// Merge a set of string headers into the response
	///
	/// Later entries overwrite earlier ones with the same name.
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_http::Response;
	///
	/// let headers = vec![
	///     ("Content-Type".to_string(), "text/css".to_string()),
	///     ("Cache-Control".to_string(), "max-age=60".to_string()),
	/// ];
	/// let response = Response::ok().with_headers(headers.iter());
	/// assert_eq!(response.headers.len(), 2);
	/// ```
	pub fn with_headers<'a, I>(mut self, headers: I) -> Self
	where
		I: IntoIterator<Item = &'a (String, String)>,
	{
		for (name, value) in headers {
			self = self.with_header(name, value);
		}
		self
	}
	/// Drop the body while keeping status and headers (HEAD semantics)
	pub fn without_body(mut self) -> Self {
		self.body = Body::Empty;
		self
	}
}

impl From<crate::Error> for Response {
	fn from(error: crate::Error) -> Self {
		let status =
			StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		Response::new(status)
	}
}
