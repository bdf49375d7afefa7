//! Response bodies.
//!
//! A body is either absent, an in-memory buffer, or an already opened file.
//! Holding the open handle rather than a path means a variant that gets
//! replaced on disk while the response is in flight is still sent whole: the
//! handle keeps pointing at the bytes the headers were computed for.

use bytes::Bytes;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Body of a [`Response`](crate::Response)
#[derive(Debug, Default)]
pub enum Body {
	/// No body (304, 404, 500, HEAD)
	#[default]
	Empty,

	/// An in-memory buffer
	Full(Bytes),

	/// An opened file streamed to the client
	File {
		/// Handle positioned at the start of the content
		file: File,
		/// Number of bytes to send
		len: u64,
	},
}

impl Body {
	/// Creates an empty body
	pub fn empty() -> Self {
		Self::Empty
	}

	/// Wraps an opened file of known length
	pub fn file(file: File, len: u64) -> Self {
		Self::File { file, len }
	}

	/// Returns `true` if the body carries no bytes
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_http::Body;
	/// use bytes::Bytes;
	///
	/// assert!(Body::empty().is_empty());
	/// assert!(Body::Full(Bytes::new()).is_empty());
	/// assert!(!Body::Full(Bytes::from("x")).is_empty());
	/// ```
	pub fn is_empty(&self) -> bool {
		match self {
			Body::Empty => true,
			Body::Full(bytes) => bytes.is_empty(),
			Body::File { len, .. } => *len == 0,
		}
	}

	/// Length of the body in bytes, if known up front
	pub fn len(&self) -> u64 {
		match self {
			Body::Empty => 0,
			Body::Full(bytes) => bytes.len() as u64,
			Body::File { len, .. } => *len,
		}
	}

	/// Reads the whole body into memory.
	///
	/// Intended for tests and small payloads; the server streams file bodies
	/// instead of collecting them.
	///
	/// # Errors
	///
	/// Returns an error if reading the underlying file fails.
	pub async fn collect(self) -> std::io::Result<Bytes> {
		match self {
			Body::Empty => Ok(Bytes::new()),
			Body::Full(bytes) => Ok(bytes),
			Body::File { file, len } => {
				let mut buf = Vec::with_capacity(len as usize);
				file.take(len).read_to_end(&mut buf).await?;
				Ok(Bytes::from(buf))
			}
		}
	}
}

impl From<Bytes> for Body {
	fn from(bytes: Bytes) -> Self {
		Body::Full(bytes)
	}
}

impl From<&'static str> for Body {
	fn from(s: &'static str) -> Self {
		Body::Full(Bytes::from_static(s.as_bytes()))
	}
}

impl From<Vec<u8>> for Body {
	fn from(v: Vec<u8>) -> Self {
		Body::Full(Bytes::from(v))
	}
}
