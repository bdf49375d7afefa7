//! HTTP layer error types.

use thiserror::Error;

/// Result type for handler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while handling a request.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
	/// The request could not be built or parsed.
	#[error("invalid request: {0}")]
	InvalidRequest(String),

	/// Underlying I/O failure.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// Any other failure, surfaced as an internal server error.
	#[error("internal error: {0}")]
	Internal(String),
}

impl Error {
	/// Returns the HTTP status code this error maps to.
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_http::Error;
	///
	/// assert_eq!(Error::InvalidRequest("bad uri".into()).status_code(), 400);
	/// assert_eq!(Error::Internal("boom".into()).status_code(), 500);
	/// ```
	pub fn status_code(&self) -> u16 {
		match self {
			Error::InvalidRequest(_) => 400,
			Error::Io(_) | Error::Internal(_) => 500,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Error::InvalidRequest("x".into()), 400)]
	#[case(Error::Internal("x".into()), 500)]
	#[case(Error::Io(std::io::Error::other("disk")), 500)]
	fn test_status_code_mapping(#[case] error: Error, #[case] expected: u16) {
		assert_eq!(error.status_code(), expected);
	}
}
