//! Cache primitive error types.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised by the variant store and the build coordinator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
	/// The source asset (or a metadata record) does not exist.
	#[error("not found: {}", .0.display())]
	NotFound(PathBuf),

	/// A cache operation did not finish within the configured timeout.
	#[error("{operation} timed out after {timeout:?}")]
	Timeout {
		/// Operation that timed out (stat, metadata, build).
		operation: &'static str,
		/// The bound that was exceeded.
		timeout: Duration,
	},

	/// Exclusive build access could not be acquired in time.
	#[error("build lock {} not acquired within {timeout:?}", .key.display())]
	LockTimeout {
		/// Lock key (base path plus `.wait`).
		key: PathBuf,
		/// The bound that was exceeded.
		timeout: Duration,
	},

	/// Compressing the source failed.
	#[error("compression failed: {0}")]
	Compression(String),

	/// A persisted metadata record could not be decoded or encoded.
	#[error("invalid metadata record: {0}")]
	Metadata(#[from] serde_json::Error),

	/// A detached build task panicked or was cancelled.
	#[error("build aborted: {0}")]
	BuildAborted(String),

	/// Underlying I/O failure.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl CacheError {
	/// Returns `true` when the error means the source asset is absent
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_cache::CacheError;
	/// use std::path::PathBuf;
	///
	/// assert!(CacheError::NotFound(PathBuf::from("/srv/missing.css")).is_not_found());
	/// assert!(!CacheError::Compression("bad".into()).is_not_found());
	/// ```
	pub fn is_not_found(&self) -> bool {
		matches!(self, CacheError::NotFound(_))
	}
}
