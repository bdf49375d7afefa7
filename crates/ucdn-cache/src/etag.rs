//! ETag and HTTP date helpers

use sha2::{Digest, Sha256};
use std::time::SystemTime;

/// Generates a strong ETag for a variant's bytes.
///
/// Format: `"{len_hex}-{sha256_prefix_hex}"`, quoted as the header requires.
/// Two variants with identical bytes share an ETag no matter when they were
/// built, which keeps rebuilt-but-unchanged assets revalidating as 304.
///
/// # Examples
///
/// ```
/// use ucdn_cache::etag::generate_etag;
///
/// let etag = generate_etag(b"hello");
/// assert!(etag.starts_with("\"5-"));
/// assert!(etag.ends_with('"'));
/// assert_eq!(etag, generate_etag(b"hello"));
/// ```
pub fn generate_etag(data: &[u8]) -> String {
	let digest = Sha256::digest(data);
	format!("\"{:x}-{}\"", data.len(), hex::encode(&digest[..8]))
}

/// Formats a modification time as an IMF-fixdate (`Last-Modified` value)
///
/// # Examples
///
/// ```
/// use ucdn_cache::etag::http_date;
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let t = UNIX_EPOCH + Duration::from_secs(1_445_412_480);
/// assert_eq!(http_date(t), "Wed, 21 Oct 2015 07:28:00 GMT");
/// ```
pub fn http_date(time: SystemTime) -> String {
	httpdate::fmt_http_date(time)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_etag_differs_for_different_content() {
		assert_ne!(generate_etag(b"a { }"), generate_etag(b"b { }"));
	}

	#[rstest]
	fn test_etag_of_empty_input() {
		let etag = generate_etag(b"");
		assert!(etag.starts_with("\"0-"));
	}
}
