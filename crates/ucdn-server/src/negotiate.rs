//! Compression negotiation
//!
//! Picks the variant encoding from the asset's extension and the request's
//! `Accept-Encoding`. Quality values are not weighed: a token that appears
//! as a standalone name counts as accepted, and brotli beats gzip beats
//! deflate.

use std::collections::BTreeSet;
use ucdn_cache::Encoding;
use ucdn_cache::compression::extension_of;

/// Chooses the encoding of the variant to serve for `path`
///
/// # Examples
///
/// ```
/// use ucdn_server::negotiate::negotiate;
/// use ucdn_cache::{Encoding, compression::default_compressible};
///
/// let compressible = default_compressible();
/// assert_eq!(negotiate("/app.js", &compressible, Some("gzip, deflate")), Encoding::Gzip);
/// assert_eq!(negotiate("/app.js", &compressible, Some("gzip, br")), Encoding::Brotli);
/// assert_eq!(negotiate("/logo.png", &compressible, Some("br")), Encoding::Identity);
/// assert_eq!(negotiate("/app.js", &compressible, None), Encoding::Identity);
/// ```
pub fn negotiate(
	path: &str,
	compressible: &BTreeSet<String>,
	accept_encoding: Option<&str>,
) -> Encoding {
	if !compressible.contains(&extension_of(path)) {
		return Encoding::Identity;
	}
	let Some(header) = accept_encoding else {
		return Encoding::Identity;
	};

	Encoding::PRECEDENCE
		.into_iter()
		.find(|encoding| {
			encoding
				.token()
				.is_some_and(|token| contains_token(header, token))
		})
		.unwrap_or_default()
}

/// Whether `token` appears in `header` delimited by word boundaries.
///
/// Word characters are ASCII alphanumerics and `_`; the comparison ignores
/// ASCII case.
///
/// # Examples
///
/// ```
/// use ucdn_server::negotiate::contains_token;
///
/// assert!(contains_token("gzip;q=1.0, identity", "gzip"));
/// assert!(contains_token("GZIP", "gzip"));
/// assert!(!contains_token("brotli", "br"));
/// assert!(!contains_token("xgzip", "gzip"));
/// ```
pub fn contains_token(header: &str, token: &str) -> bool {
	let header = header.to_ascii_lowercase();
	let bytes = header.as_bytes();
	let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';

	header.match_indices(token).any(|(start, matched)| {
		let end = start + matched.len();
		let before = start == 0 || !is_word(bytes[start - 1]);
		let after = end == bytes.len() || !is_word(bytes[end]);
		before && after
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use ucdn_cache::compression::default_compressible;

	#[rstest]
	#[case(Some("br, gzip, deflate"), Encoding::Brotli)]
	#[case(Some("gzip, deflate"), Encoding::Gzip)]
	#[case(Some("deflate, gzip"), Encoding::Gzip)]
	#[case(Some("deflate"), Encoding::Deflate)]
	#[case(Some("identity"), Encoding::Identity)]
	#[case(Some(""), Encoding::Identity)]
	#[case(None, Encoding::Identity)]
	fn test_precedence(#[case] header: Option<&str>, #[case] expected: Encoding) {
		assert_eq!(negotiate("/site.css", &default_compressible(), header), expected);
	}

	#[rstest]
	#[case("/APP.JS")]
	#[case("/data/feed.Json")]
	fn test_extension_is_case_insensitive(#[case] path: &str) {
		assert_eq!(
			negotiate(path, &default_compressible(), Some("gzip")),
			Encoding::Gzip
		);
	}

	#[rstest]
	fn test_substring_tokens_do_not_match() {
		assert_eq!(
			negotiate("/a.js", &default_compressible(), Some("brotli, xgzip, deflate2")),
			Encoding::Identity
		);
	}

	#[rstest]
	fn test_custom_compressible_set() {
		let only_txt: BTreeSet<String> = [".txt".to_string()].into();
		assert_eq!(negotiate("/a.js", &only_txt, Some("gzip")), Encoding::Identity);
		assert_eq!(negotiate("/a.txt", &only_txt, Some("gzip")), Encoding::Gzip);
	}
}
