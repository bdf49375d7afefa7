//! Freshness and conditional-request evaluation

use ucdn_cache::{SourceStat, VariantMetadata};

/// State of a variant's cached metadata against the live source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
	/// Metadata matches the source; serve it
	Fresh,
	/// Metadata predates the source's current modification time
	Stale,
	/// No usable metadata (never built, expired, or unreadable)
	Missing,
}

impl Freshness {
	/// Returns `true` when the variant has to be (re)built
	pub fn needs_build(self) -> bool {
		!matches!(self, Freshness::Fresh)
	}
}

/// Classifies cached metadata against the source's live stat
pub fn classify(stat: &SourceStat, cached: Option<&VariantMetadata>) -> Freshness {
	match cached {
		None => Freshness::Missing,
		Some(meta) if meta.matches_source(stat) => Freshness::Fresh,
		Some(_) => Freshness::Stale,
	}
}

/// Whether a fresh variant can be answered with 304 Not Modified.
///
/// Only `If-None-Match` decides: the request qualifies when any listed tag
/// (or `*`) matches the variant's ETag under weak comparison.
pub fn is_not_modified(meta: &VariantMetadata, if_none_match: Option<&str>) -> bool {
	if_none_match.is_some_and(|value| etag_matches(&meta.etag, value))
}

/// Weak comparison of an ETag against an `If-None-Match` value
///
/// # Examples
///
/// ```
/// use ucdn_server::freshness::etag_matches;
///
/// assert!(etag_matches("\"5-abc\"", "\"5-abc\""));
/// assert!(etag_matches("\"5-abc\"", "W/\"5-abc\""));
/// assert!(etag_matches("\"5-abc\"", "\"other\", \"5-abc\""));
/// assert!(etag_matches("\"5-abc\"", "*"));
/// assert!(!etag_matches("\"5-abc\"", "\"5-abd\""));
/// ```
pub fn etag_matches(etag: &str, if_none_match: &str) -> bool {
	let etag = opaque_tag(etag);
	if_none_match
		.split(',')
		.map(str::trim)
		.filter(|candidate| !candidate.is_empty())
		.any(|candidate| candidate == "*" || opaque_tag(candidate) == etag)
}

fn opaque_tag(tag: &str) -> &str {
	tag.trim_start_matches("W/").trim_matches('"')
}
