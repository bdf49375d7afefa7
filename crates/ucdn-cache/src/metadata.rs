//! Source stat and variant metadata records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::etag::http_date;

/// Live attributes of a source asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceStat {
	/// Filesystem modification time
	pub modified: SystemTime,
	/// Size in bytes
	pub size: u64,
}

impl SourceStat {
	/// Modification time as it is recorded in `Last-Modified`
	pub fn last_modified(&self) -> String {
		http_date(self.modified)
	}
}

/// Header record persisted next to every built variant.
///
/// Field names serialize as the header names they are sent as, so the JSON
/// file on disk reads like the response headers it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantMetadata {
	/// Source modification time at build time (IMF-fixdate)
	#[serde(rename = "Last-Modified")]
	pub last_modified: String,

	/// Strong ETag of the variant bytes
	#[serde(rename = "ETag")]
	pub etag: String,

	/// Size of the variant in bytes
	#[serde(rename = "Content-Length")]
	pub content_length: u64,

	/// MIME type of the source asset
	#[serde(rename = "Content-Type")]
	pub content_type: String,

	/// Encoding token for compressed variants
	#[serde(
		rename = "Content-Encoding",
		default,
		skip_serializing_if = "Option::is_none"
	)]
	pub content_encoding: Option<String>,

	/// `Accept-Encoding` for assets that have compressed variants
	#[serde(rename = "Vary", default, skip_serializing_if = "Option::is_none")]
	pub vary: Option<String>,

	/// Caller-supplied headers merged in at build time
	#[serde(flatten)]
	pub extra: BTreeMap<String, String>,
}

impl VariantMetadata {
	/// Whether this record still describes the source with the given stat.
	///
	/// A record is valid only while its `Last-Modified` equals the source's
	/// live modification time; any difference means the source was edited
	/// after the variant was built.
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_cache::{SourceStat, VariantMetadata};
	/// use std::collections::BTreeMap;
	/// use std::time::{Duration, UNIX_EPOCH};
	///
	/// let stat = SourceStat { modified: UNIX_EPOCH + Duration::from_secs(1_445_412_480), size: 5 };
	/// let meta = VariantMetadata {
	///     last_modified: "Wed, 21 Oct 2015 07:28:00 GMT".into(),
	///     etag: "\"5-00\"".into(),
	///     content_length: 5,
	///     content_type: "text/plain".into(),
	///     content_encoding: None,
	///     vary: None,
	///     extra: BTreeMap::new(),
	/// };
	/// assert!(meta.matches_source(&stat));
	///
	/// let edited = SourceStat { modified: stat.modified + Duration::from_secs(2), ..stat };
	/// assert!(!meta.matches_source(&edited));
	/// ```
	pub fn matches_source(&self, stat: &SourceStat) -> bool {
		self.last_modified == stat.last_modified()
	}

	/// Response headers for this variant, in a stable order.
	///
	/// The standard headers come first, followed by the caller-supplied ones;
	/// a caller header with the same name as a standard one wins.
	pub fn headers(&self) -> Vec<(String, String)> {
		let mut headers = vec![
			("Content-Type".to_string(), self.content_type.clone()),
			("Content-Length".to_string(), self.content_length.to_string()),
			("ETag".to_string(), self.etag.clone()),
			("Last-Modified".to_string(), self.last_modified.clone()),
		];
		if let Some(encoding) = &self.content_encoding {
			headers.push(("Content-Encoding".to_string(), encoding.clone()));
		}
		if let Some(vary) = &self.vary {
			headers.push(("Vary".to_string(), vary.clone()));
		}
		headers.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
		headers
	}
}

/// Directory, next to the variants it describes, that holds metadata records.
///
/// Keeping records out of the variants' own namespace means an asset named
/// `app.css.json` never collides with the record of `app.css`.
pub const METADATA_DIR: &str = ".ucdn-meta";

/// Location of the metadata record for a variant:
/// `<dir>/.ucdn-meta/<variant name>.json`
///
/// # Examples
///
/// ```
/// use ucdn_cache::metadata::metadata_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     metadata_path(Path::new("/tmp/ucdn/app.js.br")),
///     PathBuf::from("/tmp/ucdn/.ucdn-meta/app.js.br.json")
/// );
/// ```
pub fn metadata_path(variant: &Path) -> PathBuf {
	let mut name = variant
		.file_name()
		.map(OsString::from)
		.unwrap_or_default();
	name.push(".json");
	match variant.parent() {
		Some(parent) => parent.join(METADATA_DIR).join(name),
		None => Path::new(METADATA_DIR).join(name),
	}
}

/// Appends a raw suffix to a path without touching its extension
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
	let mut s: OsString = path.as_os_str().to_owned();
	s.push(suffix);
	PathBuf::from(s)
}
