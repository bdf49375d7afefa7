//! Content encodings and the set of compressible file types

pub mod codec;

pub use codec::compress;

use std::collections::BTreeSet;
use std::path::Path;

/// Encoding of a target variant.
///
/// Each encoding maps to the suffix appended to the variant's path in the
/// destination root and to the `Content-Encoding` token sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
	/// Verbatim copy, no suffix
	#[default]
	Identity,
	/// Brotli (`.br`, `Content-Encoding: br`)
	Brotli,
	/// Gzip (`.gzip`, `Content-Encoding: gzip`)
	Gzip,
	/// Zlib-wrapped deflate (`.deflate`, `Content-Encoding: deflate`)
	Deflate,
}

impl Encoding {
	/// Compressed encodings in negotiation precedence order
	pub const PRECEDENCE: [Encoding; 3] = [Encoding::Brotli, Encoding::Gzip, Encoding::Deflate];

	/// Path suffix of the variant
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_cache::Encoding;
	///
	/// assert_eq!(Encoding::Brotli.suffix(), ".br");
	/// assert_eq!(Encoding::Gzip.suffix(), ".gzip");
	/// assert_eq!(Encoding::Identity.suffix(), "");
	/// ```
	pub fn suffix(self) -> &'static str {
		match self {
			Encoding::Identity => "",
			Encoding::Brotli => ".br",
			Encoding::Gzip => ".gzip",
			Encoding::Deflate => ".deflate",
		}
	}

	/// Token as it appears in `Accept-Encoding` / `Content-Encoding`
	pub fn token(self) -> Option<&'static str> {
		match self {
			Encoding::Identity => None,
			Encoding::Brotli => Some("br"),
			Encoding::Gzip => Some("gzip"),
			Encoding::Deflate => Some("deflate"),
		}
	}

	/// Returns `true` for the verbatim encoding
	pub fn is_identity(self) -> bool {
		self == Encoding::Identity
	}
}

/// Extensions compressed by default (lowercase, with leading dot)
pub const DEFAULT_COMPRESSIBLE: &[&str] = &[
	".css", ".csv", ".htm", ".html", ".js", ".json", ".map", ".md", ".mjs", ".svg", ".ts",
	".txt", ".wasm", ".xml", ".yaml", ".yml",
];

/// Builds the default compressible extension set
pub fn default_compressible() -> BTreeSet<String> {
	DEFAULT_COMPRESSIBLE.iter().map(|ext| ext.to_string()).collect()
}

/// Lowercased extension of a request path including the leading dot
///
/// Returns an empty string when the last segment has no extension.
///
/// # Examples
///
/// ```
/// use ucdn_cache::compression::extension_of;
///
/// assert_eq!(extension_of("/css/Site.CSS"), ".css");
/// assert_eq!(extension_of("/archive.tar.gz"), ".gz");
/// assert_eq!(extension_of("/README"), "");
/// assert_eq!(extension_of("/.hidden"), "");
/// ```
pub fn extension_of(path: &str) -> String {
	Path::new(path)
		.extension()
		.map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
		.unwrap_or_default()
}
