//! Handler configuration.
//!
//! Loaded from TOML or assembled with the `with_*` builders, then checked
//! with [`UcdnConfig::validate`] before a handler is built from it.
//!
//! ```toml
//! source = "public"
//! dest = "/var/cache/ucdn"
//! cache_timeout_ms = 5000
//! compressible = [".css", ".js", ".svg"]
//!
//! [headers]
//! Cache-Control = "public, max-age=300"
//! ```

use hyper::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use ucdn_cache::compression::default_compressible;

/// Default bound applied to every cache operation
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration of a [`UcdnHandler`](crate::UcdnHandler)
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UcdnConfig {
	/// Root directory of the source assets
	pub source: PathBuf,

	/// Root directory of built variants; `None` means `<tmp>/ucdn`
	pub dest: Option<PathBuf>,

	/// Headers added to every response
	pub headers: BTreeMap<String, String>,

	/// Bound on stat, metadata reads, lock waits and builds. Also the TTL of
	/// memoized metadata.
	#[serde(rename = "cache_timeout_ms", deserialize_with = "deserialize_millis")]
	pub cache_timeout: Duration,

	/// Extensions that get compressed variants
	pub compressible: BTreeSet<String>,
}

impl Default for UcdnConfig {
	fn default() -> Self {
		Self {
			source: PathBuf::from("."),
			dest: None,
			headers: BTreeMap::new(),
			cache_timeout: DEFAULT_CACHE_TIMEOUT,
			compressible: default_compressible(),
		}
	}
}

impl UcdnConfig {
	/// Creates a configuration serving `source` with defaults elsewhere
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_server::UcdnConfig;
	/// use std::time::Duration;
	///
	/// let config = UcdnConfig::new("public")
	///     .with_dest("/var/cache/ucdn")
	///     .with_header("Cache-Control", "max-age=60")
	///     .with_cache_timeout(Duration::from_secs(2));
	///
	/// assert_eq!(config.dest_root(), std::path::PathBuf::from("/var/cache/ucdn"));
	/// assert_eq!(config.headers["Cache-Control"], "max-age=60");
	/// ```
	pub fn new(source: impl Into<PathBuf>) -> Self {
		Self {
			source: source.into(),
			..Default::default()
		}
	}

	/// Sets the destination root
	pub fn with_dest(mut self, dest: impl Into<PathBuf>) -> Self {
		self.dest = Some(dest.into());
		self
	}

	/// Adds a header sent with every response
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());
		self
	}

	/// Sets the cache timeout
	pub fn with_cache_timeout(mut self, timeout: Duration) -> Self {
		self.cache_timeout = timeout;
		self
	}

	/// Replaces the compressible extension set.
	///
	/// Entries are normalized to lowercase with a leading dot, so `"CSS"`
	/// and `".css"` are equivalent.
	pub fn with_compressible<I, S>(mut self, extensions: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.compressible = extensions
			.into_iter()
			.map(|ext| normalize_extension(ext.as_ref()))
			.collect();
		self
	}

	/// Load configuration from a TOML file.
	///
	/// # Errors
	///
	/// Returns error if file cannot be read or parsed.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
			path: path.as_ref().to_path_buf(),
			source: e,
		})?;

		Self::from_toml(&content)
	}

	/// Parse configuration from TOML string.
	pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
		let mut config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
			message: e.to_string(),
		})?;
		config.compressible = config
			.compressible
			.iter()
			.map(|ext| normalize_extension(ext))
			.collect();
		Ok(config)
	}

	/// Destination root, falling back to `<tmp>/ucdn`
	pub fn dest_root(&self) -> PathBuf {
		self.dest
			.clone()
			.unwrap_or_else(|| std::env::temp_dir().join("ucdn"))
	}

	/// Checks the configuration before a handler is built from it.
	///
	/// # Errors
	///
	/// - [`ConfigError::SourceNotDirectory`] if the source root is missing or
	///   not a directory
	/// - [`ConfigError::ZeroTimeout`] for a zero cache timeout
	/// - [`ConfigError::InvalidHeader`] for a header that cannot be sent
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !self.source.is_dir() {
			return Err(ConfigError::SourceNotDirectory(self.source.clone()));
		}
		if self.cache_timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}
		for (name, value) in &self.headers {
			if HeaderName::from_bytes(name.as_bytes()).is_err()
				|| HeaderValue::from_str(value).is_err()
			{
				return Err(ConfigError::InvalidHeader(format!("{}: {}", name, value)));
			}
		}
		Ok(())
	}
}

/// Parses a `Name: value` header line as given on the command line
///
/// # Examples
///
/// ```
/// use ucdn_server::config::parse_header_line;
///
/// let (name, value) = parse_header_line("Cache-Control: public, max-age=60").unwrap();
/// assert_eq!(name, "Cache-Control");
/// assert_eq!(value, "public, max-age=60");
/// assert!(parse_header_line("no separator").is_err());
/// ```
pub fn parse_header_line(line: &str) -> Result<(String, String), ConfigError> {
	let (name, value) = line
		.split_once(':')
		.ok_or_else(|| ConfigError::InvalidHeader(line.to_string()))?;
	let name = name.trim();
	if name.is_empty() {
		return Err(ConfigError::InvalidHeader(line.to_string()));
	}
	Ok((name.to_string(), value.trim().to_string()))
}

fn normalize_extension(ext: &str) -> String {
	let ext = ext.trim().to_lowercase();
	if ext.starts_with('.') {
		ext
	} else {
		format!(".{}", ext)
	}
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
	D: Deserializer<'de>,
{
	u64::deserialize(deserializer).map(Duration::from_millis)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// The configuration file could not be read.
	#[error("IO error reading {}: {source}", .path.display())]
	Io {
		/// File that failed
		path: PathBuf,
		/// Underlying error
		#[source]
		source: std::io::Error,
	},

	/// The configuration file is not valid TOML for this schema.
	#[error("Failed to parse configuration: {message}")]
	Parse {
		/// Parser message
		message: String,
	},

	/// The source root does not exist or is not a directory.
	#[error("Source root is not a directory: {}", .0.display())]
	SourceNotDirectory(PathBuf),

	/// The cache timeout is zero.
	#[error("Cache timeout must be greater than zero")]
	ZeroTimeout,

	/// A configured header has an invalid name or value.
	#[error("Invalid header: {0}")]
	InvalidHeader(String),
}
