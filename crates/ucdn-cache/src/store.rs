//! Variant store: stat, metadata reads and variant builds
//!
//! The store is the only component that writes to the destination root.
//! Every file it produces becomes visible through a rename of a fully written
//! temporary file in the same directory, and a variant's metadata record is
//! renamed into place only after the variant bytes, so a reader that finds a
//! record can always open matching bytes.

use crate::compression::{Encoding, compress};
use crate::entry::CacheEntry;
use crate::etag::generate_etag;
use crate::metadata::{SourceStat, VariantMetadata, metadata_path, with_suffix};
use crate::statistics::StoreStatistics;
use crate::{CacheError, CacheResult};
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Per-build response options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
	/// Headers merged into every metadata record this build writes
	pub headers: BTreeMap<String, String>,
	/// Record `Vary: Accept-Encoding` (set for compressible assets)
	pub vary: bool,
}

/// Everything a build needs to know about one target variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
	/// Variant path that will be served (`uncompressed` + encoding suffix)
	pub target: PathBuf,
	/// Source asset
	pub source: PathBuf,
	/// Verbatim copy location; also the base of the build lock key
	pub uncompressed: PathBuf,
	/// Encoding of `target`
	pub encoding: Encoding,
	/// Header options
	pub options: BuildOptions,
}

impl BuildRequest {
	/// Creates a request, deriving the target from the uncompressed path
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_cache::{BuildOptions, BuildRequest, Encoding};
	/// use std::path::PathBuf;
	///
	/// let request = BuildRequest::new(
	///     "/srv/www/app.js",
	///     "/tmp/ucdn/app.js",
	///     Encoding::Gzip,
	///     BuildOptions::default(),
	/// );
	/// assert_eq!(request.target, PathBuf::from("/tmp/ucdn/app.js.gzip"));
	/// ```
	pub fn new(
		source: impl Into<PathBuf>,
		uncompressed: impl Into<PathBuf>,
		encoding: Encoding,
		options: BuildOptions,
	) -> Self {
		let uncompressed = uncompressed.into();
		Self {
			target: with_suffix(&uncompressed, encoding.suffix()),
			source: source.into(),
			uncompressed,
			encoding,
			options,
		}
	}
}

/// Filesystem-backed variant store with an in-memory metadata cache.
///
/// Cloning is cheap; clones share the metadata cache and the counters.
#[derive(Clone)]
pub struct VariantStore {
	metadata: Arc<RwLock<HashMap<PathBuf, CacheEntry<VariantMetadata>>>>,
	ttl: Duration,
	hits: Arc<AtomicU64>,
	misses: Arc<AtomicU64>,
	builds: Arc<AtomicU64>,
}

impl VariantStore {
	/// Creates a store whose in-memory metadata entries live for `ttl`
	pub fn new(ttl: Duration) -> Self {
		Self {
			metadata: Arc::new(RwLock::new(HashMap::new())),
			ttl,
			hits: Arc::new(AtomicU64::new(0)),
			misses: Arc::new(AtomicU64::new(0)),
			builds: Arc::new(AtomicU64::new(0)),
		}
	}

	/// TTL of memoized metadata records
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Stats a source asset, bounded by `timeout`.
	///
	/// The result is never memoized: freshness is always judged against the
	/// live modification time. Directories are reported as
	/// [`CacheError::NotFound`] since only files can be served.
	pub async fn stat(&self, path: &Path, timeout: Duration) -> CacheResult<SourceStat> {
		with_timeout("stat", timeout, stat_file(path)).await
	}

	/// Reads the metadata record of a variant, bounded by `timeout`.
	///
	/// Unexpired in-memory entries answer first; otherwise the record at
	/// [`metadata_path`] is read from disk and memoized.
	///
	/// # Errors
	///
	/// [`CacheError::NotFound`] when no record exists,
	/// [`CacheError::Metadata`] when the record cannot be decoded and
	/// [`CacheError::Timeout`] when the read does not finish in time.
	pub async fn read_metadata(
		&self,
		target: &Path,
		timeout: Duration,
	) -> CacheResult<VariantMetadata> {
		{
			let cache = self.metadata.read().await;
			if let Some(entry) = cache.get(target)
				&& !entry.is_expired()
			{
				self.hits.fetch_add(1, Ordering::Relaxed);
				return Ok(entry.value.clone());
			}
		}

		let record = metadata_path(target);
		let result = with_timeout("metadata read", timeout, async {
			let raw = match tokio::fs::read(&record).await {
				Ok(raw) => raw,
				Err(e) if e.kind() == ErrorKind::NotFound => {
					return Err(CacheError::NotFound(record.clone()));
				}
				Err(e) => return Err(e.into()),
			};
			Ok(serde_json::from_slice::<VariantMetadata>(&raw)?)
		})
		.await;

		match result {
			Ok(meta) => {
				self.hits.fetch_add(1, Ordering::Relaxed);
				self.remember(target, meta.clone()).await;
				Ok(meta)
			}
			Err(e) => {
				self.misses.fetch_add(1, Ordering::Relaxed);
				Err(e)
			}
		}
	}

	/// Whether `target` is on disk with the length its record describes.
	///
	/// A record can outlive its variant (a cleaned temp directory, a manual
	/// delete); such a record must not be reused.
	pub async fn has_variant(&self, target: &Path, meta: &VariantMetadata) -> bool {
		match tokio::fs::metadata(target).await {
			Ok(file) => file.is_file() && file.len() == meta.content_length,
			Err(_) => false,
		}
	}

	/// Builds a variant and its metadata record.
	///
	/// The source is read once. The verbatim copy is always (re)written at
	/// `request.uncompressed`; for compressed encodings the encoded bytes are
	/// then written at `request.target`. Each file is followed by its
	/// metadata record. `Last-Modified` is taken from a stat made before the
	/// read, so a source edited mid-build yields a record that is already
	/// stale and will be rebuilt.
	///
	/// Callers serialize builds per base path through
	/// [`BuildCoordinator`](crate::BuildCoordinator).
	pub async fn build(&self, request: &BuildRequest) -> CacheResult<VariantMetadata> {
		let stat = stat_file(&request.source).await?;
		let data = match tokio::fs::read(&request.source).await {
			Ok(data) => data,
			Err(e) if e.kind() == ErrorKind::NotFound => {
				return Err(CacheError::NotFound(request.source.clone()));
			}
			Err(e) => return Err(e.into()),
		};

		let content_type = mime_guess::from_path(&request.source)
			.first_or_octet_stream()
			.to_string();
		let last_modified = stat.last_modified();
		let record = |bytes: &[u8], encoding: Encoding| VariantMetadata {
			last_modified: last_modified.clone(),
			etag: generate_etag(bytes),
			content_length: bytes.len() as u64,
			content_type: content_type.clone(),
			content_encoding: encoding.token().map(str::to_string),
			vary: request.options.vary.then(|| "Accept-Encoding".to_string()),
			extra: request.options.headers.clone(),
		};

		let verbatim = record(&data, Encoding::Identity);
		self.persist(&request.uncompressed, &data, &verbatim).await?;

		let meta = if request.encoding.is_identity() {
			verbatim
		} else {
			let encoding = request.encoding;
			let encoded = tokio::task::spawn_blocking(move || compress(encoding, &data))
				.await
				.map_err(|e| CacheError::BuildAborted(e.to_string()))??;
			let meta = record(&encoded, encoding);
			self.persist(&request.target, &encoded, &meta).await?;
			meta
		};

		self.builds.fetch_add(1, Ordering::Relaxed);
		log::info!(
			"Built {} ({} bytes, {:?})",
			request.target.display(),
			meta.content_length,
			request.encoding
		);
		Ok(meta)
	}

	/// Drops expired in-memory metadata entries
	pub async fn cleanup_expired(&self) {
		let mut cache = self.metadata.write().await;
		cache.retain(|_, entry| !entry.is_expired());
	}

	/// Current counters
	pub async fn statistics(&self) -> StoreStatistics {
		let cache = self.metadata.read().await;
		StoreStatistics {
			metadata_hits: self.hits.load(Ordering::Relaxed),
			metadata_misses: self.misses.load(Ordering::Relaxed),
			builds: self.builds.load(Ordering::Relaxed),
			entry_count: cache.len() as u64,
		}
	}

	async fn persist(&self, path: &Path, bytes: &[u8], meta: &VariantMetadata) -> CacheResult<()> {
		write_atomic(path, bytes).await?;
		write_atomic(&metadata_path(path), &serde_json::to_vec(meta)?).await?;
		self.remember(path, meta.clone()).await;
		Ok(())
	}

	async fn remember(&self, target: &Path, meta: VariantMetadata) {
		let mut cache = self.metadata.write().await;
		cache.insert(target.to_path_buf(), CacheEntry::new(meta, Some(self.ttl)));
	}
}

impl std::fmt::Debug for VariantStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("VariantStore")
			.field("ttl", &self.ttl)
			.field("builds", &self.builds.load(Ordering::Relaxed))
			.finish_non_exhaustive()
	}
}

async fn with_timeout<T>(
	operation: &'static str,
	timeout: Duration,
	fut: impl Future<Output = CacheResult<T>>,
) -> CacheResult<T> {
	match tokio::time::timeout(timeout, fut).await {
		Ok(result) => result,
		Err(_) => {
			log::warn!("{} timed out after {:?}", operation, timeout);
			Err(CacheError::Timeout { operation, timeout })
		}
	}
}

async fn stat_file(path: &Path) -> CacheResult<SourceStat> {
	match tokio::fs::metadata(path).await {
		Ok(meta) if meta.is_file() => Ok(SourceStat {
			modified: meta.modified()?,
			size: meta.len(),
		}),
		Ok(_) => Err(CacheError::NotFound(path.to_path_buf())),
		Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::NotFound(path.to_path_buf())),
		Err(e) => Err(e.into()),
	}
}

/// Writes `bytes` to a sibling temp file, then renames it over `path`
async fn write_atomic(path: &Path, bytes: &[u8]) -> CacheResult<()> {
	if let Some(parent) = path.parent() {
		tokio::fs::create_dir_all(parent).await?;
	}
	let tmp = with_suffix(path, &format!(".{}.tmp", Uuid::new_v4().simple()));
	if let Err(e) = tokio::fs::write(&tmp, bytes).await {
		let _ = tokio::fs::remove_file(&tmp).await;
		return Err(e.into());
	}
	if let Err(e) = tokio::fs::rename(&tmp, path).await {
		let _ = tokio::fs::remove_file(&tmp).await;
		return Err(e.into());
	}
	Ok(())
}
