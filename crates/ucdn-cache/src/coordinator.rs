//! Keyed single-flight build coordination
//!
//! Builds are serialized per base path: the compressed variants of an asset
//! and its verbatim copy share one lock, keyed by the uncompressed target
//! plus `.wait`. A builder that had to wait re-validates the metadata once it
//! holds the lock and reuses whatever the previous holder produced when the
//! record is still fresh and its variant is on disk, so concurrent first
//! requests cause a single build.

use crate::metadata::{VariantMetadata, with_suffix};
use crate::store::{BuildRequest, VariantStore};
use crate::{CacheError, CacheResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = Arc<Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>>;

/// Single-flight build coordinator.
///
/// The lock table lives as long as the coordinator (and its clones); nothing
/// is process-global. Entries are removed as soon as no task holds or waits
/// on them.
#[derive(Clone)]
pub struct BuildCoordinator {
	store: VariantStore,
	locks: LockTable,
	timeout: Duration,
}

/// Exclusive build permission for one base path.
///
/// Dropping the guard releases the lock, whatever the outcome of the build.
pub struct BuildGuard {
	key: PathBuf,
	lock: Arc<AsyncMutex<()>>,
	guard: Option<OwnedMutexGuard<()>>,
	locks: LockTable,
}

impl BuildGuard {
	/// Lock key this guard holds
	pub fn key(&self) -> &Path {
		&self.key
	}
}

impl Drop for BuildGuard {
	fn drop(&mut self) {
		self.guard.take();
		prune(&self.locks, &self.key, &self.lock);
	}
}

impl std::fmt::Debug for BuildGuard {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BuildGuard").field("key", &self.key).finish()
	}
}

impl BuildCoordinator {
	/// Creates a coordinator building through `store`, with every lock wait
	/// and build wait bounded by `timeout`
	pub fn new(store: VariantStore, timeout: Duration) -> Self {
		Self {
			store,
			locks: Arc::new(Mutex::new(HashMap::new())),
			timeout,
		}
	}

	/// The store builds go through
	pub fn store(&self) -> &VariantStore {
		&self.store
	}

	/// Lock key of an uncompressed target
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_cache::BuildCoordinator;
	/// use std::path::{Path, PathBuf};
	///
	/// assert_eq!(
	///     BuildCoordinator::lock_key(Path::new("/tmp/ucdn/css/site.css")),
	///     PathBuf::from("/tmp/ucdn/css/site.css.wait")
	/// );
	/// ```
	pub fn lock_key(uncompressed: &Path) -> PathBuf {
		with_suffix(uncompressed, ".wait")
	}

	/// Number of lock keys currently held or waited on
	pub fn in_flight(&self) -> usize {
		self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
	}

	/// Acquires exclusive build permission for an uncompressed target.
	///
	/// # Errors
	///
	/// [`CacheError::LockTimeout`] if another holder keeps the lock past
	/// `timeout`.
	pub async fn acquire(&self, uncompressed: &Path, timeout: Duration) -> CacheResult<BuildGuard> {
		let key = Self::lock_key(uncompressed);
		let lock = {
			let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
			Arc::clone(
				locks
					.entry(key.clone())
					.or_insert_with(|| Arc::new(AsyncMutex::new(()))),
			)
		};

		match tokio::time::timeout(timeout, Arc::clone(&lock).lock_owned()).await {
			Ok(guard) => Ok(BuildGuard {
				key,
				lock,
				guard: Some(guard),
				locks: Arc::clone(&self.locks),
			}),
			Err(_) => {
				prune(&self.locks, &key, &lock);
				log::warn!("Build lock {} not acquired within {:?}", key.display(), timeout);
				Err(CacheError::LockTimeout { key, timeout })
			}
		}
	}

	/// Makes sure a fresh variant exists for `request` and returns its
	/// metadata.
	///
	/// The work runs on a detached task: if the caller goes away or stops
	/// waiting after `timeout`, the build still completes and populates the
	/// store for later requests.
	///
	/// # Errors
	///
	/// Lock and build failures from the task, [`CacheError::Timeout`] when
	/// the task does not finish in time and [`CacheError::BuildAborted`] when
	/// it panics.
	pub async fn ensure(&self, request: BuildRequest) -> CacheResult<VariantMetadata> {
		let this = self.clone();
		let task = tokio::spawn(async move { this.build_exclusive(&request).await });

		match tokio::time::timeout(self.timeout, task).await {
			Ok(Ok(result)) => result,
			Ok(Err(e)) => Err(CacheError::BuildAborted(e.to_string())),
			Err(_) => {
				log::warn!("Build did not finish within {:?}", self.timeout);
				Err(CacheError::Timeout {
					operation: "build",
					timeout: self.timeout,
				})
			}
		}
	}

	async fn build_exclusive(&self, request: &BuildRequest) -> CacheResult<VariantMetadata> {
		let _guard = self.acquire(&request.uncompressed, self.timeout).await?;

		let stat = self.store.stat(&request.source, self.timeout).await?;
		if let Ok(meta) = self.store.read_metadata(&request.target, self.timeout).await
			&& meta.matches_source(&stat)
			&& self.store.has_variant(&request.target, &meta).await
		{
			log::debug!("Reusing variant built by a concurrent request: {}", request.target.display());
			return Ok(meta);
		}

		self.store.build(request).await
	}
}

impl std::fmt::Debug for BuildCoordinator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BuildCoordinator")
			.field("timeout", &self.timeout)
			.field("in_flight", &self.in_flight())
			.finish()
	}
}

// Every clone of a table entry is taken under the table lock, so a count of
// two (table + caller) means no other task holds or waits on it.
fn prune(locks: &LockTable, key: &Path, lock: &Arc<AsyncMutex<()>>) {
	let mut locks = locks.lock().unwrap_or_else(PoisonError::into_inner);
	if Arc::strong_count(lock) == 2 {
		locks.remove(key);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn coordinator() -> BuildCoordinator {
		BuildCoordinator::new(VariantStore::new(Duration::from_secs(5)), Duration::from_secs(5))
	}

	#[rstest]
	#[tokio::test]
	async fn test_guard_drop_prunes_table() {
		let coordinator = coordinator();
		let guard = coordinator
			.acquire(Path::new("/tmp/ucdn/a.css"), Duration::from_secs(1))
			.await
			.unwrap();
		assert_eq!(guard.key(), Path::new("/tmp/ucdn/a.css.wait"));
		assert_eq!(coordinator.in_flight(), 1);

		drop(guard);
		assert_eq!(coordinator.in_flight(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_second_acquire_times_out_while_held() {
		let coordinator = coordinator();
		let path = Path::new("/tmp/ucdn/b.js");
		let _held = coordinator.acquire(path, Duration::from_secs(1)).await.unwrap();

		let err = coordinator
			.acquire(path, Duration::from_millis(20))
			.await
			.unwrap_err();
		assert!(matches!(err, CacheError::LockTimeout { .. }));
		// the holder's entry survives the waiter's timeout
		assert_eq!(coordinator.in_flight(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_different_keys_do_not_contend() {
		let coordinator = coordinator();
		let _a = coordinator
			.acquire(Path::new("/tmp/ucdn/a.css"), Duration::from_secs(1))
			.await
			.unwrap();
		let b = coordinator
			.acquire(Path::new("/tmp/ucdn/b.css"), Duration::from_millis(50))
			.await;
		assert!(b.is_ok());
		assert_eq!(coordinator.in_flight(), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_waiter_acquires_after_release() {
		let coordinator = coordinator();
		let path = Path::new("/tmp/ucdn/c.html");
		let held = coordinator.acquire(path, Duration::from_secs(1)).await.unwrap();

		let waiter = {
			let coordinator = coordinator.clone();
			tokio::spawn(async move {
				coordinator
					.acquire(Path::new("/tmp/ucdn/c.html"), Duration::from_secs(2))
					.await
					.map(|_| ())
			})
		};
		tokio::time::sleep(Duration::from_millis(20)).await;
		drop(held);

		assert!(waiter.await.unwrap().is_ok());
		assert_eq!(coordinator.in_flight(), 0);
	}
}
