//! Internal cache entry structure

use std::time::{Duration, SystemTime};

/// Cache entry with expiration
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<T> {
	pub(crate) value: T,
	pub(crate) expires_at: Option<SystemTime>,
}

impl<T> CacheEntry<T> {
	pub(crate) fn new(value: T, ttl: Option<Duration>) -> Self {
		let expires_at = ttl.map(|d| SystemTime::now() + d);
		Self { value, expires_at }
	}

	pub(crate) fn is_expired(&self) -> bool {
		if let Some(expires_at) = self.expires_at {
			SystemTime::now() > expires_at
		} else {
			false
		}
	}
}
