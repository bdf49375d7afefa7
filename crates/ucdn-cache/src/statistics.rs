//! Variant store statistics

/// Counters reported by [`VariantStore::statistics`](crate::VariantStore::statistics)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStatistics {
	/// Metadata reads answered from memory or disk
	pub metadata_hits: u64,
	/// Metadata reads that found no usable record
	pub metadata_misses: u64,
	/// Completed variant builds
	pub builds: u64,
	/// Metadata records currently memoized in memory
	pub entry_count: u64,
}

impl StoreStatistics {
	/// Fraction of metadata reads that found a record (0.0 to 1.0)
	///
	/// # Examples
	///
	/// ```
	/// use ucdn_cache::StoreStatistics;
	///
	/// let mut stats = StoreStatistics::default();
	/// assert_eq!(stats.hit_rate(), 0.0);
	///
	/// stats.metadata_hits = 3;
	/// stats.metadata_misses = 1;
	/// assert_eq!(stats.hit_rate(), 0.75);
	/// ```
	pub fn hit_rate(&self) -> f64 {
		let total = self.metadata_hits + self.metadata_misses;
		if total == 0 {
			0.0
		} else {
			self.metadata_hits as f64 / total as f64
		}
	}
}
