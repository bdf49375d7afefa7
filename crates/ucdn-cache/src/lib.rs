//! # ucdn cache
//!
//! The cache primitive behind the ucdn request handler.
//!
//! This crate owns everything that touches the destination directory:
//! - Stat of source assets, bounded by a timeout
//! - Variant metadata records, persisted next to each variant and memoized
//!   in memory for a TTL
//! - Building variants (verbatim copy plus brotli, gzip or deflate encodings)
//!   with atomic visibility
//! - A keyed build coordinator that lets exactly one build run per asset
//!
//! ## Module Structure
//!
//! - [`compression`] - Encodings and the byte-level codecs
//! - [`metadata`] - Source stat and variant metadata records
//! - [`store`] - The [`VariantStore`] (stat, metadata reads, builds)
//! - [`coordinator`] - The [`BuildCoordinator`] single-flight table
//! - [`etag`] - ETag and HTTP date helpers
//! - [`error`] - Error types

#![warn(missing_docs)]

pub mod compression;
pub mod coordinator;
mod entry;
pub mod error;
pub mod etag;
pub mod metadata;
pub mod statistics;
pub mod store;

pub use compression::Encoding;
pub use coordinator::BuildCoordinator;
pub use error::{CacheError, CacheResult};
pub use metadata::{SourceStat, VariantMetadata};
pub use statistics::StoreStatistics;
pub use store::{BuildOptions, BuildRequest, VariantStore};
