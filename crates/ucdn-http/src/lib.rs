//! # ucdn HTTP
//!
//! Request, response and handler types shared by the ucdn crates.
//!
//! The types are thin wrappers around `hyper`'s header and status types so a
//! handler can be exercised directly in tests without a socket, and adapted
//! to a real connection by `ucdn-server`.
//!
//! ## Module Structure
//!
//! - [`request`] - Inbound request representation
//! - [`response`] - Outbound response with a streamable [`Body`]
//! - [`handler`] - The async [`Handler`] trait
//! - [`error`] - Error types

#![warn(missing_docs)]

pub mod body;
pub mod error;
pub mod handler;
pub mod request;
pub mod response;

pub use body::Body;
pub use error::{Error, Result};
pub use handler::Handler;
pub use request::{Request, RequestBuilder};
pub use response::Response;
