//! URL registry: creation, lookup, listing and deletion of short URLs.
//!
//! Code generation lives in `tether_generator`; this crate owns the retry
//! policy around it and the mapping of store failures to registry errors.

pub mod error;
pub mod service;
pub mod shortener;

pub use error::ShortenerError;
pub use service::{ShortenerService, ShortenerSettings};
pub use shortener::{ExpirationPolicy, ShortenParams, Shortener};
