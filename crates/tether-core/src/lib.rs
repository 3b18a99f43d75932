//! Core types and traits for the Tether URL shortener.
//!
//! This crate provides the shared data model, validation rules and the
//! record store contract used by the shortener, analytics and redirector
//! services.

pub mod clock;
pub mod error;
pub mod record;
pub mod repository;
pub mod shortcode;
pub mod target;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AliasViolation, StorageError, UrlViolation};
pub use record::{ClickContext, ClickEvent, NewShortUrl, ShortUrl};
pub use repository::{ReadRepository, Repository};
pub use shortcode::ShortCode;
pub use target::validate_target_url;
