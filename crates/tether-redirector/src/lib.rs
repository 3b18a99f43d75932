//! Redirect resolution.
//!
//! [`RedirectorService`] turns a short code into its original URL: it looks
//! the code up, refuses expired records, and records a click for every
//! successful redirect. Click recording is best effort; a failure there is
//! logged and the redirect still succeeds.

pub mod error;
pub mod redirector;
pub mod service;

pub use error::{RedirectError, Result};
pub use redirector::Redirector;
pub use service::RedirectorService;
