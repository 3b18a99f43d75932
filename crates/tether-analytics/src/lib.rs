//! Click recording and per-URL statistics.

pub mod aggregator;
pub mod error;
pub mod recorder;

pub use aggregator::{AnalyticsService, AnalyticsSettings, UrlStats};
pub use error::AnalyticsError;
pub use recorder::ClickRecorder;
