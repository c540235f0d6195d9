//! Search analytics
//!
//! An optional collaborator that records executed searches and result clicks
//! and hands them to an [`AnalyticsSink`] in batches. The search core never
//! depends on it: tracking is fire-and-forget and sink failures are logged
//! and dropped.
//!
//! # Example
//!
//! ```no_run
//! use pinboard_search::analytics::{SearchAnalytics, TracingSink};
//! use pinboard_search::config::AnalyticsConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let analytics = SearchAnalytics::start(Arc::new(TracingSink), &AnalyticsConfig::default())?;
//!
//!     analytics.track_search("developer", 12, 4.2, vec!["pin_color:teal".to_string()]);
//!     analytics.shutdown().await;
//!
//!     Ok(())
//! }
//! ```

mod error;
mod event;
mod service;
mod sink;

pub use error::{AnalyticsError, AnalyticsResult};
pub use event::{filters_used, new_session_id, SearchEvent};
pub use service::SearchAnalytics;
pub use sink::{AnalyticsSink, AnalyticsSummary, InMemorySink, TracingSink, ValueCount};
