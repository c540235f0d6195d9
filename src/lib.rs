//! Member search engine for the pinboard.
//!
//! Query normalization, a TTL result cache, filter/sort/pagination execution,
//! facet aggregation and autocomplete suggestions over any [`store::MemberStore`].

pub mod analytics;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod search;
pub mod store;

pub use error::{AppError, Result};
