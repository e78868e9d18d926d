//! Filtering, geometry and search core for a water-issues map dashboard.
//!
//! Municipalities, parks and reported water incidents are loaded from one bulk
//! payload, classified, filtered against a [`filter::FilterCriteria`] snapshot,
//! summarised and made searchable. [`dashboard::Dashboard`] owns that state.

pub mod app;
pub mod classify;
pub mod config;
pub mod dashboard;
pub mod filter;
pub mod geometry;
pub mod metrics;
pub mod search;
pub mod sinks;
pub mod source;
