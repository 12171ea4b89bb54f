//! Parsed metrics snapshot and its query surface.
//!
//! [`prometheus::parse_str`] and [`prometheus::parse_file`] turn a Prometheus
//! text-format dump into a [`MetricStore`]. The store is built once per
//! analysis run and only read afterwards.

pub mod error;
pub mod prometheus;
pub mod store;

pub use store::{HistogramBucket, Metric, MetricSample, MetricStore};
