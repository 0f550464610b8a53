//! Mobility point store and query layer.
//!
//! Persists timestamped activity/location samples per user and answers
//! filtered queries and summary statistics over them: an immutable
//! [`MobilityPoint`] entity, a [`MobilityStore`] for durable filtered
//! retrieval, and a [`MobilityAggregator`] for derived statistics. The
//! HTTP surface that fronts this in production is a separate concern;
//! everything here is callable directly.

pub mod aggregator;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod store;

pub use aggregator::MobilityAggregator;
pub use config::AppConfig;
pub use db::DbPool;
pub use error::{MobilityError, Result};
pub use models::{
    Location, LocationStatus, MobilityPoint, Mode, PrivacyState, SensorPayload, SubType,
};
pub use store::{MobilityStore, PointFilter, PointQuery};

/// Initializes the global tracing subscriber with the given env filter,
/// e.g. `"info"` or `"mobility_store=debug"`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .ok();
}
