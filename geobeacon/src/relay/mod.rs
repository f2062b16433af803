//! Delivery relay - forwards captured samples to the remote collector.
//!
//! # Architecture
//!
//! ```text
//! DeliveryRelay::dispatch(sample, token)
//!     │
//!     ├── CollectorClient trait → HttpCollectorClient (reqwest POST)
//!     │
//!     └── detached task per sample (single attempt, no retry)
//! ```
//!
//! Delivery failures never propagate to the sampling path; they degrade to
//! missing samples at the collector, visible in [`RelayStats`] and the log.

mod client;
mod relay;
mod stats;

pub use client::{
    CollectorClient, CollectorConfig, CollectorError, HttpCollectorClient, LocationReport,
};
pub use relay::DeliveryRelay;
pub use stats::{RelayStats, RelayStatsSnapshot};
