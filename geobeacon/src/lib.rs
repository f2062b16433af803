//! Geobeacon - background position sampling and relay.
//!
//! This library provides a tracking service that samples geographic
//! positions from a pluggable source and forwards each sample to a remote
//! HTTP collector, while publishing status and sample events on a broadcast
//! channel for any number of consumers.
//!
//! # High-Level API
//!
//! The [`service`] module provides the facade:
//!
//! ```ignore
//! use std::sync::Arc;
//! use geobeacon::position::UdpGpsSource;
//! use geobeacon::relay::CollectorConfig;
//! use geobeacon::service::{LocationTracker, TrackerConfig};
//!
//! let tracker = LocationTracker::with_http_collector(
//!     TrackerConfig::default(),
//!     Arc::new(UdpGpsSource::default()),
//!     &CollectorConfig::new("https://collector.example/points"),
//! )?;
//!
//! let mut events = tracker.subscribe();
//! tracker.start(Some("abc123".to_string()))?;
//! while let Ok(event) = events.recv().await {
//!     // Handle StatusChanged / SampleCaptured
//! }
//! ```

pub mod config;
pub mod events;
pub mod logging;
pub mod position;
pub mod relay;
pub mod service;

/// Version of the geobeacon library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
