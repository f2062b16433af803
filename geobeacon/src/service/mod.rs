//! Tracking service - lifecycle, per-sample handling, control surface.
//!
//! [`LocationTracker`] is the facade wiring a position source, the delivery
//! relay, and the event bus together. `start(token)` / `stop()` flip the
//! lifecycle state synchronously; sample handling and delivery run on their
//! own tasks so a slow collector never delays capture.

mod config;
mod error;
mod tracker;

pub use config::{TrackerConfig, DEFAULT_SAMPLE_INTERVAL_MS};
pub use error::ServiceError;
pub use tracker::{LocationTracker, TrackerState};
