//! Tracking service error types.

use thiserror::Error;

use crate::position::PositionError;
use crate::relay::CollectorError;

/// Errors that can occur when operating the tracking service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The position source could not be subscribed to. The service stays
    /// inactive and no status event is published.
    #[error("Failed to start position sampling: {0}")]
    SourceSubscribe(#[from] PositionError),

    /// The collector client could not be constructed.
    #[error("Failed to create collector client: {0}")]
    Collector(#[from] CollectorError),
}
