//! Core position sample type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::PositionError;

/// A single captured position.
///
/// Immutable once created. Produced by a [`PositionSource`], consumed by the
/// tracking service and handed to both the event bus and the delivery relay.
///
/// [`PositionSource`]: super::PositionSource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Latitude in decimal degrees (WGS84).
    pub latitude: f64,

    /// Longitude in decimal degrees (WGS84).
    pub longitude: f64,

    /// When the sample was captured.
    pub captured_at: DateTime<Utc>,
}

impl PositionSample {
    /// Create a sample stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::InvalidCoordinates`] when the coordinates
    /// fall outside the WGS84 range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, PositionError> {
        Self::at(latitude, longitude, Utc::now())
    }

    /// Create a sample with an explicit capture time.
    pub fn at(
        latitude: f64,
        longitude: f64,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, PositionError> {
        if !latitude.is_finite()
            || !longitude.is_finite()
            || latitude.abs() > 90.0
            || longitude.abs() > 180.0
        {
            return Err(PositionError::InvalidCoordinates {
                lat: latitude,
                lon: longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
            captured_at,
        })
    }
}
