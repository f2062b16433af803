//! Error types for position sources.

use thiserror::Error;

/// Errors that can occur when acquiring position data.
#[derive(Debug, Error)]
pub enum PositionError {
    /// Failed to bind the UDP socket.
    #[error("Failed to bind UDP socket on port {port}: {source}")]
    SocketBind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Coordinates outside the valid WGS84 range.
    #[error("Invalid coordinates ({lat}, {lon})")]
    InvalidCoordinates { lat: f64, lon: f64 },

    /// The provider could not produce a fix (no signal, backend error).
    #[error("Position fix unavailable: {0}")]
    FixUnavailable(String),

    /// The source cannot be subscribed to (capability missing or disabled).
    #[error("Position source unavailable: {0}")]
    Unavailable(String),

    /// The channel to the sample consumer has been closed.
    #[error("Channel closed")]
    ChannelClosed,
}
