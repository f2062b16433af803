//! Position sources - abstractions over periodic coordinate acquisition.
//!
//! A [`PositionSource`] yields [`PositionSample`]s at a best-effort cadence
//! once subscribed. Two concrete sources ship with the crate:
//!
//! - [`UdpGpsSource`] - listens for GPS forwarder datagrams (NMEA/XGPS) on a
//!   UDP socket, for hosts fed by a phone or simulator
//! - [`PolledSource`] - drives any pull-based [`FixProvider`] on an interval
//!   loop, for embedders with their own fix acquisition
//!
//! # Architecture
//!
//! ```text
//! PositionSource::subscribe(interval)
//!     │
//!     ├── producer task (poll loop or UDP listener)
//!     │       │
//!     │       └── mpsc::Sender<PositionSample>
//!     │
//!     └── Subscription { samples, handle }
//!             │
//!             └── SourceHandle::cancel() stops the producer
//! ```
//!
//! Producers stop on cancellation or when the consumer drops the channel.
//! Samples already queued when a producer stops may still be drained.

mod error;
mod nmea;
mod poller;
mod sample;
mod source;
mod udp;

pub use error::PositionError;
pub use poller::{FixProvider, PolledSource, PositionFix};
pub use sample::PositionSample;
pub use source::{PositionSource, SourceHandle, Subscription};
pub use udp::{UdpGpsSource, DEFAULT_UDP_PORT};
