//! UDP position source - listener for GPS forwarder datagrams.
//!
//! Listens for UDP datagrams from a GPS forwarder (phone apps and simulators
//! that broadcast NMEA or XGPS sentences) and converts them to
//! [`PositionSample`]s.
//!
//! The subscriber's interval acts as a minimum spacing between emitted
//! samples: datagrams arriving faster than the interval are parsed but not
//! forwarded. Bind failures surface synchronously from `subscribe`.

use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::PositionError;
use super::nmea::parse_datagram;
use super::sample::PositionSample;
use super::source::{PositionSource, SourceHandle, Subscription, SAMPLE_CHANNEL_CAPACITY};

/// Maximum datagram size we expect from a forwarder.
const MAX_DATAGRAM_SIZE: usize = 1024;

/// Timeout for socket receive operations, so cancellation is noticed.
const RECV_TIMEOUT: Duration = Duration::from_millis(500);

/// Default UDP port for GPS forwarder apps.
pub const DEFAULT_UDP_PORT: u16 = 10110;

/// UDP listener source for GPS forwarder datagrams.
pub struct UdpGpsSource {
    port: u16,
}

impl UdpGpsSource {
    /// Create a source listening on the given port.
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    /// The configured port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for UdpGpsSource {
    fn default() -> Self {
        Self::new(DEFAULT_UDP_PORT)
    }
}

impl PositionSource for UdpGpsSource {
    fn subscribe(&self, interval: Duration) -> Result<Subscription, PositionError> {
        // Bind synchronously so capability failures surface from subscribe
        let socket = std::net::UdpSocket::bind(("0.0.0.0", self.port)).map_err(|source| {
            PositionError::SocketBind {
                port: self.port,
                source,
            }
        })?;
        socket
            .set_nonblocking(true)
            .map_err(|source| PositionError::SocketBind {
                port: self.port,
                source,
            })?;

        let (tx, rx) = mpsc::channel(SAMPLE_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let port = self.port;
        tokio::spawn(run_listener(socket, port, interval, tx, cancel.clone()));

        Ok(Subscription {
            samples: rx,
            handle: SourceHandle::new(cancel),
        })
    }
}

/// The UDP receive loop.
async fn run_listener(
    socket: std::net::UdpSocket,
    port: u16,
    min_interval: Duration,
    tx: mpsc::Sender<PositionSample>,
    cancel: CancellationToken,
) {
    let socket = match UdpSocket::from_std(socket) {
        Ok(socket) => socket,
        Err(e) => {
            warn!(port, error = %e, "Failed to register UDP socket with runtime");
            return;
        }
    };

    info!(port, "UDP position listener started");

    let mut buffer = [0u8; MAX_DATAGRAM_SIZE];
    let mut last_emit: Option<Instant> = None;
    let mut datagrams_received: u64 = 0;
    let mut samples_sent: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            debug!("UDP position listener cancelled");
            break;
        }
        if tx.is_closed() {
            debug!("Sample channel closed, stopping UDP listener");
            break;
        }

        let recv_result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = tokio::time::timeout(RECV_TIMEOUT, socket.recv(&mut buffer)) => result,
        };

        match recv_result {
            Ok(Ok(len)) => {
                datagrams_received += 1;
                if datagrams_received == 1 {
                    let preview = String::from_utf8_lossy(&buffer[..len.min(32)]).to_string();
                    info!(port, preview = %preview, "Received first forwarder datagram");
                }

                let Some(fix) = parse_datagram(&buffer[..len]) else {
                    if datagrams_received <= 5 {
                        let preview = String::from_utf8_lossy(&buffer[..len.min(50)]);
                        debug!(datagram = datagrams_received, preview = %preview, "Unparseable datagram");
                    }
                    continue;
                };

                // Throttle to the subscriber's cadence
                if let Some(last) = last_emit {
                    if last.elapsed() < min_interval {
                        continue;
                    }
                }

                let sample = match PositionSample::new(fix.latitude, fix.longitude) {
                    Ok(sample) => sample,
                    Err(e) => {
                        warn!(error = %e, "Forwarder datagram had invalid coordinates");
                        continue;
                    }
                };

                match tx.try_send(sample) {
                    Ok(()) => {
                        samples_sent += 1;
                        last_emit = Some(Instant::now());
                        if samples_sent == 1 {
                            info!(
                                lat = format!("{:.4}", fix.latitude),
                                lon = format!("{:.4}", fix.longitude),
                                "First position sample emitted"
                            );
                        }
                    }
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!("Sample channel full, dropping sample");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        debug!("Sample channel closed, stopping UDP listener");
                        break;
                    }
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "UDP receive error");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            Err(_) => {
                // Receive timeout - loop back to check cancellation
            }
        }
    }

    info!(
        datagrams_received,
        samples_sent, "UDP position listener stopped"
    );
}
