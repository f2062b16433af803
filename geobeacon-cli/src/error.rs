//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use geobeacon::config::ConfigFileError;
use geobeacon::relay::CollectorError;
use geobeacon::service::ServiceError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to create the tracking service
    ServiceCreation(ServiceError),
    /// Failed to start tracking
    Start(ServiceError),
    /// Failed to deliver a report
    Delivery(CollectorError),
    /// Failed to wait for Ctrl-C
    Signal(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        if let CliError::Start(ServiceError::SourceSubscribe(_)) = self {
            eprintln!();
            eprintln!("Common issues:");
            eprintln!("  1. The UDP port is already in use by another process");
            eprintln!("  2. No GPS forwarder is configured to send to this host");
            eprintln!("  3. A firewall is blocking inbound UDP datagrams");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ServiceCreation(e) => write!(f, "Failed to create service: {}", e),
            CliError::Start(e) => write!(f, "Failed to start tracking: {}", e),
            CliError::Delivery(e) => write!(f, "Failed to deliver report: {}", e),
            CliError::Signal(e) => write!(f, "Failed to wait for Ctrl-C: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ServiceCreation(e) => Some(e),
            CliError::Start(e) => Some(e),
            CliError::Delivery(e) => Some(e),
            CliError::Signal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}
