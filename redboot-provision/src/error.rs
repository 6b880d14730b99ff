//! Error types for redboot-provision.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for provisioning runs.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed invocation
    #[error("Usage error: {0}")]
    Usage(#[from] UsageError),

    /// Reachability probe could not be executed
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    /// TCP/telnet transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Console session errors (prompt detection, step execution)
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Writing progress or console echo to the operator failed
    #[error("Failed to write console output: {0}")]
    Output(#[source] io::Error),
}

/// Invocation errors. Nothing is executed when one of these is raised.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UsageError {
    /// Exactly three positional arguments are required.
    #[error("expected 3 arguments (command, target address, build name), got {given}")]
    WrongArgumentCount { given: usize },
}

/// Reachability probe errors.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The probe program could not be started
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Transport layer errors (TCP connection, telnet stream).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Connection was closed by the peer
    #[error("Connection disconnected")]
    Disconnected,

    /// Connect did not complete in time
    #[error("Connect timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Console session errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Session already closed
    #[error("Session not open")]
    NotOpen,

    /// The bootloader prompt never appeared
    #[error("Prompt '{pattern}' not seen within {timeout:?}")]
    PromptTimeout { pattern: String, timeout: Duration },

    /// A step's expected pattern never appeared before the session deadline
    #[error("Step '{command}' timed out waiting for '{pattern}' (session timeout {timeout:?})")]
    StepTimeout {
        command: String,
        pattern: String,
        timeout: Duration,
    },

    /// Invalid session configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type alias using redboot-provision's Error.
pub type Result<T> = std::result::Result<T, Error>;
