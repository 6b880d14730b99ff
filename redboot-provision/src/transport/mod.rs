//! Telnet transport layer for the bootloader console.
//!
//! RedBoot exposes its console as a telnet service. This module owns the
//! TCP connection, answers option negotiation and translates line endings,
//! so the layers above only see console text.

pub mod config;
mod telnet;

pub use config::ConsoleConfig;
pub use telnet::{TelnetCodec, TelnetTransport};

use std::future::Future;

use crate::error::Result;

/// Byte-level console transport.
///
/// Implemented by [`TelnetTransport`]; tests substitute scripted doubles.
pub trait Transport: Send {
    /// Write `data` to the console, applying any wire encoding.
    fn write_all(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Read the next non-empty chunk of decoded console text.
    ///
    /// Returns `TransportError::Disconnected` when the peer closes.
    fn read_chunk(&mut self) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Close the connection.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
