//! Console channel: line-oriented writes and cleaned reads over a transport.

use log::trace;

use super::buffer::AnsiStripper;
use crate::error::Result;
use crate::transport::Transport;

/// High-level console channel for a bootloader session.
///
/// Wraps a [`Transport`] and hands the layers above text with escape
/// sequences removed.
pub struct ConsoleChannel<T> {
    transport: T,
    ansi: AnsiStripper,
}

impl<T: Transport> ConsoleChannel<T> {
    /// Create a channel over an open transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            ansi: AnsiStripper::new(),
        }
    }

    /// Send `line` followed by a line terminator.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        trace!("send: {:?}", line);
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.transport.write_all(&data).await
    }

    /// Send raw bytes with no terminator.
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        trace!("send raw: {:?}", data);
        self.transport.write_all(data).await
    }

    /// Read the next chunk of console text.
    pub async fn read_chunk(&mut self) -> Result<Vec<u8>> {
        loop {
            let raw = self.transport.read_chunk().await?;
            let text = self.ansi.strip(&raw);
            if !text.is_empty() {
                return Ok(text);
            }
        }
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }
}
