//! Telnet transport implementation over tokio streams.

use bytes::BytesMut;
use log::{debug, trace};
use memchr::memchr2;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use super::Transport;
use super::config::ConsoleConfig;
use crate::error::{Result, TransportError};

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

const CR: u8 = b'\r';
const LF: u8 = b'\n';
const NUL: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DecodeState {
    #[default]
    Data,
    /// A CR was seen; its meaning depends on the next byte.
    Cr,
    Iac,
    /// IAC followed by DO/DONT/WILL/WONT, waiting for the option byte.
    Negotiate(u8),
    Sub,
    SubIac,
}

/// Incremental telnet decoder and encoder.
///
/// The console peer only needs a dumb client: every option it offers is
/// refused (`DO` -> `WONT`, `WILL` -> `DONT`). Decoder state survives
/// across calls, so commands split between reads are handled.
#[derive(Debug, Default)]
pub struct TelnetCodec {
    state: DecodeState,
}

impl TelnetCodec {
    /// Create a decoder in the plain-data state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode received bytes.
    ///
    /// Console text is appended to `text` with `CR LF` folded to `LF` and
    /// `CR NUL` to `CR`. Negotiation answers that must be sent back to the
    /// peer are appended to `replies`.
    pub fn decode(&mut self, input: &[u8], text: &mut Vec<u8>, replies: &mut Vec<u8>) {
        let mut rest = input;

        while !rest.is_empty() {
            if self.state == DecodeState::Data {
                // Copy plain text in bulk up to the next byte that needs care
                match memchr2(IAC, CR, rest) {
                    Some(pos) => {
                        text.extend_from_slice(&rest[..pos]);
                        rest = &rest[pos..];
                    }
                    None => {
                        text.extend_from_slice(rest);
                        return;
                    }
                }
            }

            let byte = rest[0];
            rest = &rest[1..];

            self.state = match (self.state, byte) {
                (DecodeState::Data, IAC) => DecodeState::Iac,
                (DecodeState::Data, CR) => DecodeState::Cr,
                (DecodeState::Data, other) => {
                    text.push(other);
                    DecodeState::Data
                }

                (DecodeState::Cr, LF) => {
                    text.push(LF);
                    DecodeState::Data
                }
                (DecodeState::Cr, NUL) => {
                    text.push(CR);
                    DecodeState::Data
                }
                (DecodeState::Cr, CR) => {
                    text.push(CR);
                    DecodeState::Cr
                }
                (DecodeState::Cr, IAC) => {
                    text.push(CR);
                    DecodeState::Iac
                }
                (DecodeState::Cr, other) => {
                    text.push(CR);
                    text.push(other);
                    DecodeState::Data
                }

                (DecodeState::Iac, IAC) => {
                    text.push(IAC);
                    DecodeState::Data
                }
                (DecodeState::Iac, DO | DONT | WILL | WONT) => DecodeState::Negotiate(byte),
                (DecodeState::Iac, SB) => DecodeState::Sub,
                (DecodeState::Iac, command) => {
                    trace!("telnet: ignoring command {}", command);
                    DecodeState::Data
                }

                (DecodeState::Negotiate(verb), option) => {
                    match verb {
                        DO => replies.extend_from_slice(&[IAC, WONT, option]),
                        WILL => replies.extend_from_slice(&[IAC, DONT, option]),
                        _ => {}
                    }
                    DecodeState::Data
                }

                (DecodeState::Sub, IAC) => DecodeState::SubIac,
                (DecodeState::Sub, _) => DecodeState::Sub,
                (DecodeState::SubIac, SE) => DecodeState::Data,
                (DecodeState::SubIac, _) => DecodeState::Sub,
            };
        }
    }

    /// Encode console text for the wire: `LF` becomes `CR LF`, `IAC` is doubled.
    pub fn encode(data: &[u8], out: &mut Vec<u8>) {
        out.reserve(data.len() + 2);
        for &byte in data {
            match byte {
                IAC => out.extend_from_slice(&[IAC, IAC]),
                LF => out.extend_from_slice(&[CR, LF]),
                other => out.push(other),
            }
        }
    }
}

/// Telnet client transport over any async byte stream.
pub struct TelnetTransport<S> {
    stream: S,
    codec: TelnetCodec,
    read_buf: BytesMut,
}

impl TelnetTransport<TcpStream> {
    /// Connect to the console port, giving up at `deadline`.
    ///
    /// The same deadline then bounds the session, so connecting and driving
    /// the console together never exceed one session timeout.
    pub async fn connect(config: &ConsoleConfig, deadline: tokio::time::Instant) -> Result<Self> {
        let stream = tokio::time::timeout_at(
            deadline,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|source| TransportError::ConnectionFailed {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;

        stream.set_nodelay(true).map_err(TransportError::Io)?;
        debug!("connected to {}", config.socket_addr());

        Ok(Self::new(stream))
    }
}

impl<S> TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already-connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            codec: TelnetCodec::new(),
            read_buf: BytesMut::with_capacity(4096),
        }
    }
}

impl<S> Transport for TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut encoded = Vec::with_capacity(data.len() + 2);
        TelnetCodec::encode(data, &mut encoded);

        self.stream
            .write_all(&encoded)
            .await
            .map_err(TransportError::Io)?;
        self.stream.flush().await.map_err(TransportError::Io)?;
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<Vec<u8>> {
        loop {
            self.read_buf.clear();
            let n = self
                .stream
                .read_buf(&mut self.read_buf)
                .await
                .map_err(TransportError::Io)?;
            if n == 0 {
                return Err(TransportError::Disconnected.into());
            }

            let mut text = Vec::with_capacity(n);
            let mut replies = Vec::new();
            self.codec.decode(&self.read_buf, &mut text, &mut replies);

            if !replies.is_empty() {
                trace!("telnet: refusing options {:?}", replies);
                self.stream
                    .write_all(&replies)
                    .await
                    .map_err(TransportError::Io)?;
            }

            // A read made only of negotiation carries no console text
            if !text.is_empty() {
                return Ok(text);
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.stream.shutdown().await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => {
                debug!("telnet: peer already gone at close");
                Ok(())
            }
            Err(e) => Err(TransportError::Io(e).into()),
        }
    }
}
