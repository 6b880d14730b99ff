//! Console session driver.

use std::time::Duration;

use log::{debug, warn};
use regex::bytes::Regex;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::response::StepResponse;
use super::step::CommandStep;
use super::stream::StepStream;
use crate::channel::ConsoleChannel;
use crate::error::{Error, Result, SessionError, TransportError};
use crate::platform::redboot;
use crate::transport::{ConsoleConfig, Transport};

/// An open bootloader console session.
///
/// Owns the transport exclusively. Every wait is bounded by one deadline
/// fixed before the connection was opened, not by a per-step timeout.
/// [`close`](Self::close) releases the transport; later calls are no-ops.
pub struct ConsoleSession<T: Transport> {
    /// Console channel (None once closed).
    channel: Option<ConsoleChannel<T>>,

    /// Bootloader ready prompt.
    prompt: Regex,

    deadline: tokio::time::Instant,

    /// Overall session timeout, kept for error reporting.
    timeout: Duration,

    search_depth: usize,

    /// Set once the console has hung up on us.
    hung_up: bool,
}

impl<T: Transport> ConsoleSession<T> {
    /// Start a session over a connected transport.
    ///
    /// `deadline` bounds every wait in the session; see
    /// [`ConsoleConfig::deadline_from_now`].
    pub fn new(
        transport: T,
        prompt: Regex,
        config: &ConsoleConfig,
        deadline: tokio::time::Instant,
    ) -> Self {
        Self {
            channel: Some(ConsoleChannel::new(transport)),
            prompt,
            deadline,
            timeout: config.timeout,
            search_depth: config.search_depth,
            hung_up: false,
        }
    }

    /// Check if the session has not been closed yet.
    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    /// Whether the console closed the connection during a step.
    pub fn is_hung_up(&self) -> bool {
        self.hung_up
    }

    /// Break into the console with Ctrl-C, then wait for the prompt.
    ///
    /// Waiting here keeps the prompt printed in answer to the break from
    /// ending the first real step early. Output arriving within
    /// [`redboot::INTERRUPT_SETTLE`] of that prompt is echoed and discarded.
    pub async fn interrupt<O>(&mut self, out: &mut O) -> Result<()>
    where
        O: AsyncWrite + Unpin + Send,
    {
        let channel = self.channel.as_mut().ok_or(SessionError::NotOpen)?;

        debug!("sending autoboot interrupt");
        channel.send_line(redboot::INTERRUPT).await?;

        let mut stream = StepStream::new(
            channel,
            "^C",
            self.prompt.clone(),
            self.deadline,
            self.timeout,
            self.search_depth,
        );

        match drain(&mut stream, out).await {
            Err(Error::Session(SessionError::StepTimeout {
                pattern, timeout, ..
            })) => return Err(SessionError::PromptTimeout { pattern, timeout }.into()),
            Err(e) => return Err(e),
            Ok(()) if stream.is_disconnected() => {
                self.hung_up = true;
                return Err(TransportError::Disconnected.into());
            }
            Ok(()) => {}
        }
        drop(stream);

        self.settle(out).await
    }

    /// Echo output until the console has been quiet for the settle period.
    async fn settle<O>(&mut self, out: &mut O) -> Result<()>
    where
        O: AsyncWrite + Unpin + Send,
    {
        let channel = self.channel.as_mut().ok_or(SessionError::NotOpen)?;

        loop {
            let quiet_until =
                (tokio::time::Instant::now() + redboot::INTERRUPT_SETTLE).min(self.deadline);
            match tokio::time::timeout_at(quiet_until, channel.read_chunk()).await {
                Ok(chunk) => {
                    let chunk = chunk?;
                    out.write_all(&chunk).await.map_err(Error::Output)?;
                    out.flush().await.map_err(Error::Output)?;
                }
                Err(_) => return Ok(()),
            }
        }
    }

    /// Send one step and stream its output to `out` until it completes.
    ///
    /// A console that hangs up after printing output for the step ends the
    /// step normally with [`StepResponse::console_closed`] set.
    pub async fn run_step<O>(&mut self, step: &CommandStep, out: &mut O) -> Result<StepResponse>
    where
        O: AsyncWrite + Unpin + Send,
    {
        if self.hung_up {
            return Err(TransportError::Disconnected.into());
        }
        let channel = self.channel.as_mut().ok_or(SessionError::NotOpen)?;

        debug!("step: {}", step.command);
        channel.send_line(&step.command).await?;

        let first = match &step.reply {
            Some(reply) => reply.pattern.clone(),
            None => step.expect.clone(),
        };

        let mut stream = StepStream::new(
            channel,
            step.command.as_str(),
            first,
            self.deadline,
            self.timeout,
            self.search_depth,
        )
        .with_failure_markers(redboot::FAILURE_MARKERS);
        drain(&mut stream, out).await?;

        if let Some(reply) = &step.reply {
            if !stream.is_disconnected() {
                stream.respond(&reply.input, step.expect.clone()).await?;
                drain(&mut stream, out).await?;
            }
        }

        let response = stream.into_response()?;
        if let Some(marker) = &response.failure_message {
            warn!("step '{}' reported '{}'", response.command, marker);
        }
        if response.console_closed {
            debug!("console closed after '{}'", response.command);
            self.hung_up = true;
        }

        Ok(response)
    }

    /// Close the session. Only the first call reaches the transport.
    pub async fn close(&mut self) -> Result<()> {
        match self.channel.take() {
            Some(mut channel) => {
                debug!("closing console session");
                channel.close().await
            }
            None => Ok(()),
        }
    }
}

impl<T: Transport> Drop for ConsoleSession<T> {
    fn drop(&mut self) {
        if self.channel.is_some() {
            warn!("console session dropped without close()");
        }
    }
}

/// Forward every chunk of `stream` to `out` until its pattern matches.
async fn drain<T, O>(stream: &mut StepStream<'_, T>, out: &mut O) -> Result<()>
where
    T: Transport,
    O: AsyncWrite + Unpin + Send,
{
    while let Some(chunk) = stream.next_chunk().await? {
        out.write_all(&chunk).await.map_err(Error::Output)?;
        out.flush().await.map_err(Error::Output)?;
    }
    Ok(())
}
