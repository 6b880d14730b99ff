//! Streaming step output with sliding-window pattern detection.
//!
//! Flash loads run for minutes, so a step's output is handed to the caller
//! chunk by chunk as it arrives instead of after the prompt returns. Only a
//! `search_depth` window is kept for pattern and failure detection.
//! `StepStream` also tracks the session deadline: the wait for any pattern
//! fails once the overall session timeout has passed.

use std::time::{Duration, Instant};

use log::{debug, trace};
use regex::bytes::Regex;

use super::response::StepResponse;
use crate::channel::patterns::first_marker;
use crate::channel::{ConsoleChannel, PatternBuffer};
use crate::error::{Error, Result, SessionError, TransportError};
use crate::transport::Transport;

/// Real-time streaming handle for a single step's output.
///
/// The command must already have been sent. Call
/// [`next_chunk`](Self::next_chunk) until it returns `None`, optionally
/// [`respond`](Self::respond) to a question and drain again, then
/// [`into_response`](Self::into_response).
pub struct StepStream<'a, T> {
    channel: &'a mut ConsoleChannel<T>,
    command: String,
    pattern: Regex,
    deadline: tokio::time::Instant,
    timeout: Duration,
    window: PatternBuffer,
    failure_markers: &'a [&'a str],
    failure_message: Option<String>,
    received: usize,
    finished: bool,
    disconnected: bool,
    start: Instant,
    prompt: String,
}

impl<'a, T: Transport> StepStream<'a, T> {
    /// Create a stream waiting for `pattern`.
    pub(crate) fn new(
        channel: &'a mut ConsoleChannel<T>,
        command: impl Into<String>,
        pattern: Regex,
        deadline: tokio::time::Instant,
        timeout: Duration,
        search_depth: usize,
    ) -> Self {
        Self {
            channel,
            command: command.into(),
            pattern,
            deadline,
            timeout,
            window: PatternBuffer::new(search_depth),
            failure_markers: &[],
            failure_message: None,
            received: 0,
            finished: false,
            disconnected: false,
            start: Instant::now(),
            prompt: String::new(),
        }
    }

    /// Watch the output for these error messages.
    pub(crate) fn with_failure_markers(mut self, markers: &'a [&'a str]) -> Self {
        self.failure_markers = markers;
        self
    }

    /// Get the next chunk of output, or `None` once the pattern has matched.
    ///
    /// The chunk that completes the match is still returned; the following
    /// call returns `None`. If the console hangs up after printing something
    /// for this step, the step ends there instead of failing: RedBoot's
    /// `exec` hands the console to the kernel without another prompt.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.finished {
            return Ok(None);
        }

        let chunk = match tokio::time::timeout_at(self.deadline, self.channel.read_chunk()).await {
            Ok(Ok(chunk)) => chunk,
            Ok(Err(Error::Transport(TransportError::Disconnected))) if self.received > 0 => {
                debug!(
                    "stream: console closed during {:?} after {} bytes",
                    self.command, self.received
                );
                self.finished = true;
                self.disconnected = true;
                return Ok(None);
            }
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(SessionError::StepTimeout {
                    command: self.command.clone(),
                    pattern: self.pattern.as_str().to_string(),
                    timeout: self.timeout,
                }
                .into());
            }
        };

        self.received += chunk.len();
        self.window.extend(&chunk);
        self.check_failure();

        if let Some(m) = self.window.search_tail(&self.pattern) {
            self.prompt = String::from_utf8_lossy(m.as_bytes()).trim().to_string();
            self.finished = true;
        }

        trace!(
            "stream chunk: {} bytes, window: {} bytes",
            chunk.len(),
            self.window.len()
        );

        Ok(Some(chunk))
    }

    /// Record the first failure marker visible in the window.
    ///
    /// The whole window is searched so a marker split between chunks is
    /// still found.
    fn check_failure(&mut self) {
        if self.failure_message.is_some() || self.failure_markers.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(self.window.as_slice());
        if let Some(marker) = first_marker(&text, self.failure_markers) {
            debug!("stream: failure marker matched: {:?}", marker);
            self.failure_message = Some(marker.to_string());
        }
    }

    /// Answer the question just matched and start waiting for `next`.
    ///
    /// Output received before the answer is excluded from the next search.
    pub async fn respond(&mut self, input: &str, next: Regex) -> Result<()> {
        debug!("stream: answering {:?} for {:?}", input, self.command);
        self.window.mark();
        self.channel.send_line(input).await?;
        self.pattern = next;
        self.finished = false;
        self.prompt.clear();
        Ok(())
    }

    /// Whether the step ended because the console hung up.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    /// Consume the stream and build a [`StepResponse`].
    ///
    /// The response carries only the last `search_depth` bytes of output;
    /// the full text went out through [`next_chunk`](Self::next_chunk).
    ///
    /// # Errors
    ///
    /// Returns an error if the stream was not finished (pattern not yet seen).
    pub fn into_response(mut self) -> Result<StepResponse> {
        if !self.finished {
            return Err(SessionError::StepTimeout {
                command: std::mem::take(&mut self.command),
                pattern: self.pattern.as_str().to_string(),
                timeout: self.timeout,
            }
            .into());
        }

        let elapsed = self.start.elapsed();
        let output = String::from_utf8_lossy(&self.window.take()).to_string();
        let command = std::mem::take(&mut self.command);
        let prompt = std::mem::take(&mut self.prompt);

        debug!("stream: {:?} completed in {:?}", command, elapsed);

        let mut response = match self.failure_message.take() {
            Some(marker) => StepResponse::failed(command, output, prompt, elapsed, marker),
            None => StepResponse::new(command, output, prompt, elapsed),
        };
        response.console_closed = self.disconnected;
        Ok(response)
    }
}

impl<T> Drop for StepStream<'_, T> {
    fn drop(&mut self) {
        if !self.finished && !self.command.is_empty() {
            debug!(
                "StepStream for {:?} dropped before {:?} was seen",
                self.command,
                self.pattern.as_str()
            );
        }
    }
}
