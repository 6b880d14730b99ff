//! Response type for command step results.

use std::time::Duration;

/// Response from executing one [`CommandStep`](super::CommandStep).
#[derive(Debug, Clone)]
pub struct StepResponse {
    /// The command that was executed.
    pub command: String,

    /// Tail of what the console printed for this step, prompt included.
    ///
    /// At most the session's search depth; the full text is streamed to the
    /// caller's sink while the step runs.
    pub output: String,

    /// The prompt text that ended the step.
    pub prompt: String,

    /// Time taken to execute the step.
    pub elapsed: Duration,

    /// Failure marker found in the output, if any.
    pub failure_message: Option<String>,

    /// The console hung up instead of printing the prompt.
    pub console_closed: bool,
}

impl StepResponse {
    /// Create a new successful response.
    pub fn new(
        command: impl Into<String>,
        output: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            prompt: prompt.into(),
            elapsed,
            failure_message: None,
            console_closed: false,
        }
    }

    /// Create a response whose output contained a failure marker.
    pub fn failed(
        command: impl Into<String>,
        output: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
        failure_message: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            prompt: prompt.into(),
            elapsed,
            failure_message: Some(failure_message.into()),
            console_closed: false,
        }
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Check if the output contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.output.contains(pattern)
    }
}

impl std::fmt::Display for StepResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.output)
    }
}
