//! Command steps, including ones that stop to ask a question.
//!
//! Some bootloader commands print a confirmation question before they do
//! anything (`fis init` asks "continue (y/n)?"). A step can carry an
//! [`InteractiveReply`]: the driver waits for the question, answers it, and
//! only then waits for the step's real terminator.

use regex::bytes::Regex;

use crate::channel::patterns::compile_multiline;

/// One command in a session's fixed sequence.
///
/// # Example
///
/// ```rust
/// use redboot_provision::driver::CommandStep;
///
/// let step = CommandStep::try_new("fis init -f", r"^RedBoot>")
///     .unwrap()
///     .try_with_reply(r"^.*continue \(y/n\)\?", "y")
///     .unwrap();
/// assert_eq!(step.command, "fis init -f");
/// assert!(step.reply.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct CommandStep {
    /// Text sent to the console, without line terminator.
    pub command: String,

    /// Pattern that ends the step (normally the bootloader prompt).
    pub expect: Regex,

    /// Question to answer before waiting for `expect`.
    pub reply: Option<InteractiveReply>,
}

/// A question that appears mid-step and the line sent to answer it.
#[derive(Debug, Clone)]
pub struct InteractiveReply {
    /// Pattern identifying the question.
    pub pattern: Regex,

    /// Line sent once the question is seen.
    pub input: String,
}

impl CommandStep {
    /// Create a step ending at an already-compiled pattern.
    pub fn new(command: impl Into<String>, expect: Regex) -> Self {
        Self {
            command: command.into(),
            expect,
            reply: None,
        }
    }

    /// Create a step, compiling `expect` in multi-line mode.
    pub fn try_new(command: impl Into<String>, expect: &str) -> Result<Self, regex::Error> {
        Ok(Self::new(command, compile_multiline(expect)?))
    }

    /// Answer `pattern` with `input` before waiting for the terminator.
    pub fn with_reply(mut self, pattern: Regex, input: impl Into<String>) -> Self {
        self.reply = Some(InteractiveReply {
            pattern,
            input: input.into(),
        });
        self
    }

    /// Like [`with_reply`](Self::with_reply), compiling `pattern` in multi-line mode.
    pub fn try_with_reply(
        self,
        pattern: &str,
        input: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        Ok(self.with_reply(compile_multiline(pattern)?, input))
    }
}
