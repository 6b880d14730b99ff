//! In-memory RedBoot console used by unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::{Result, TransportError};
use crate::platform::redboot;
use crate::transport::Transport;

#[derive(Debug, Default)]
struct LogInner {
    writes: Vec<Vec<u8>>,
    closes: usize,
}

/// Shared record of what a [`FakeConsole`] received.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConsoleLog {
    inner: Arc<Mutex<LogInner>>,
}

impl ConsoleLog {
    /// Lines sent, without terminators. Interrupts are left out.
    pub(crate) fn lines(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .writes
            .iter()
            .filter(|w| !is_interrupt(w))
            .map(|w| String::from_utf8_lossy(w).trim_end().to_string())
            .collect()
    }

    pub(crate) fn interrupts(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .writes
            .iter()
            .filter(|w| is_interrupt(w))
            .count()
    }

    pub(crate) fn closes(&self) -> usize {
        self.inner.lock().unwrap().closes
    }
}

fn is_interrupt(write: &[u8]) -> bool {
    write.starts_with(redboot::INTERRUPT.as_bytes())
}

/// Scripted console that answers like RedBoot.
///
/// Every line is echoed and followed by the prompt. `fis init -f` asks for
/// confirmation first; loads of files named `missing*` fail. Ctrl-C prints
/// `^C` and a prompt, and the newline after it prints a second prompt.
pub(crate) struct FakeConsole {
    log: ConsoleLog,
    pending: VecDeque<Vec<u8>>,
    confirm: bool,
    echo: bool,
    quiet_break: bool,
    silent_after: Option<String>,
    silent: bool,
    hang_up_after: Option<String>,
    hung_up: bool,
}

impl FakeConsole {
    pub(crate) fn new() -> Self {
        Self {
            log: ConsoleLog::default(),
            pending: VecDeque::new(),
            confirm: true,
            echo: true,
            quiet_break: false,
            silent_after: None,
            silent: false,
            hang_up_after: None,
            hung_up: false,
        }
    }

    /// Never print the `continue (y/n)?` question.
    pub(crate) fn without_confirmation(mut self) -> Self {
        self.confirm = false;
        self
    }

    /// Print nothing before hanging up.
    pub(crate) fn without_echo(mut self) -> Self {
        self.echo = false;
        self
    }

    /// Ignore a bare Ctrl-C; only the newline after it prints a prompt.
    pub(crate) fn quiet_break(mut self) -> Self {
        self.quiet_break = true;
        self
    }

    /// Stop answering once a write starting with `prefix` arrives.
    pub(crate) fn silent_after(mut self, prefix: &str) -> Self {
        self.silent_after = Some(prefix.to_string());
        self
    }

    /// Close the connection after answering a write starting with `prefix`,
    /// the way `exec` hands the console to the kernel.
    pub(crate) fn hang_up_after(mut self, prefix: &str) -> Self {
        self.hang_up_after = Some(prefix.to_string());
        self
    }

    pub(crate) fn log(&self) -> ConsoleLog {
        self.log.clone()
    }

    fn answer(&self, line: &str) -> String {
        match line {
            "fis init -f" if self.confirm => {
                format!("{line}\nAbout to initialize [format] FLASH image system - continue (y/n)? ")
            }
            "y" => "y\n*** Initialize FLASH Image System\n    Warning: device contents not erased, some blocks may not be usable\n... Unlock from 0xa87e0000-0xa87f0000: .\nRedBoot> ".to_string(),
            _ if line.starts_with("load") && line.contains("missing") => {
                format!("{line}\nCan't load '{line}': file not found\nRedBoot> ")
            }
            _ => format!("{line}\nok\nRedBoot> "),
        }
    }
}

impl Transport for FakeConsole {
    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.log.inner.lock().unwrap().writes.push(data.to_vec());

        let text = String::from_utf8_lossy(data).trim_end().to_string();
        if let Some(prefix) = &self.silent_after {
            if text.starts_with(prefix.as_str()) {
                self.silent = true;
            }
        }
        if self.silent || self.hung_up {
            return Ok(());
        }

        if let Some(prefix) = &self.hang_up_after {
            if text.starts_with(prefix.as_str()) {
                if self.echo {
                    self.pending
                        .push_back(format!("{text}\nStarting kernel ...\n").into_bytes());
                }
                self.hung_up = true;
                return Ok(());
            }
        }

        if is_interrupt(data) {
            if !self.quiet_break {
                self.pending.push_back(b"^C\nRedBoot> ".to_vec());
            }
            if data.ends_with(b"\n") {
                self.pending.push_back(b"\nRedBoot> ".to_vec());
            }
        } else {
            self.pending.push_back(self.answer(&text).into_bytes());
        }
        Ok(())
    }

    async fn read_chunk(&mut self) -> Result<Vec<u8>> {
        match self.pending.pop_front() {
            Some(chunk) => Ok(chunk),
            None if self.hung_up => Err(TransportError::Disconnected.into()),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.log.inner.lock().unwrap().closes += 1;
        Ok(())
    }
}
