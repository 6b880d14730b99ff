//! Reachability gate: block until the target answers.
//!
//! The device only brings its network up while RedBoot counts down, so the
//! tool polls at a fixed cadence with no attempt cap and prints a dot per
//! miss. The operator stops it with Ctrl-C if the device never shows up.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, trace};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::process::Command;

use crate::error::{Error, ProbeError, Result};

/// A single reachability check.
pub trait Prober: Send {
    /// Return `Ok(true)` if `host` answered.
    ///
    /// `Err` means the probe itself could not run, not that the host is down.
    fn probe(&mut self, host: &str) -> impl Future<Output = Result<bool>> + Send;
}

/// Probe with one ICMP echo through the system `ping` binary.
#[derive(Debug, Clone)]
pub struct PingProber {
    program: String,
    wait: Duration,
}

impl PingProber {
    /// Use `program` instead of `ping` from `PATH`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for PingProber {
    fn default() -> Self {
        Self {
            program: "ping".to_string(),
            wait: Duration::from_secs(1),
        }
    }
}

impl Prober for PingProber {
    async fn probe(&mut self, host: &str) -> Result<bool> {
        let wait = self.wait.as_secs().max(1).to_string();

        let status = Command::new(&self.program)
            .args(["-c", "1", "-W", wait.as_str(), host])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| ProbeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        trace!("{} {} -> {}", self.program, host, status);
        Ok(status.success())
    }
}

/// Polls a [`Prober`] until the target answers.
#[derive(Debug, Clone)]
pub struct ReachabilityGate {
    interval: Duration,
}

impl ReachabilityGate {
    /// Create a gate probing every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Block until `host` answers. Returns the number of probes issued.
    ///
    /// After each miss the gate sleeps one interval and writes `.` to `out`.
    pub async fn wait<P, O>(&self, prober: &mut P, host: &str, out: &mut O) -> Result<u64>
    where
        P: Prober,
        O: AsyncWrite + Unpin + Send,
    {
        let mut probes = 0u64;
        loop {
            probes += 1;
            if prober.probe(host).await? {
                debug!("{} reachable after {} probe(s)", host, probes);
                return Ok(probes);
            }

            tokio::time::sleep(self.interval).await;
            out.write_all(b".").await.map_err(Error::Output)?;
            out.flush().await.map_err(Error::Output)?;
        }
    }
}

impl Default for ReachabilityGate {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fails `failures` times, then succeeds.
    struct FlakyProber {
        failures: u32,
        calls: u32,
    }

    impl Prober for FlakyProber {
        async fn probe(&mut self, _host: &str) -> Result<bool> {
            self.calls += 1;
            Ok(self.calls > self.failures)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_probes_until_first_success() {
        let gate = ReachabilityGate::new(Duration::from_secs(1));
        let mut prober = FlakyProber {
            failures: 4,
            calls: 0,
        };
        let mut out = Vec::new();
        let start = tokio::time::Instant::now();

        let probes = gate.wait(&mut prober, "192.0.2.1", &mut out).await.unwrap();

        assert_eq!(probes, 5);
        assert_eq!(prober.calls, 5);
        assert_eq!(out, b"....");
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_sleeps_never() {
        let gate = ReachabilityGate::default();
        let mut prober = FlakyProber {
            failures: 0,
            calls: 0,
        };
        let mut out = Vec::new();
        let start = tokio::time::Instant::now();

        assert_eq!(gate.wait(&mut prober, "host", &mut out).await.unwrap(), 1);
        assert!(out.is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_missing_ping_binary_is_error() {
        let mut prober = PingProber::default().with_program("/nonexistent/redboot-ping");
        let err = prober.probe("127.0.0.1").await.unwrap_err();
        assert!(matches!(err, Error::Probe(ProbeError::Spawn { .. })));
    }
}
