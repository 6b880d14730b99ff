//! Top-level provisioning run.
//!
//! Strict order: probe until reachable, connect, optional autoboot
//! interrupt, steps in sequence, close. The session is closed exactly once
//! whether the steps complete or fail.

mod builder;

pub use builder::ProvisionerBuilder;

use std::time::Duration;

use log::{info, warn};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::driver::{ConsoleSession, StepResponse};
use crate::error::{Error, Result};
use crate::platform::{Mode, SessionPlan};
use crate::reachability::{Prober, ReachabilityGate};
use crate::request::ProvisioningRequest;
use crate::transport::{ConsoleConfig, TelnetTransport, Transport};

/// A configured provisioning run for one request.
#[derive(Debug)]
pub struct Provisioner {
    request: ProvisioningRequest,
    console: ConsoleConfig,
    probe_interval: Duration,
    plan: SessionPlan,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub mode: Mode,

    /// Reachability probes issued before the target answered.
    pub probes: u64,

    /// One response per step, in order.
    pub steps: Vec<StepResponse>,
}

impl RunReport {
    /// Steps whose output contained a bootloader error message.
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepResponse> {
        self.steps.iter().filter(|s| !s.is_success())
    }
}

impl Provisioner {
    /// Start configuring a run for `request`.
    pub fn builder(request: ProvisioningRequest) -> ProvisionerBuilder {
        ProvisionerBuilder::new(request)
    }

    pub fn request(&self) -> &ProvisioningRequest {
        &self.request
    }

    pub fn console(&self) -> &ConsoleConfig {
        &self.console
    }

    pub fn probe_interval(&self) -> Duration {
        self.probe_interval
    }

    /// The command plan this run will execute.
    pub fn plan(&self) -> &SessionPlan {
        &self.plan
    }

    /// Run the whole procedure, echoing progress and console output to `out`.
    pub async fn run<P, O>(&self, prober: &mut P, out: &mut O) -> Result<RunReport>
    where
        P: Prober,
        O: AsyncWrite + Unpin + Send,
    {
        info!(
            "provisioning {} with '{}': {}",
            self.console.host, self.request.image_base_name, self.request.mode
        );

        let probes = ReachabilityGate::new(self.probe_interval)
            .wait(prober, &self.console.host, out)
            .await?;

        let banner = format!("\nstart console session {}\n", self.console.socket_addr());
        out.write_all(banner.as_bytes()).await.map_err(Error::Output)?;
        out.flush().await.map_err(Error::Output)?;

        let deadline = self.console.deadline_from_now();
        let transport = TelnetTransport::connect(&self.console, deadline).await?;
        let steps = run_session(&self.plan, &self.console, deadline, transport, out).await?;

        Ok(RunReport {
            mode: self.request.mode.clone(),
            probes,
            steps,
        })
    }
}

/// Drive `plan` over an already-connected transport, then close it.
///
/// Every wait gives up at `deadline`. The transport is closed exactly once
/// on every path. A step error takes precedence over a close error. If the
/// console hangs up after a step's output, the remaining steps are skipped
/// and the run still succeeds.
pub async fn run_session<T, O>(
    plan: &SessionPlan,
    config: &ConsoleConfig,
    deadline: tokio::time::Instant,
    transport: T,
    out: &mut O,
) -> Result<Vec<StepResponse>>
where
    T: Transport,
    O: AsyncWrite + Unpin + Send,
{
    let mut session = ConsoleSession::new(transport, plan.prompt.clone(), config, deadline);

    let outcome = drive(&mut session, plan, out).await;
    let closed = session.close().await;

    match (outcome, closed) {
        (Ok(steps), Ok(())) => Ok(steps),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!("closing session after failure also failed: {}", close_err);
            Err(e)
        }
    }
}

async fn drive<T, O>(
    session: &mut ConsoleSession<T>,
    plan: &SessionPlan,
    out: &mut O,
) -> Result<Vec<StepResponse>>
where
    T: Transport,
    O: AsyncWrite + Unpin + Send,
{
    if let Mode::NoOp(token) = &plan.mode {
        warn!("no command sequence for '{}'", token);
    }

    if plan.interrupt {
        session.interrupt(out).await?;
    }

    let total = plan.steps.len();
    let mut responses = Vec::with_capacity(total);
    for (i, step) in plan.steps.iter().enumerate() {
        info!("step {}/{}: {}", i + 1, total, step.command);
        let response = session.run_step(step, out).await?;
        let closed = response.console_closed;
        responses.push(response);

        if closed {
            if i + 1 < total {
                warn!(
                    "console closed after '{}', skipping {} remaining step(s)",
                    step.command,
                    total - i - 1
                );
            }
            break;
        }
    }

    Ok(responses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::testing::FakeConsole;

    fn plan(token: &str) -> SessionPlan {
        SessionPlan::build(&Mode::parse(token), "Fon_FON2201").unwrap()
    }

    fn config() -> ConsoleConfig {
        ConsoleConfig::new("192.0.2.1")
    }

    fn deadline() -> tokio::time::Instant {
        config().deadline_from_now()
    }

    #[tokio::test(start_paused = true)]
    async fn test_flash_runs_every_step_and_closes_once() {
        let console = FakeConsole::new();
        let log = console.log();
        let plan = plan("f");

        let steps = run_session(&plan, &config(), deadline(), console, &mut Vec::new())
            .await
            .unwrap();

        assert_eq!(steps.len(), 6);
        assert_eq!(log.interrupts(), 1);
        assert_eq!(
            log.lines(),
            vec![
                "fis init -f",
                "y",
                "load -r -v -b 0x80050000 Fon_FON2201_kernel.gz.sync",
                "fis create -e 0x80050100 kernel",
                "load -r -v -b 0x80050000 Fon_FON2201_rootfs_clean.iso.ulzma",
                "fis create -e 0x00000000 rootfs",
                "fis list",
            ]
        );
        assert_eq!(log.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_only_for_lowercase_modes() {
        for (token, expected) in [("f", 1), ("F", 0), ("e", 1), ("E", 0), ("z", 0)] {
            let console = FakeConsole::new();
            let log = console.log();
            run_session(&plan(token), &config(), deadline(), console, &mut Vec::new())
                .await
                .unwrap();
            assert_eq!(log.interrupts(), expected, "mode {}", token);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exec_modes_send_expected_triggers() {
        let console = FakeConsole::new();
        let log = console.log();
        run_session(&plan("e"), &config(), deadline(), console, &mut Vec::new())
            .await
            .unwrap();
        assert_eq!(log.lines(), vec!["load Fon_FON2201_kernel", "exec", "exec"]);

        let console = FakeConsole::new();
        let log = console.log();
        run_session(&plan("E"), &config(), deadline(), console, &mut Vec::new())
            .await
            .unwrap();
        assert_eq!(log.lines(), vec!["load Fon_FON2201_kernel", "exec"]);
    }

    #[tokio::test]
    async fn test_noop_mode_opens_and_closes_only() {
        let console = FakeConsole::new();
        let log = console.log();

        let steps = run_session(&plan("x"), &config(), deadline(), console, &mut Vec::new())
            .await
            .unwrap();

        assert!(steps.is_empty());
        assert!(log.lines().is_empty());
        assert_eq!(log.interrupts(), 0);
        assert_eq!(log.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_step_failure_closes_once() {
        let console = FakeConsole::new().silent_after("fis init");
        let log = console.log();

        let err = run_session(&plan("F"), &config(), deadline(), console, &mut Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Session(SessionError::StepTimeout { .. })
        ));
        assert_eq!(log.lines(), vec!["fis init -f"]);
        assert_eq!(log.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_step_failure_closes_once() {
        let console = FakeConsole::new().silent_after("fis list");
        let log = console.log();

        let err = run_session(&plan("F"), &config(), deadline(), console, &mut Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Session(SessionError::StepTimeout { ref command, .. }) if command == "fis list"
        ));
        assert_eq!(log.lines().len(), 7);
        assert_eq!(log.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_confirmation_stops_sequence() {
        let console = FakeConsole::new().without_confirmation();
        let log = console.log();

        let err = run_session(&plan("F"), &config(), deadline(), console, &mut Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Session(SessionError::StepTimeout { ref command, .. }) if command == "fis init -f"
        ));
        // No answer and no later step went out
        assert_eq!(log.lines(), vec!["fis init -f"]);
        assert_eq!(log.closes(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_reported_but_sequence_continues() {
        let console = FakeConsole::new();
        let log = console.log();
        let plan = SessionPlan::build(&Mode::ExecManualboot, "missing").unwrap();

        let steps = run_session(&plan, &config(), deadline(), console, &mut Vec::new())
            .await
            .unwrap();

        assert!(!steps[0].is_success());
        assert!(steps[1].is_success());
        assert_eq!(log.lines(), vec!["load missing_kernel", "exec"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_console_closing_on_exec_ends_run_cleanly() {
        let console = FakeConsole::new().hang_up_after("exec");
        let log = console.log();

        let steps = run_session(&plan("e"), &config(), deadline(), console, &mut Vec::new())
            .await
            .unwrap();

        assert_eq!(steps.len(), 2);
        assert!(steps[1].console_closed);
        assert!(steps[1].contains("Starting kernel"));
        // The second exec is never sent to a console that went away
        assert_eq!(log.lines(), vec!["load Fon_FON2201_kernel", "exec"]);
        assert_eq!(log.closes(), 1);
    }

    #[tokio::test]
    async fn test_console_closing_before_any_output_is_error() {
        let console = FakeConsole::new().hang_up_after("load").without_echo();
        let log = console.log();

        let err = run_session(&plan("E"), &config(), deadline(), console, &mut Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Transport(crate::error::TransportError::Disconnected)
        ));
        assert_eq!(log.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_waits_end_at_shared_deadline() {
        let console = FakeConsole::new().silent_after("fis init");
        let start = tokio::time::Instant::now();
        // Most of the budget already went on connecting
        let deadline = start + Duration::from_secs(5);

        let err = run_session(&plan("F"), &config(), deadline, console, &mut Vec::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Session(SessionError::StepTimeout { .. })
        ));
        assert_eq!(tokio::time::Instant::now(), deadline);
    }
}
