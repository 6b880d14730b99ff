//! Builder for configuring a provisioning run.

use std::time::Duration;

use super::Provisioner;
use crate::error::{Result, SessionError};
use crate::platform::SessionPlan;
use crate::request::ProvisioningRequest;
use crate::transport::ConsoleConfig;

/// Builder for constructing a [`Provisioner`].
///
/// Defaults match the RedBoot network console: port 9000, one hour of
/// overall session time, one probe per second.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use redboot_provision::{Provisioner, ProvisioningRequest};
///
/// # fn example() -> Result<(), redboot_provision::Error> {
/// let request = ProvisioningRequest::from_args(["F", "192.168.1.1", "Fon_FON2201"])?;
/// let provisioner = Provisioner::builder(request)
///     .timeout(Duration::from_secs(600))
///     .build()?;
/// assert_eq!(provisioner.plan().steps.len(), 6);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct ProvisionerBuilder {
    request: ProvisioningRequest,
    console: ConsoleConfig,
    probe_interval: Duration,
}

impl ProvisionerBuilder {
    pub(super) fn new(request: ProvisioningRequest) -> Self {
        let console = ConsoleConfig::new(request.target_address.clone());
        Self {
            request,
            console,
            probe_interval: Duration::from_secs(1),
        }
    }

    /// Set the console port (default: 9000).
    pub fn port(mut self, port: u16) -> Self {
        self.console.port = port;
        self
    }

    /// Set the overall session timeout (default: 3600s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.console.timeout = timeout;
        self
    }

    /// Set the delay between reachability probes (default: 1s).
    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval;
        self
    }

    /// Set how many trailing bytes are searched for prompts (default: 1000).
    pub fn search_depth(mut self, depth: usize) -> Self {
        self.console.search_depth = depth;
        self
    }

    /// Validate the settings and build the command plan.
    pub fn build(self) -> Result<Provisioner> {
        if self.console.timeout.is_zero() {
            return Err(SessionError::InvalidConfig {
                message: "session timeout must be non-zero".to_string(),
            }
            .into());
        }
        if self.console.search_depth == 0 {
            return Err(SessionError::InvalidConfig {
                message: "search depth must be non-zero".to_string(),
            }
            .into());
        }

        let plan = SessionPlan::build(&self.request.mode, &self.request.image_base_name)?;

        Ok(Provisioner {
            request: self.request,
            console: self.console,
            probe_interval: self.probe_interval,
            plan,
        })
    }
}
