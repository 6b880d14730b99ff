//! # redboot-provision
//!
//! Flashes or boots firmware on a RedBoot device through its network
//! console.
//!
//! A run waits until the target answers pings, opens the telnet console on
//! port 9000, optionally breaks into the autoboot countdown with Ctrl-C,
//! drives a fixed command sequence for the chosen mode while streaming all
//! console output, and closes the session.
//!
//! ## Modes
//!
//! | token | action | interrupts autoboot |
//! |-------|--------|---------------------|
//! | `f`   | flash kernel + rootfs | yes |
//! | `F`   | flash kernel + rootfs | no  |
//! | `e`   | load kernel, `exec` twice | yes |
//! | `E`   | load kernel, `exec` once  | no  |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use redboot_provision::{PingProber, Provisioner, ProvisioningRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), redboot_provision::Error> {
//!     let request = ProvisioningRequest::from_args(["f", "192.168.1.1", "Fon_FON2201"])?;
//!     let provisioner = Provisioner::builder(request).build()?;
//!
//!     let report = provisioner
//!         .run(&mut PingProber::default(), &mut tokio::io::stdout())
//!         .await?;
//!     println!("{} steps", report.steps.len());
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod platform;
pub mod reachability;
pub mod request;
pub mod runner;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use driver::{CommandStep, ConsoleSession, StepResponse};
pub use error::Error;
pub use platform::{Mode, SessionPlan};
pub use reachability::{PingProber, Prober, ReachabilityGate};
pub use request::ProvisioningRequest;
pub use runner::{Provisioner, ProvisionerBuilder, RunReport, run_session};
pub use transport::{ConsoleConfig, TelnetTransport, Transport};
