//! Invocation parsing.

use log::warn;

use crate::error::UsageError;
use crate::platform::Mode;

/// Usage text printed on a malformed invocation.
pub const USAGE: &str = "\
Usage: provision <command> <target ip address> <build name>
  f = flash, interrupting autoboot     F = flash, device already at prompt
  e = exec,  interrupting autoboot     E = exec,  device already at prompt
example: provision f 192.168.1.1 Fon_FON2201
";

/// What one run of the tool should do. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningRequest {
    pub mode: Mode,
    pub target_address: String,
    pub image_base_name: String,
}

impl ProvisioningRequest {
    /// Build a request from positional arguments (program name excluded).
    ///
    /// Exactly three are required: mode token, target address, image base
    /// name. Unknown mode tokens are accepted as [`Mode::NoOp`].
    pub fn from_args<I, S>(args: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();

        let [token, target_address, image_base_name]: [String; 3] = args
            .try_into()
            .map_err(|args: Vec<String>| UsageError::WrongArgumentCount { given: args.len() })?;

        let mode = Mode::parse(&token);
        if let Mode::NoOp(token) = &mode {
            warn!("unrecognized command '{}': session will open and close without commands", token);
        }

        Ok(Self {
            mode,
            target_address,
            image_base_name,
        })
    }
}
