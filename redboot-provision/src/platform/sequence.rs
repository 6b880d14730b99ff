//! Mode to command-sequence table.

use regex::bytes::Regex;

use super::mode::Mode;
use super::redboot;
use crate::channel::patterns::compile_multiline;
use crate::driver::CommandStep;
use crate::error::{Result, SessionError};

/// Everything a session does for one mode, built before connecting.
#[derive(Debug, Clone)]
pub struct SessionPlan {
    /// Mode the plan was built for.
    pub mode: Mode,

    /// Send Ctrl-C and wait for the prompt before the first step.
    pub interrupt: bool,

    /// Bootloader ready prompt.
    pub prompt: Regex,

    /// Steps, run strictly in order.
    pub steps: Vec<CommandStep>,
}

impl SessionPlan {
    /// Build the plan for `mode`, naming images after `image_base_name`.
    pub fn build(mode: &Mode, image_base_name: &str) -> Result<Self> {
        let prompt = compile_multiline(redboot::PROMPT).map_err(SessionError::from)?;

        let steps = match mode {
            Mode::FlashAutoboot | Mode::FlashManualboot => {
                let confirm =
                    compile_multiline(redboot::CONFIRM_PROMPT).map_err(SessionError::from)?;
                flash_steps(image_base_name, &prompt, confirm)
            }
            Mode::ExecAutoboot => exec_steps(image_base_name, &prompt, 2),
            Mode::ExecManualboot => exec_steps(image_base_name, &prompt, 1),
            Mode::NoOp(_) => Vec::new(),
        };

        Ok(Self {
            mode: mode.clone(),
            interrupt: mode.sends_interrupt(),
            prompt,
            steps,
        })
    }

    /// The command text of each step, in order.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.command.as_str())
    }
}

/// Re-init FIS, then load and commit kernel and rootfs, then list.
fn flash_steps(image: &str, prompt: &Regex, confirm: Regex) -> Vec<CommandStep> {
    let kernel = format!("{}{}", image, redboot::KERNEL_IMAGE_SUFFIX);
    let rootfs = format!("{}{}", image, redboot::ROOTFS_IMAGE_SUFFIX);

    vec![
        CommandStep::new(redboot::fis_init(), prompt.clone())
            .with_reply(confirm, redboot::CONFIRM_ANSWER),
        CommandStep::new(redboot::load_raw(redboot::LOAD_ADDRESS, &kernel), prompt.clone()),
        CommandStep::new(
            redboot::fis_create(redboot::KERNEL_ENTRY, redboot::KERNEL_PARTITION),
            prompt.clone(),
        ),
        CommandStep::new(redboot::load_raw(redboot::LOAD_ADDRESS, &rootfs), prompt.clone()),
        CommandStep::new(
            redboot::fis_create(redboot::ROOTFS_ENTRY, redboot::ROOTFS_PARTITION),
            prompt.clone(),
        ),
        CommandStep::new(redboot::fis_list(), prompt.clone()),
    ]
}

/// Load the flashed kernel and start it `triggers` times.
///
/// `e` sends `exec` twice and `E` once. Kept as the tool has always done it.
fn exec_steps(image: &str, prompt: &Regex, triggers: usize) -> Vec<CommandStep> {
    let kernel = format!("{}{}", image, redboot::BOOT_KERNEL_SUFFIX);

    let mut steps = vec![CommandStep::new(redboot::load(&kernel), prompt.clone())];
    steps.extend((0..triggers).map(|_| CommandStep::new(redboot::exec(), prompt.clone())));
    steps
}
