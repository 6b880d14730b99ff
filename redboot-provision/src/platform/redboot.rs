//! RedBoot console definition.
//!
//! Prompt patterns, flash layout constants and command spellings for the
//! RedBoot bootloader console reached over telnet.

use std::time::Duration;

/// TCP port of the RedBoot network console.
pub const CONSOLE_PORT: u16 = 9000;

/// Single overall timeout for a console session.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(3600);

/// Ready prompt, at line start.
pub const PROMPT: &str = r"^RedBoot>";

/// Confirmation question printed by destructive FIS commands.
pub const CONFIRM_PROMPT: &str = r"^.*continue \(y/n\)\?";

/// Answer sent to [`CONFIRM_PROMPT`].
pub const CONFIRM_ANSWER: &str = "y";

/// ETX (Ctrl-C), aborts the autoboot countdown. Sent as a line so an
/// already idle console reprints its prompt.
pub const INTERRUPT: &str = "\u{3}";

/// Quiet period after the interrupt's prompt. The break and the newline
/// can each produce a prompt; the extra one must not end the first step.
pub const INTERRUPT_SETTLE: Duration = Duration::from_millis(300);

/// RAM address images are loaded to before being written to flash.
pub const LOAD_ADDRESS: u32 = 0x8005_0000;

/// Entry point recorded for the kernel partition.
pub const KERNEL_ENTRY: u32 = 0x8005_0100;

/// Entry point recorded for the rootfs partition.
pub const ROOTFS_ENTRY: u32 = 0x0000_0000;

pub const KERNEL_IMAGE_SUFFIX: &str = "_kernel.gz.sync";
pub const ROOTFS_IMAGE_SUFFIX: &str = "_rootfs_clean.iso.ulzma";

/// Suffix of the kernel image name used when booting without flashing.
pub const BOOT_KERNEL_SUFFIX: &str = "_kernel";

pub const KERNEL_PARTITION: &str = "kernel";
pub const ROOTFS_PARTITION: &str = "rootfs";

/// Output fragments RedBoot prints when a command fails.
pub const FAILURE_MARKERS: &[&str] = &["** Error", "Can't load", "Illegal command"];

/// `fis init -f`: wipe and re-create the flash image directory.
pub fn fis_init() -> String {
    "fis init -f".to_string()
}

/// `fis list`: print the flash partition table.
pub fn fis_list() -> String {
    "fis list".to_string()
}

/// Raw, verbose load of `file` to `address`.
pub fn load_raw(address: u32, file: &str) -> String {
    format!("load -r -v -b 0x{:08x} {}", address, file)
}

/// Commit the last loaded region as partition `name`.
pub fn fis_create(entry: u32, name: &str) -> String {
    format!("fis create -e 0x{:08x} {}", entry, name)
}

/// Load an image by name using RedBoot's default loader settings.
pub fn load(file: &str) -> String {
    format!("load {}", file)
}

/// Start the loaded image.
pub fn exec() -> String {
    "exec".to_string()
}
