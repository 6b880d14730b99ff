//! Command mode selected by the first CLI argument.

use std::fmt;

/// What a provisioning run does once the console is open.
///
/// Lowercase tokens expect the device to be counting down into autoboot
/// and break into the console first; uppercase tokens assume it is
/// already sitting at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// `f`: interrupt autoboot, then flash kernel and rootfs.
    FlashAutoboot,
    /// `F`: flash kernel and rootfs.
    FlashManualboot,
    /// `e`: interrupt autoboot, then load and exec the kernel.
    ExecAutoboot,
    /// `E`: load and exec the kernel.
    ExecManualboot,
    /// Any other token. The session is opened and closed, nothing is sent.
    NoOp(String),
}

impl Mode {
    /// Parse a mode token. Case-sensitive; unknown tokens become [`Mode::NoOp`].
    pub fn parse(token: &str) -> Self {
        match token {
            "f" => Self::FlashAutoboot,
            "F" => Self::FlashManualboot,
            "e" => Self::ExecAutoboot,
            "E" => Self::ExecManualboot,
            other => Self::NoOp(other.to_string()),
        }
    }

    /// The token this mode was parsed from.
    pub fn token(&self) -> &str {
        match self {
            Self::FlashAutoboot => "f",
            Self::FlashManualboot => "F",
            Self::ExecAutoboot => "e",
            Self::ExecManualboot => "E",
            Self::NoOp(token) => token,
        }
    }

    /// Whether the autoboot countdown is interrupted before the first command.
    pub fn sends_interrupt(&self) -> bool {
        matches!(self, Self::FlashAutoboot | Self::ExecAutoboot)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlashAutoboot => write!(f, "flash (autoboot)"),
            Self::FlashManualboot => write!(f, "flash (manual boot)"),
            Self::ExecAutoboot => write!(f, "exec (autoboot)"),
            Self::ExecManualboot => write!(f, "exec (manual boot)"),
            Self::NoOp(token) => write!(f, "no-op (unrecognized command '{}')", token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tokens() {
        assert_eq!(Mode::parse("f"), Mode::FlashAutoboot);
        assert_eq!(Mode::parse("F"), Mode::FlashManualboot);
        assert_eq!(Mode::parse("e"), Mode::ExecAutoboot);
        assert_eq!(Mode::parse("E"), Mode::ExecManualboot);
    }

    #[test]
    fn test_parse_unknown_token_is_noop() {
        assert_eq!(Mode::parse("x"), Mode::NoOp("x".to_string()));
        assert_eq!(Mode::parse("flash"), Mode::NoOp("flash".to_string()));
        assert_eq!(Mode::parse(""), Mode::NoOp(String::new()));
    }

    #[test]
    fn test_interrupt_only_for_lowercase() {
        for token in ["f", "e"] {
            assert!(Mode::parse(token).sends_interrupt(), "{}", token);
        }
        for token in ["F", "E", "x", "ff"] {
            assert!(!Mode::parse(token).sends_interrupt(), "{}", token);
        }
    }

    #[test]
    fn test_token_round_trip() {
        for token in ["f", "F", "e", "E", "zz"] {
            assert_eq!(Mode::parse(token).token(), token);
        }
    }
}
