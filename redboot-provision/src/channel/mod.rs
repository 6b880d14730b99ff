//! Channel layer for pattern matching and console text handling.
//!
//! This module sits between the telnet transport and the session driver,
//! turning raw reads into clean console text and searching it for prompts.

mod buffer;
mod console;
pub mod patterns;

pub use buffer::{AnsiStripper, PatternBuffer};
pub use console::ConsoleChannel;
