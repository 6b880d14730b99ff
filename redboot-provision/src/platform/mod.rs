//! RedBoot platform definition and per-mode command plans.
//!
//! This module holds everything specific to the bootloader being driven:
//! prompt patterns, flash layout, command spellings and the table mapping
//! each [`Mode`] to its fixed step sequence.

mod mode;
pub mod redboot;
mod sequence;

pub use mode::Mode;
pub use sequence::SessionPlan;
