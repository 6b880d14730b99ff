//! Session driver for the bootloader console.
//!
//! The driver layer sends command steps, answers interactive questions
//! and streams output back to the operator while waiting for the prompt.

mod response;
mod session;
mod step;
mod stream;

pub use response::StepResponse;
pub use session::ConsoleSession;
pub use step::{CommandStep, InteractiveReply};
pub use stream::StepStream;
