//! Embassy async tasks
//!
//! The display loop itself runs from interrupts; these only support it.

pub mod deadline;
pub mod status;

pub use deadline::deadline_task;
pub use status::status_task;
