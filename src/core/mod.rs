//! Core sweep generation module
//!
//! Provides the thread schedule, the invocation plan built from it,
//! and the writer that turns the plan into a shell script.

mod scheduler;
mod writer;

pub use scheduler::*;
pub use writer::*;
