//! Host analysis module
//!
//! Detects the local NUMA layout so a sweep plan can be checked
//! against the machine that will run it.

pub mod numa;

pub use numa::{NumaNode, NumaTopology, PlanWarning};
