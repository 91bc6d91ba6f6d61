//! Configuration module for SweepGen
//!
//! Provides configuration management including CLI arguments,
//! JSON config files, and the built-in sweep defaults.

mod settings;

pub use settings::*;
