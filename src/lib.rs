//! # SweepGen - Benchmark Sweep Script Generator
//!
//! SweepGen writes the shell script that drives a scaling study: one run of
//! a benchmark binary per (input size, worker count) pair, with worker counts
//! doubling from 1 up to a bound and a final count for the full machine.
//! Multi-worker runs go through a NUMA interleaving launcher.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sweepgen::config::SweepConfig;
//! use sweepgen::core::ScriptWriter;
//!
//! // Writes ./run.sh with the default intervalTree sweep
//! let summary = ScriptWriter::new(SweepConfig::default()).write().unwrap();
//! summary.print_summary();
//! ```
//!
//! ## Custom Sweeps
//!
//! ```
//! use sweepgen::config::SweepConfig;
//! use sweepgen::core::ScriptWriter;
//!
//! let config = SweepConfig {
//!     sizes: vec![100_000],
//!     ..Default::default()
//! };
//!
//! let script = ScriptWriter::new(config).render().unwrap();
//! assert!(script.starts_with("export CILK_NWORKERS=1\n./intervalTree 100000 5\n"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod system;

// Re-export commonly used types
pub use config::SweepConfig;
pub use core::{plan, Invocation, RunMode, ScriptSummary, ScriptWriter, ThreadSchedule};
pub use error::{Result, SweepGenError};
