//! Configuration settings for SweepGen
//!
//! Defines the CLI arguments, the sweep configuration and its defaults,
//! and the JSON config file layer.

use crate::error::{IoResultExt, Result, SweepGenError};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default benchmark executable, invoked as `./intervalTree`
pub const DEFAULT_PROGRAM: &str = "intervalTree";

/// Default script written to the working directory
pub const DEFAULT_OUTPUT: &str = "run.sh";

/// Environment variable read by the Cilk runtime for its worker count
pub const DEFAULT_WORKERS_VAR: &str = "CILK_NWORKERS";

/// Launcher prefixed to every parallel invocation
pub const DEFAULT_LAUNCHER: &str = "numactl -iall";

/// Input sizes swept by default
pub const DEFAULT_SIZES: [u64; 4] = [100_000, 1_000_000, 10_000_000, 100_000_000];

/// Largest power-of-two worker count in the doubling part of the schedule
pub const DEFAULT_MAX_THREADS: usize = 128;

/// Worker count appended after the doubling part (all hyperthreads of the
/// 72-core benchmark host)
pub const DEFAULT_TERMINAL_THREADS: usize = 144;

/// Rounds passed to single-worker runs
pub const DEFAULT_SEQUENTIAL_REPS: u32 = 5;

/// Rounds passed to multi-worker runs
pub const DEFAULT_PARALLEL_REPS: u32 = 10;

/// SweepGen - benchmark sweep script generator
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sweepgen")]
#[command(author = "SweepGen Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate NUMA-aware thread/size sweep scripts for benchmark binaries")]
#[command(long_about = r#"
SweepGen writes a shell script that runs a benchmark binary once per
(input size, worker count) pair. Worker counts double from 1 up to
--max-threads, followed by one terminal count. Multi-worker runs are
wrapped with a NUMA interleaving launcher.

Examples:
  sweepgen                                   # Write ./run.sh with the default sweep
  sweepgen --sizes 100K,1M --stdout          # Print a smaller sweep
  sweepgen --program rangeTree -o range.sh   # Sweep another binary
  sweepgen plan                              # Show the plan against this host
  sweepgen show-config                       # Print the effective config as JSON
"#)]
pub struct CliArgs {
    /// Output script path
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Benchmark executable in the working directory
    #[arg(long, value_name = "NAME")]
    pub program: Option<String>,

    /// Comma separated input sizes (suffixes K, M, G are powers of 1000)
    #[arg(long, value_name = "LIST")]
    pub sizes: Option<String>,

    /// Upper bound of the doubling worker counts
    #[arg(long, value_name = "NUM")]
    pub max_threads: Option<usize>,

    /// Worker count appended after the doubling sequence
    #[arg(long, value_name = "NUM", conflicts_with = "no_terminal")]
    pub terminal_threads: Option<usize>,

    /// Do not append a terminal worker count
    #[arg(long)]
    pub no_terminal: bool,

    /// Launcher prefixed to multi-worker runs (empty string disables it)
    #[arg(long, value_name = "CMD")]
    pub launcher: Option<String>,

    /// Environment variable carrying the worker count
    #[arg(long, value_name = "VAR")]
    pub workers_var: Option<String>,

    /// Repetitions passed to single-worker runs
    #[arg(long, value_name = "NUM")]
    pub sequential_reps: Option<u32>,

    /// Repetitions passed to multi-worker runs
    #[arg(long, value_name = "NUM")]
    pub parallel_reps: Option<u32>,

    /// Start the script with a #!/bin/sh line
    #[arg(long)]
    pub shebang: bool,

    /// JSON config file; CLI options override its values
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Write the sweep script (default)
    #[command(name = "generate")]
    Generate,

    /// Show the planned invocations and check them against this host
    #[command(name = "plan")]
    Plan {
        /// Also print the NUMA topology
        #[arg(short, long)]
        detailed: bool,
    },

    /// Print the effective configuration as JSON
    #[command(name = "show-config")]
    ShowConfig,
}

/// Effective sweep configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Script path
    pub output: PathBuf,
    /// Benchmark executable name
    pub program: String,
    /// Worker count environment variable
    pub workers_var: String,
    /// Launcher for multi-worker runs; empty means none
    pub launcher: String,
    /// Input sizes, in emission order
    pub sizes: Vec<u64>,
    /// Doubling bound (inclusive)
    pub max_threads: usize,
    /// Worker count emitted after the doubling part
    pub terminal_threads: Option<usize>,
    /// Rounds for single-worker runs
    pub sequential_reps: u32,
    /// Rounds for multi-worker runs
    pub parallel_reps: u32,
    /// Emit a #!/bin/sh header
    pub shebang: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            program: DEFAULT_PROGRAM.to_string(),
            workers_var: DEFAULT_WORKERS_VAR.to_string(),
            launcher: DEFAULT_LAUNCHER.to_string(),
            sizes: DEFAULT_SIZES.to_vec(),
            max_threads: DEFAULT_MAX_THREADS,
            terminal_threads: Some(DEFAULT_TERMINAL_THREADS),
            sequential_reps: DEFAULT_SEQUENTIAL_REPS,
            parallel_reps: DEFAULT_PARALLEL_REPS,
            shebang: false,
        }
    }
}

impl SweepConfig {
    /// Load a config from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let config: Self = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "loaded sweep config");
        Ok(config)
    }

    /// Save the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_json()?;
        std::fs::write(path, content).with_path(path)
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Create config from CLI arguments, layered over the config file if given
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(output) = &args.output {
            config.output = output.clone();
        }
        if let Some(program) = &args.program {
            config.program = program.clone();
        }
        if let Some(sizes) = &args.sizes {
            config.sizes = parse_size_list(sizes)
                .map_err(|e| SweepGenError::config(format!("Invalid sizes: {}", e)))?;
        }
        if let Some(max_threads) = args.max_threads {
            config.max_threads = max_threads;
        }
        if args.no_terminal {
            config.terminal_threads = None;
        } else if let Some(terminal) = args.terminal_threads {
            config.terminal_threads = Some(terminal);
        }
        if let Some(launcher) = &args.launcher {
            config.launcher = launcher.trim().to_string();
        }
        if let Some(var) = &args.workers_var {
            config.workers_var = var.clone();
        }
        if let Some(reps) = args.sequential_reps {
            config.sequential_reps = reps;
        }
        if let Some(reps) = args.parallel_reps {
            config.parallel_reps = reps;
        }
        if args.shebang {
            config.shebang = true;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the config before anything is written
    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(SweepGenError::config("Program name must not be empty"));
        }
        if self.program.chars().any(char::is_whitespace) {
            return Err(SweepGenError::config(format!(
                "Program name must not contain whitespace: {:?}",
                self.program
            )));
        }
        if !is_shell_identifier(&self.workers_var) {
            return Err(SweepGenError::config(format!(
                "Not a valid shell variable name: {:?}",
                self.workers_var
            )));
        }
        if self.sizes.is_empty() {
            return Err(SweepGenError::config("At least one input size is required"));
        }
        if self.sizes.contains(&0) {
            return Err(SweepGenError::config("Input sizes must be positive"));
        }
        if self.sequential_reps == 0 || self.parallel_reps == 0 {
            return Err(SweepGenError::config("Repetition counts must be positive"));
        }
        if self.terminal_threads == Some(0) {
            return Err(SweepGenError::config("Terminal thread count must be positive"));
        }
        if self.max_threads == 0 && self.terminal_threads.is_none() {
            return Err(SweepGenError::InvalidSchedule(
                "no doubling steps and no terminal count".to_string(),
            ));
        }

        if let Some(terminal) = self.terminal_threads {
            let last_doubling = largest_power_of_two_at_most(self.max_threads);
            if last_doubling.is_some_and(|last| terminal <= last) {
                warn!(
                    terminal,
                    max_threads = self.max_threads,
                    "terminal thread count does not extend the doubling sequence"
                );
            }
        }

        Ok(())
    }

    /// Launcher, or None when disabled
    pub fn launcher(&self) -> Option<&str> {
        let launcher = self.launcher.trim();
        (!launcher.is_empty()).then_some(launcher)
    }
}

fn largest_power_of_two_at_most(n: usize) -> Option<usize> {
    (n > 0).then(|| 1usize << (usize::BITS - 1 - n.leading_zeros()))
}

fn is_shell_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Parse a count with an optional decimal suffix (e.g., 100K, 10M, 1G)
pub fn parse_count(count: &str) -> std::result::Result<u64, String> {
    let count = count.trim().to_uppercase().replace('_', "");

    if count.is_empty() {
        return Err("Empty count string".to_string());
    }

    let (num_str, multiplier) = if let Some(num) = count.strip_suffix('G') {
        (num, 1_000_000_000u64)
    } else if let Some(num) = count.strip_suffix('M') {
        (num, 1_000_000u64)
    } else if let Some(num) = count.strip_suffix('K') {
        (num, 1_000u64)
    } else {
        (count.as_str(), 1u64)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| format!("Count too large: {}", count))
}

/// Parse a comma separated list of counts
pub fn parse_size_list(list: &str) -> std::result::Result<Vec<u64>, String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_count)
        .collect()
}
