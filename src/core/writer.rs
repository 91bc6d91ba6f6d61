//! Script rendering and output
//!
//! Each invocation becomes two shell lines: an `export` of the worker
//! count, then the benchmark command. The output file is truncated and
//! rewritten on every run.

use crate::config::SweepConfig;
use crate::core::scheduler::{plan, Invocation};
use crate::error::{IoResultExt, Result, SweepGenError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Header written when a shebang is requested
pub const SHEBANG: &str = "#!/bin/sh";

/// Name attached to errors on standard output
pub const STDOUT_NAME: &str = "<stdout>";

/// What a write produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSummary {
    /// Destination, None for stdout or in-memory writers
    pub path: Option<PathBuf>,
    /// Benchmark runs in the script
    pub invocations: usize,
    /// Lines written
    pub lines: usize,
    /// Bytes written
    pub bytes: u64,
}

impl ScriptSummary {
    /// Print a short summary
    pub fn print_summary(&self) {
        let target = self
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| STDOUT_NAME.to_string());
        println!("=== Script Summary ===");
        println!("Output:      {}", target);
        println!("Runs:        {}", self.invocations);
        println!("Lines:       {}", self.lines);
        println!("Size:        {}", humansize::format_size(self.bytes, humansize::BINARY));
    }
}

/// Renders a sweep config as a shell script
#[derive(Debug, Clone)]
pub struct ScriptWriter {
    config: SweepConfig,
}

impl ScriptWriter {
    /// Create a writer for a config
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    /// `export VAR=<threads>`
    pub fn export_line(&self, invocation: &Invocation) -> String {
        format!("export {}={}", self.config.workers_var, invocation.threads)
    }

    /// Benchmark command, launcher-prefixed for interleaved runs
    pub fn command_line(&self, invocation: &Invocation) -> String {
        let command = format!(
            "./{} {} {}",
            self.config.program, invocation.size, invocation.repetitions
        );
        match self.config.launcher() {
            Some(launcher) if invocation.interleave => format!("{} {}", launcher, command),
            _ => command,
        }
    }

    /// Render the whole script into a string
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write the script to any writer
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<ScriptSummary> {
        let invocations = self.checked_plan()?;
        Ok(self.emit(out, &invocations)?)
    }

    /// Write the script to a pipe-like stream such as stdout.
    ///
    /// A reader that goes away early (`head`, `less`) ends the output
    /// normally; `Ok(None)` reports that the script was cut short.
    pub fn write_stream<W: Write>(&self, out: &mut W) -> Result<Option<ScriptSummary>> {
        let invocations = self.checked_plan()?;
        match self.emit(out, &invocations) {
            Ok(summary) => Ok(Some(summary)),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(None),
            Err(e) => Err(SweepGenError::io(STDOUT_NAME, e)),
        }
    }

    fn checked_plan(&self) -> Result<Vec<Invocation>> {
        self.config.validate()?;
        plan(&self.config)
    }

    fn emit<W: Write>(&self, out: &mut W, invocations: &[Invocation]) -> std::io::Result<ScriptSummary> {
        let mut lines = 0usize;
        let mut bytes = 0u64;
        let mut put = |out: &mut W, line: &str| -> std::io::Result<()> {
            out.write_all(line.as_bytes())?;
            out.write_all(b"\n")?;
            lines += 1;
            bytes += line.len() as u64 + 1;
            Ok(())
        };

        if self.config.shebang {
            put(&mut *out, SHEBANG)?;
        }
        for invocation in invocations {
            put(&mut *out, &self.export_line(invocation))?;
            put(&mut *out, &self.command_line(invocation))?;
        }
        out.flush()?;

        Ok(ScriptSummary {
            path: None,
            invocations: invocations.len(),
            lines,
            bytes,
        })
    }

    /// Create or truncate the configured output file and write the script
    pub fn write(&self) -> Result<ScriptSummary> {
        self.write_file(&self.config.output)
    }

    /// Create or truncate `path` and write the script
    pub fn write_file(&self, path: &Path) -> Result<ScriptSummary> {
        // Validate and plan first so a bad config never truncates an existing script
        let invocations = self.checked_plan()?;

        let file = File::create(path).with_path(path)?;
        let mut out = BufWriter::new(file);
        let mut summary = self.emit(&mut out, &invocations).with_path(path)?;
        out.into_inner()
            .map_err(|e| e.into_error())
            .with_path(path)?
            .sync_all()
            .with_path(path)?;

        summary.path = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            invocations = summary.invocations,
            lines = summary.lines,
            "wrote sweep script"
        );
        Ok(summary)
    }
}
