//! SweepGen CLI - Benchmark Sweep Script Generator
//!
//! Writes the thread/size sweep script for a benchmark binary.

use clap::Parser;
use std::io::Write;
use sweepgen::config::{CliArgs, Commands, SweepConfig};
use sweepgen::core::{plan, ScriptWriter, STDOUT_NAME};
use sweepgen::error::{IoResultExt, Result};
use sweepgen::system::NumaTopology;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging; RUST_LOG wins over -v
    let default_level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Handle result
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    let config = SweepConfig::from_cli(&args)?;

    match args.command.clone().unwrap_or(Commands::Generate) {
        Commands::Generate => cmd_generate(config, &args),
        Commands::Plan { detailed } => cmd_plan(&config, detailed),
        Commands::ShowConfig => cmd_show_config(&config),
    }
}

fn cmd_generate(config: SweepConfig, args: &CliArgs) -> Result<()> {
    let writer = ScriptWriter::new(config);

    if args.stdout {
        let mut stdout = std::io::stdout().lock();
        if writer.write_stream(&mut stdout)?.is_none() {
            debug!("stdout closed before the script was complete");
        }
        return Ok(());
    }

    let summary = writer.write()?;
    if !args.quiet {
        summary.print_summary();
    }

    Ok(())
}

fn cmd_plan(config: &SweepConfig, detailed: bool) -> Result<()> {
    let invocations = plan(config)?;
    let writer = ScriptWriter::new(config.clone());
    let topology = NumaTopology::detect();

    println!("=== Sweep Plan ===");
    println!("Program:     ./{}", config.program);
    println!("Output:      {}", config.output.display());
    println!("Sizes:       {}", config.sizes.len());
    println!("Runs:        {}", invocations.len());
    println!();

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{:>12} {:>8} {:>5}  COMMAND", "SIZE", "WORKERS", "REPS")
        .with_path(STDOUT_NAME)?;
    for invocation in &invocations {
        writeln!(
            stdout,
            "{:>12} {:>8} {:>5}  {}",
            invocation.size,
            invocation.threads,
            invocation.repetitions,
            writer.command_line(invocation)
        )
        .with_path(STDOUT_NAME)?;
    }
    drop(stdout);

    if detailed {
        println!();
        topology.print_summary();
    }

    let warnings = topology.check_plan(config, &invocations);
    if !warnings.is_empty() {
        println!();
        for warning in &warnings {
            println!("warning: {}", warning);
        }
    }

    Ok(())
}

fn cmd_show_config(config: &SweepConfig) -> Result<()> {
    println!("{}", config.to_json()?);
    Ok(())
}
