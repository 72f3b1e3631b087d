//! qescript-cli - a demo host for the `qescript` embedded interpreter.
//!
//! Evaluates expressions, files, or byte regions against an in-memory
//! toy buffer, printing the resulting value (and, if the script mutated
//! the buffer, its final contents).

mod config;
mod error;
mod host;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use error::{CliError, Result};
use host::{DemoBuffer, DemoVars};
use qescript::context::Context;
use qescript::value::Value;

/// qescript-cli - evaluate qescript expressions and config scripts
/// against a toy in-memory buffer.
#[derive(Parser, Debug)]
#[command(name = "qescript-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evaluate qescript scripts from the command line", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true, env = "QESCRIPT_VERBOSE")]
    verbose: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "QESCRIPT_CONFIG")]
    config: Option<PathBuf>,

    /// Refuse mutating commands against the demo buffer
    #[arg(long, global = true)]
    read_only: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a single expression
    Eval(EvalCommand),

    /// Evaluate an entire file as a script
    EvalFile(EvalFileCommand),

    /// Evaluate a byte range of a file as a script
    EvalRegion(EvalRegionCommand),
}

#[derive(Parser, Debug)]
struct EvalCommand {
    /// The expression or statement sequence to evaluate
    expr: String,

    /// Seed the demo buffer with this text before evaluating
    #[arg(long, default_value = "")]
    text: String,
}

#[derive(Parser, Debug)]
struct EvalFileCommand {
    /// Script file to evaluate
    path: PathBuf,
}

#[derive(Parser, Debug)]
struct EvalRegionCommand {
    /// File whose bytes supply the script source
    path: PathBuf,

    /// Region start offset, inclusive
    start: usize,

    /// Region end offset, exclusive
    end: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    let config = Config::load(cli.config.as_deref())?;
    execute_command(cli.command, cli.read_only || config.read_only, &config)
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .map_err(|e| CliError::Config(format!("failed to initialize logging: {e}")))?;

    Ok(())
}

fn execute_command(command: Commands, read_only: bool, config: &Config) -> Result<()> {
    match command {
        Commands::Eval(args) => execute_eval(args, read_only, config),
        Commands::EvalFile(args) => execute_eval_file(args, read_only, config),
        Commands::EvalRegion(args) => execute_eval_region(args, read_only, config),
    }
}

fn execute_eval(args: EvalCommand, read_only: bool, config: &Config) -> Result<()> {
    let buffer = DemoBuffer::new(args.text.into_bytes(), read_only);
    let mut vars = DemoVars::from_config(config);
    let mut commands = host::DemoCommands::new(&buffer);
    let value = Context::eval_expression(&args.expr, &mut vars, &mut commands, &buffer)?;
    report(value, &buffer);
    Ok(())
}

fn execute_eval_file(args: EvalFileCommand, read_only: bool, config: &Config) -> Result<()> {
    let initial = std::fs::read(&args.path)?;
    let buffer = DemoBuffer::new(Vec::new(), read_only);
    let mut vars = DemoVars::from_config(config);
    let mut commands = host::DemoCommands::new(&buffer);
    let value = Context::eval_region(
        &args.path.to_string_lossy(),
        &initial,
        &mut vars,
        &mut commands,
        &buffer,
    )?;
    report(value, &buffer);
    Ok(())
}

fn execute_eval_region(args: EvalRegionCommand, read_only: bool, config: &Config) -> Result<()> {
    let bytes = std::fs::read(&args.path)?;
    if args.start > args.end || args.end > bytes.len() {
        return Err(CliError::InvalidRegion(format!(
            "{}..{} out of bounds for a {}-byte file",
            args.start,
            args.end,
            bytes.len()
        )));
    }
    let region = &bytes[args.start..args.end];
    let buffer = DemoBuffer::new(Vec::new(), read_only);
    let mut vars = DemoVars::from_config(config);
    let mut commands = host::DemoCommands::new(&buffer);
    let value = Context::eval_region(
        &args.path.to_string_lossy(),
        region,
        &mut vars,
        &mut commands,
        &buffer,
    )?;
    report(value, &buffer);
    Ok(())
}

fn report(value: Value, buffer: &DemoBuffer) {
    println!("{value:?}");
    let contents = buffer.contents();
    if !contents.is_empty() {
        println!("--- buffer ---\n{}", String::from_utf8_lossy(&contents));
    }
}
