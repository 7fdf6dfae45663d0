//! CLI entry point for the SMPU assembler binary.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde as _;
use smpu_assembler::export::{self, ExportEntry, ExportError};
use smpu_assembler::{compile, Compilation};
use smpu_emulator::{ConfigError, Machine, MachineConfig, MemoryConfig};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use tempfile as _;

const DEFAULT_MAX_CLOCKS: u32 = 100_000;

#[derive(Debug, Parser)]
#[command(name = "smpu-asm", version, about = "Assemble and run SMPU programs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a source file to a JSON export list.
    Build(BuildArgs),
    /// Compile a source file and run it on a simulated machine.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct BuildArgs {
    /// Assembly source.
    input: PathBuf,
    /// Output path (default: input stem + .json).
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Print the listing to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Assembly source.
    input: PathBuf,
    /// Stop after this many clocks if the program has not halted.
    #[arg(long, default_value_t = DEFAULT_MAX_CLOCKS)]
    max_clocks: u32,
    /// Machine configuration as JSON.
    #[arg(long, conflicts_with_all = ["memory_bits", "range_prefix"])]
    config: Option<PathBuf>,
    /// Address bits of a single memory device.
    #[arg(long)]
    memory_bits: Option<u8>,
    /// Binary address prefix the memory answers to.
    #[arg(long, requires = "memory_bits")]
    range_prefix: Option<String>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("compile failed: {0}")]
    Compile(String),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("invalid machine config: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid machine config file {}: {source}", path.display())]
    ConfigFile {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("machine halted on a fault at p={pc}")]
    Fault { pc: u16 },
}

fn read_source(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("out");
    input.with_file_name(format!("{stem}.json"))
}

fn report_errors(compilation: &Compilation) {
    for token in compilation.errors() {
        for error in token.errors() {
            eprintln!(
                "line {}: `{}`: {}: {error}",
                token.line,
                token.text,
                error.category()
            );
        }
    }
    eprintln!("{}", compilation.summary());
}

fn print_listing(compilation: &Compilation) {
    for row in compilation.listing() {
        let address = row
            .address
            .map_or_else(|| "    ".to_owned(), |address| format!("{address:04X}"));
        eprintln!("{:>4} {address}  {}", row.line, row.text);
    }
}

fn compiled_export(input: &Path) -> Result<(Compilation, Vec<ExportEntry>), CliError> {
    let compilation = compile(&read_source(input)?);
    if compilation.has_errors() {
        report_errors(&compilation);
        return Err(CliError::Compile(compilation.summary().to_string()));
    }
    let entries = compilation.export()?;
    Ok((compilation, entries))
}

fn run_build(args: &BuildArgs) -> Result<(), CliError> {
    let (compilation, entries) = compiled_export(&args.input)?;
    if args.verbose {
        print_listing(&compilation);
    }
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    fs::write(&output, export::to_json(&entries)?).map_err(|source| CliError::Write {
        path: output.clone(),
        source,
    })?;
    eprintln!("{}", compilation.summary());
    println!(
        "Assembled {} ({} bytes) -> {}",
        args.input.display(),
        entries.len(),
        output.display()
    );
    Ok(())
}

fn machine_config(args: &RunArgs) -> Result<MachineConfig, CliError> {
    if let Some(path) = &args.config {
        let text = read_source(path)?;
        return serde_json::from_str(&text).map_err(|source| CliError::ConfigFile {
            path: path.clone(),
            source,
        });
    }
    Ok(args.memory_bits.map_or_else(MachineConfig::default, |address_bits| {
        MachineConfig {
            memories: vec![MemoryConfig {
                address_bits,
                range_prefix: args.range_prefix.clone(),
            }],
        }
    }))
}

fn run_program(args: &RunArgs) -> Result<(), CliError> {
    let config = machine_config(args)?;
    let mut machine = Machine::with_config(&config)?;
    let (_, entries) = compiled_export(&args.input)?;

    machine.restart();
    let loaded = machine.load(entries.iter().map(|&entry| <(u16, u8)>::from(entry)));
    for diagnostic in &loaded.diagnostics {
        println!("[load] {diagnostic}");
    }

    let outcome = machine.run(args.max_clocks);
    for (pc, diagnostic) in &outcome.diagnostics {
        println!("[{pc}] {diagnostic}");
    }
    println!("{}", machine.registers());
    info!(clocks = outcome.clocks, running = outcome.running, "run finished");

    if machine.run_state().fault().is_some() {
        return Err(CliError::Fault {
            pc: machine.registers().p(),
        });
    }
    if outcome.running {
        eprintln!("stopped after {} clocks without halting", outcome.clocks);
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Build(args) => run_build(args),
        Command::Run(args) => run_program(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
