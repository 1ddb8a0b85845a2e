//! SILICA CLI
//!
//! Command-line host over circuit files and recorded session logs.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::Result;
use commands::Context;
use silica_core::DigestAlgorithm;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "silica")]
#[command(about = "SILICA - deterministic logic simulation with replayable sessions", long_about = None)]
struct Cli {
    /// JSON file with `evaluator` and `replay` settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// JSON array of composite chip definitions to register
    #[arg(long, global = true)]
    chips: Option<PathBuf>,
    /// Diagnostic output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
    /// Raise diagnostic verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an event log's structure without running it
    Validate {
        /// Path to event log
        log: PathBuf,
    },
    /// Replay a log and print the final state hash and signals
    Replay {
        /// Path to event log
        log: PathBuf,
    },
    /// Compare a live run of the log against its replay
    Verify {
        /// Path to event log
        log: PathBuf,
        /// Initial circuit for the live run; defaults to the log's first event
        #[arg(short, long)]
        initial: Option<PathBuf>,
    },
    /// Print the snapshot at one event index
    Inspect {
        /// Path to event log
        log: PathBuf,
        /// Event index
        #[arg(short, long)]
        index: usize,
    },
    /// Diff the snapshots at two event indices
    Diff {
        /// Path to event log
        log: PathBuf,
        /// Earlier index
        #[arg(long)]
        from: usize,
        /// Later index
        #[arg(long)]
        to: usize,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the canonical hash of a circuit file
    Hash {
        /// Path to circuit
        circuit: PathBuf,
        /// Digest algorithm
        #[arg(short, long, default_value = "blake3")]
        algorithm: DigestAlgorithm,
    },
    /// Encode a circuit file as a share string
    ShareEncode {
        /// Path to circuit
        circuit: PathBuf,
    },
    /// Decode a share string into circuit JSON
    ShareDecode {
        /// `c1:` share string or legacy base64
        share: String,
    },
}

fn init_tracing(format: LogFormat, verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.log_format, cli.verbose);

    let ctx = Context::load(cli.config.as_deref(), cli.chips.as_deref())?;

    let output = match cli.command {
        Commands::Validate { log } => commands::validate(&log)?,
        Commands::Replay { log } => commands::replay(&ctx, &log)?,
        Commands::Verify { log, initial } => {
            let (report, equal) = commands::verify(&ctx, &log, initial.as_deref())?;
            println!("{}", report);
            return Ok(if equal { ExitCode::SUCCESS } else { ExitCode::FAILURE });
        }
        Commands::Inspect { log, index } => commands::inspect(&ctx, &log, index)?,
        Commands::Diff { log, from, to, json } => commands::diff(&ctx, &log, from, to, json)?,
        Commands::Hash { circuit, algorithm } => commands::hash(&circuit, algorithm)?,
        Commands::ShareEncode { circuit } => commands::share_encode(&circuit)?,
        Commands::ShareDecode { share } => commands::share_decode(&share)?,
    };
    println!("{}", output);
    Ok(ExitCode::SUCCESS)
}
