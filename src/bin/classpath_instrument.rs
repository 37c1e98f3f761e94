//! classpath-instrument: static call-site instrumentation for compiled units
//!
//! Rewrites units (stored as JSON event models) so that reads of system
//! properties and of `Integer.getInteger`, `Long.getLong` and
//! `Boolean.getBoolean` settings go through the instrumentation shim.
//!
//! ## Commands
//!
//! - **rewrite**: Rewrite unit files into an output directory
//! - **fingerprint**: Print the cache-key fingerprint of the transform
//! - **rules**: List the redirected calls
//!
//! ## Example Usage
//!
//! ```bash
//! # Rewrite every unit under build/units
//! classpath-instrument rewrite build/units --out-dir build/instrumented
//!
//! # Cache key contribution, as JSON
//! classpath-instrument --json fingerprint
//! ```
//!
//! Logging goes to stderr and is controlled by `CLASSPATH_INSTRUMENT_LOG`
//! (an `EnvFilter` directive). `CLASSPATH_INSTRUMENT_LOG_STYLE=full` adds
//! timestamps.

use anyhow::Result;
use clap::{Parser, Subcommand};
use instrument_types::env_utils::env_string_or;
use tracing_subscriber::EnvFilter;

mod instrument_cli;

use instrument_cli::{fingerprint::FingerprintCmd, rewrite::RewriteCmd, rules::RulesCmd};

#[derive(Parser)]
#[command(
    name = "classpath-instrument",
    author,
    version,
    about = "Static call-site instrumentation for compiled units",
    long_about = "Redirects environment reads in compiled units to an instrumentation shim.\n\n\
                  Each redirected call receives the name of the calling unit as an extra argument."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (debug logging unless CLASSPATH_INSTRUMENT_LOG is set)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite unit files
    Rewrite(RewriteCmd),

    /// Print the transform's cache-key fingerprint
    Fingerprint(FingerprintCmd),

    /// List redirected calls
    Rules(RulesCmd),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CLASSPATH_INSTRUMENT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);
    if env_string_or("CLASSPATH_INSTRUMENT_LOG_STYLE", "compact") == "full" {
        builder.init();
    } else {
        builder.without_time().init();
    }
}

fn main() -> Result<()> {
    let Cli {
        command,
        json,
        verbose,
    } = Cli::parse();
    init_tracing(verbose);

    match command {
        Commands::Rewrite(cmd) => cmd.execute(json),
        Commands::Fingerprint(cmd) => cmd.execute(json),
        Commands::Rules(cmd) => cmd.execute(json),
    }
}
