//! pagewire CLI
//!
//! Runs a pagewire server and inspects its append-only log.
//!
//! # Commands
//!
//! - `serve` - Replay the log, accept peer bridges and run until Ctrl-C
//! - `replay` - Replay a log and report what was used and skipped
//! - `compact` - Rewrite a log to its minimal form (not supported yet)
//! - `dump` - Print one page as it stands after replay

mod commands;

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// pagewire real-time page server.
#[derive(Parser)]
#[command(name = "pagewire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the broker and accept peer bridges
    Serve {
        /// Address to accept peer bridges on
        #[arg(short, long, default_value = "127.0.0.1:7070")]
        listen: SocketAddr,

        /// Append-only log file; omit to keep pages in memory only
        #[arg(short, long)]
        aof: Option<PathBuf>,

        /// Do not fsync the log after every patch
        #[arg(long)]
        no_sync: bool,

        /// Start with an empty log if the --aof file does not exist
        #[arg(long, requires = "aof")]
        create: bool,

        /// Mirror a page with a peer, as URL=HOST (repeatable)
        #[arg(short, long, value_parser = commands::serve::parse_bridge)]
        bridge: Vec<commands::serve::BridgeArg>,
    },

    /// Replay a log and report statistics
    Replay {
        /// Append-only log file
        #[arg(short, long)]
        aof: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Compact a log
    Compact {
        /// Append-only log file
        #[arg(short, long)]
        aof: PathBuf,
    },

    /// Print a page after replay
    Dump {
        /// Append-only log file
        #[arg(short, long)]
        aof: PathBuf,

        /// Page url
        #[arg(short, long)]
        url: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve {
            listen,
            aof,
            no_sync,
            create,
            bridge,
        } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let config = commands::serve::broker_config(aof, !no_sync, create);
            runtime.block_on(commands::serve::run(listen, config, bridge))?;
        }
        Commands::Replay { aof, format } => {
            commands::replay::run(&aof, &format)?;
        }
        Commands::Compact { aof } => {
            commands::compact::run(&aof)?;
        }
        Commands::Dump { aof, url } => {
            commands::dump::run(&aof, &url)?;
        }
        Commands::Version => {
            println!("pagewire CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("pagewire core v{}", pagewire_core::VERSION);
        }
    }

    Ok(())
}
