//! sockscope command - find which process owns a socket.
//!
//! Scans every network namespace on the host and attributes each open
//! TCP/UDP socket to the process holding it. The `scan` subcommand is
//! also what the tool re-executes inside other namespaces, so its stdout
//! carries nothing but the JSON socket map; logs always go to stderr.

mod output;

use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use sockscope::{Address, LookupParameters, SocketTracker, TrackerConfig};

#[derive(Parser)]
#[command(
    name = "sockscope",
    version,
    about = "Find which process owns a socket across network namespaces"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Command used to enter a namespace (default: nsenter).
    #[arg(long, value_name = "CMD", global = true)]
    nsenter: Option<String>,

    /// Give up on a namespace after this many seconds (0 waits forever).
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the sockets of the current namespace as JSON.
    Scan,

    /// List sockets of every namespace with their owning process.
    #[command(visible_alias = "t")]
    Track {
        /// Output JSON.
        #[arg(short = 'j', long)]
        json: bool,

        /// Pretty print JSON.
        #[arg(short = 'p', long)]
        pretty: bool,
    },

    /// Find the processes owning sockets with the given endpoints.
    #[command(visible_alias = "f")]
    Find {
        /// Local endpoint (ip:port).
        #[arg(long, value_name = "ADDR")]
        local: Option<Address>,

        /// Remote endpoint (ip:port).
        #[arg(long, value_name = "ADDR")]
        remote: Option<Address>,

        /// Output JSON.
        #[arg(short = 'j', long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    // RUST_LOG, when set, takes precedence over -v.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = TrackerConfig::from_env()?;
    if let Some(ref line) = cli.nsenter {
        config = config.launcher_line(line)?;
    }
    if let Some(secs) = cli.timeout {
        config = config.timeout((secs > 0).then_some(Duration::from_secs(secs)));
    }
    tracing::debug!(?config, "configuration loaded");

    let tracker = SocketTracker::new(&config);

    match cli.command {
        Command::Scan => {
            let map = tracker.track_connections_in_current_namespace()?;
            output::print_wire(&map)?;
        }
        Command::Track { json, pretty } => {
            let map = tracker.track_connections().await?;
            if json || pretty {
                output::print_json(&map, pretty)?;
            } else {
                output::print_text(&map)?;
            }
        }
        Command::Find {
            local,
            remote,
            json,
        } => {
            let map = tracker.track_connections().await?;
            let params = LookupParameters {
                local_address: local,
                remote_address: remote,
            };
            let pids = map.find_processes(&params);
            output::print_pids(&pids, json)?;
        }
    }

    Ok(())
}
