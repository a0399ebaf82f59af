use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "lanreel",
    version,
    about = "Find a video server on the LAN and keep its next video playing"
)]
pub struct Cli {
    /// Candidate host (host:port); repeat to replace the configured list.
    #[arg(long = "host", value_name = "HOST", global = true)]
    pub hosts: Vec<String>,

    /// Alternative config file.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive player session (default).
    Tui,
    /// Run one discovery pass and print the winning stream.
    Probe,
    /// Print the candidate hosts in probe order.
    Hosts,
    /// Ask the stream's server to stop offering its file.
    Blacklist {
        /// A stream URL previously resolved by lanreel.
        stream_url: String,
    },
}
