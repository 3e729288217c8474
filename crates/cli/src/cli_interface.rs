use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start relaying queued transactions until Ctrl-C
    Start {
        /// optional - The project path holding relay.yaml, default will be where the command is run.
        #[clap(long, short)]
        path: Option<String>,

        /// How long to wait for an in-flight batch to finish on shutdown
        #[clap(long, default_value_t = 30)]
        shutdown_timeout_seconds: u64,
    },
    /// Validate relay.yaml and print the signing account without touching the chain
    Check {
        #[clap(long, short)]
        path: Option<String>,
    },
}
