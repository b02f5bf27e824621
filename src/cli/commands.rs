use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gambit")]
#[command(about = "An online chess server with matchmaking and Elo ratings")]
pub struct Cli {
    /// Configuration file. Defaults to the platform config directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the game server
    ///
    /// Examples:
    ///   gambit serve
    ///   gambit serve --bind 0.0.0.0:7878
    ///   gambit serve --ephemeral
    Serve {
        /// Address to listen on. Overrides `bind_addr` from the configuration
        #[arg(short, long)]
        bind: Option<String>,
        /// Keep all state in memory instead of the on-disk database
        #[arg(long)]
        ephemeral: bool,
    },
    /// Key management commands
    Key {
        #[command(subcommand)]
        command: KeyCommand,
    },
    /// Issue a signed credential for a participant
    ///
    /// Example: gambit credential alice
    Credential {
        /// Participant identity the credential vouches for
        participant: String,
    },
}

#[derive(Subcommand)]
pub enum KeyCommand {
    /// Show the configured key storage path
    Path,
    /// Generate a new signing key (overwrites existing)
    Generate,
    /// Show current signing key info
    Info,
}
