use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "maestro", version, about = "Multi-agent AI framework configuration")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the configuration and report every problem found.
    Validate(ConfigOpts),
    /// Print the normalized configuration as JSON.
    Show(ConfigOpts),
    /// Write a default configuration file.
    Init(ConfigOpts),
    /// Print the content hash of the loaded configuration snapshot.
    Hash(ConfigOpts),
    Version,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    /// Path to the configuration file.
    #[arg(short, long, env = "MAESTRO_CONFIG")]
    pub config: Option<String>,
}
