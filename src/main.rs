use clap::Parser;
use maestro::cli::{Cli, Commands};
use maestro::config::{self, Config};
use maestro::logging;
use std::path::Path;
use tracing::info;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate(opts) => {
            Config::load(opts.config.as_deref())?;
            info!("Configuration is valid");
        }
        Commands::Show(opts) => {
            let config = Config::load(opts.config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Init(opts) => {
            Config::write_default(opts.config.as_deref().unwrap_or("maestro.json"))?;
            info!("Configuration file created");
        }
        Commands::Hash(opts) => {
            let path = opts.config.as_deref().unwrap_or("maestro.json");
            let raw = config::read_config_with_includes(Path::new(path), 0)?;
            println!("{}", config::config_snapshot_hash(&raw));
        }
        Commands::Version => {
            println!("maestro {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
