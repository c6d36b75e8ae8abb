mod commands;
mod config;
mod logging;
mod ui;

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "In-memory counter and gauge registry with JSON and Prometheus export", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the registry over HTTP
    Serve {
        /// Path to config file (YAML, TOML, or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the listen address
        #[arg(short, long)]
        listen: Option<SocketAddr>,
    },

    /// Validate a config file
    Validate {
        /// Path to config file
        config_file: PathBuf,
    },

    /// List metrics declared in a config file
    List {
        /// Path to config file
        config_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config: config_path,
            listen,
        } => {
            let mut config = match config_path {
                Some(path) => config::load_from_file(&path).await?,
                None => config::Config::default(),
            };
            if let Some(listen) = listen {
                config.listen = listen;
            }

            let filter = logging::filter(cli.verbose, cli.quiet, &config.log_level);
            let _guard = logging::init(filter, config.log_file.as_deref())?;

            commands::serve::execute(config).await?;
        }

        Commands::Validate { config_file } => {
            logging::init(logging::filter(cli.verbose, cli.quiet, "warn"), None)?;
            commands::validate::execute(config_file).await?;
        }

        Commands::List { config_file } => {
            logging::init(logging::filter(cli.verbose, cli.quiet, "warn"), None)?;
            commands::list::execute(config_file).await?;
        }
    }

    Ok(())
}
