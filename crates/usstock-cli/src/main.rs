

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

mod commands;
mod universe;

use commands::cache::CacheCommands;
use commands::download::DownloadArgs;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "usstock")]
#[command(propagate_version = true)]
struct Cli {
  #[command(subcommand)]
  command: Commands,

  /// Verbose output
  #[arg(short, long, global = true)]
  verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Download daily price history CSVs for a symbol universe
  Download(DownloadArgs),

  /// Inspect or wipe the download cache
  Cache {
    #[command(subcommand)]
    cmd: CacheCommands,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  // Load environment variables
  dotenv().ok();

  // Parse CLI arguments
  let cli = Cli::parse();

  // Initialize logging
  let log_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt().with_env_filter(log_level).init();

  // Load configuration
  let config = usstock_core::Config::from_env()?;

  // Execute command
  let exit_code = match cli.command {
    Commands::Download(args) => commands::download::execute(args, config).await?,
    Commands::Cache { cmd } => commands::cache::execute(cmd, config).await?,
  };

  std::process::exit(exit_code);
}
