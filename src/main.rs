use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use cryptofolio::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Refresh prices once and display the wallet valuation
    Summary,
    /// Refresh prices once and display the latest price of a symbol
    Price {
        /// Asset symbol, e.g. BTC
        symbol: String,
    },
    /// Keep refreshing prices and redisplay the wallet after every pass
    Watch,
    /// Buy an asset at its latest price and save the wallet
    Buy {
        /// Asset symbol, e.g. BTC
        symbol: String,
        /// Quantity to buy
        quantity: f64,
    },
    /// Sell an asset at its latest price and save the wallet
    Sell {
        /// Asset symbol, e.g. BTC
        symbol: String,
        /// Quantity to sell
        quantity: f64,
    },
}

impl From<Commands> for cryptofolio::AppCommand {
    fn from(cmd: Commands) -> cryptofolio::AppCommand {
        match cmd {
            Commands::Summary => cryptofolio::AppCommand::Summary,
            Commands::Price { symbol } => cryptofolio::AppCommand::Price(symbol),
            Commands::Watch => cryptofolio::AppCommand::Watch,
            Commands::Buy { symbol, quantity } => {
                cryptofolio::AppCommand::Buy { symbol, quantity }
            }
            Commands::Sell { symbol, quantity } => {
                cryptofolio::AppCommand::Sell { symbol, quantity }
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => cryptofolio::cli::setup::setup_at_path(path),
            None => cryptofolio::cli::setup::setup(),
        },
        Some(cmd) => cryptofolio::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
