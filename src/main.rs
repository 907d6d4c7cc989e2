// ratekeeper command line.
// Loads exchange rates through the cache-first repository and prints or converts them.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;

use ratekeeper::{
    Config, ExchangeRates, RateLoader, RateService, RateStore, RatekeeperError, Result,
    SerialRateStore,
};

#[derive(Debug, Parser)]
#[command(name = "ratekeeper", version, about = "Cached exchange rates from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every known rate, sorted by currency code.
    Rates,
    /// Convert an amount from one currency into all others.
    Convert {
        amount: f64,
        /// Source currency code, e.g. USD.
        from: String,
    },
    /// Delete the cached snapshot.
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    config.logging.init();

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Rates => {
            let rates = load_rates(config).await?;
            print_rates(&rates);
        }
        Command::Convert { amount, from } => {
            let from = from.to_uppercase();
            let rates = load_rates(config).await?;
            let conversions = rates.convert(amount, &from);
            if conversions.is_empty() {
                return Err(RatekeeperError::Other(format!("Unknown currency: {}", from)));
            }
            for conversion in conversions {
                println!("{:<4} {:.4}", conversion.currency, conversion.amount);
            }
        }
        // Clearing never reaches the rate service, so it needs no endpoint.
        Command::Clear => {
            let store = SerialRateStore::open(&config.store_path)?;
            store.delete_cached_rates().await?;
            println!("Cache cleared: {}", config.store_path.display());
        }
    }

    Ok(())
}

async fn load_rates(config: &Config) -> Result<ExchangeRates> {
    let service = RateService::from_config(config)?;
    let loaded = service.loader.load().await;
    // Let a remote fetch finish writing back to the cache before exiting.
    service.pending_writes.settle().await;
    Ok(loaded?)
}

fn print_rates(rates: &ExchangeRates) {
    for (code, rate) in rates.iter() {
        println!("{:<4} {}", code, rate);
    }
}
