use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

#[derive(Parser)]
#[command(name = "option-writer")]
#[command(about = "Recurring short futures option writer for Interactive Brokers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the trading cycle until stopped
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Trade against the in-process paper platform instead of IB Gateway
        #[arg(long)]
        paper: bool,
        /// Starting reference price for the paper platform
        #[arg(long, default_value = "4000")]
        paper_price: Decimal,
        /// Seed for the paper price walk
        #[arg(long, default_value_t = 0)]
        paper_seed: u64,
        /// Optional log file path (logs to file instead of stderr)
        #[arg(long, env = "WRITER_LOG_FILE")]
        log_file: Option<String>,
    },
    /// Print the latest traded contracts
    Report {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run {
            log_file: Some(path),
            ..
        } => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(env_filter()).init();
        }
    }

    match cli.command {
        Commands::Run {
            config,
            paper,
            paper_price,
            paper_seed,
            log_file: _,
        } => {
            let mode = if paper {
                commands::RunMode::Paper {
                    start_price: paper_price,
                    seed: paper_seed,
                }
            } else {
                commands::RunMode::Live
            };
            commands::run_writer(&config, mode).await?;
        }
        Commands::Report { config } => {
            commands::run_report(&config).await?;
        }
    }

    Ok(())
}
