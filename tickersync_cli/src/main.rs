mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tickersync_lib::AppConfig;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "tickersync")]
#[command(about = "Snapshot the reference ticker listing into CSV files and a warehouse table")]
struct Cli {
    /// Output format: table, json, csv, markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch all tickers and write them to a CSV file
    Fetch(commands::fetch::FetchArgs),
    /// Fetch all tickers and load them into the warehouse table
    Load(commands::load::LoadArgs),
    /// Fetch once and write to the selected sinks
    Run(commands::run::RunArgs),
    /// Repeat the run on a fixed interval until interrupted
    Schedule(commands::schedule::ScheduleArgs),
    /// Show row totals and partition dates of the warehouse table
    Status(commands::status::StatusArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tickersync=info".parse()?)
                .add_directive("tickers_api=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.output)?;
    let config = AppConfig::from_env().context("failed to load configuration")?;

    match &cli.command {
        Commands::Fetch(args) => commands::fetch::run(args, &config, &format).await?,
        Commands::Load(args) => commands::load::run(args, &config, &format).await?,
        Commands::Run(args) => commands::run::run(args, &config, &format).await?,
        Commands::Schedule(args) => commands::schedule::run(args, &config, &format).await?,
        Commands::Status(args) => commands::status::run(args, &config, &format).await?,
    }

    Ok(())
}
