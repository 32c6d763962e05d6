//! `otc-db`: builds `data/otc_db.json` from openFDA or from drug leaflets.

mod cli;
mod commands;
mod openfda_client;
mod seed;

use std::process::ExitCode;

use ai_llm_service::service_profiles::LlmServiceProfiles;
use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ConvertArgs};

#[tokio::main]
async fn main() -> ExitCode {
    // Before parsing, so `.env` can supply `OPENFDA_API_KEY` and `OTC_DB_PATH`.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command).await {
        Ok(summary) => {
            println!("{} {summary}", "[ok]".green().bold());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {e:#}", "[failed]".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Command) -> Result<String> {
    match command {
        Command::Fetch(args) => commands::fetch(&args).await,
        Command::Convert(ConvertArgs { raw, out }) => commands::convert(&raw, &out),
        Command::Update { fetch, db } => {
            let fetched = commands::fetch(&fetch).await?;
            println!("{} {fetched}", "[fetch]".cyan());
            let converted = commands::convert(&fetch.out, &db)?;
            Ok(format!("database updated: {converted}"))
        }
        Command::Leaflet { input, output } => {
            let llm = LlmServiceProfiles::from_env(None)?;
            commands::leaflet(&llm, &input, &output).await
        }
    }
}
