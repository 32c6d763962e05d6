use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_SEED_PATH: &str = "data/common_generics_en.txt";
pub const DEFAULT_RAW_PATH: &str = "data/otc_db_openfda_raw.json";

/// Builds and maintains the OTC drug database.
#[derive(Debug, Parser)]
#[command(name = "otc-db", version, about)]
pub struct Cli {
    /// Debug-level logging.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Query openFDA for every name in the seed list and store the raw payloads.
    Fetch(FetchArgs),
    /// Convert raw openFDA payloads into the structured database.
    Convert(ConvertArgs),
    /// `fetch` followed by `convert`.
    Update {
        #[command(flatten)]
        fetch: FetchArgs,
        /// Structured database to write.
        #[arg(long, env = "OTC_DB_PATH", default_value = drug_db::DEFAULT_DB_PATH)]
        db: PathBuf,
    },
    /// Normalize a free-text drug leaflet into a JSON record with the configured LLM.
    Leaflet {
        input: PathBuf,
        output: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// openFDA API key (optional, raises the rate limit).
    #[arg(long, env = "OPENFDA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// One generic name per line; `#` starts a comment.
    #[arg(long, default_value = DEFAULT_SEED_PATH)]
    pub seed: PathBuf,

    /// Raw output file.
    #[arg(long, default_value = DEFAULT_RAW_PATH)]
    pub out: PathBuf,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Raw openFDA file produced by `fetch`.
    #[arg(long, default_value = DEFAULT_RAW_PATH)]
    pub raw: PathBuf,

    /// Structured database to write.
    #[arg(long, env = "OTC_DB_PATH", default_value = drug_db::DEFAULT_DB_PATH)]
    pub out: PathBuf,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn update_takes_fetch_flags() {
        let cli = Cli::try_parse_from([
            "otc-db", "update", "--seed", "seeds.txt", "--db", "out.json", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Update { fetch, db } => {
                assert_eq!(fetch.seed, PathBuf::from("seeds.txt"));
                assert_eq!(fetch.out, PathBuf::from(DEFAULT_RAW_PATH));
                assert_eq!(db, PathBuf::from("out.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
