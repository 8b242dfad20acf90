use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use disaster_etl::data::persist::IfExists;
use disaster_etl::{PipelineConfig, run};

#[derive(Parser)]
#[command(name = "process-data")]
#[command(about = "Merge disaster messages with their categories and save them to SQLite")]
#[command(version)]
#[command(after_help = "Example: process-data disaster_messages.csv disaster_categories.csv DisasterResponse.db")]
struct Cli {
    /// Messages dataset (.csv, .json or .parquet)
    messages: PathBuf,

    /// Categories dataset with the encoded `categories` column
    categories: PathBuf,

    /// SQLite database to save the cleaned data to
    database: PathBuf,

    /// Column both datasets are joined on
    #[arg(long, default_value = "id")]
    key: String,

    /// Column holding the `name-digit;...` labels
    #[arg(long, default_value = "categories")]
    categories_column: String,

    /// What to do if the output table already exists
    #[arg(long, value_enum, default_value_t = IfExists::Replace)]
    if_exists: IfExists,

    /// Skip messages that have no categories instead of failing
    #[arg(long)]
    drop_unlabeled: bool,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

impl From<Cli> for PipelineConfig {
    fn from(cli: Cli) -> Self {
        PipelineConfig {
            key_column: cli.key,
            categories_column: cli.categories_column,
            if_exists: cli.if_exists,
            drop_unlabeled: cli.drop_unlabeled,
            report_path: cli.report,
            ..PipelineConfig::new(cli.messages, cli.categories, cli.database)
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = PipelineConfig::from(Cli::parse());
    run(&config)?;
    Ok(())
}
