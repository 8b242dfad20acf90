use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::data::clean::clean_data;
use crate::data::loader::load_data;
use crate::data::persist::save_data;

/// Summary of one run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunReport {
    pub messages_path: PathBuf,
    pub categories_path: PathBuf,
    pub database_path: PathBuf,
    pub table_name: String,
    pub rows_loaded: usize,
    pub rows_saved: usize,
    pub duplicates_removed: usize,
    pub unlabeled_dropped: usize,
    pub labels: Vec<String>,
}

/// Load, clean and save. Progress lines go to stdout as each stage starts.
pub fn run(config: &PipelineConfig) -> Result<RunReport> {
    println!(
        "Loading data...\n    MESSAGES: {}\n    CATEGORIES: {}",
        config.messages_path.display(),
        config.categories_path.display()
    );
    let merged = load_data(
        &config.messages_path,
        &config.categories_path,
        &config.key_column,
    )?;
    let rows_loaded = merged.len();

    println!("Cleaning data...");
    let (cleaned, stats) = clean_data(merged, &config.clean_options())
        .context("cleaning category labels")?;

    println!(
        "Saving data...\n    DATABASE: {}",
        config.database_path.display()
    );
    let table_name = save_data(&cleaned, &config.database_path, config.if_exists)
        .with_context(|| format!("saving to {}", config.database_path.display()))?;
    println!("Cleaned data saved to database!");

    let report = RunReport {
        messages_path: config.messages_path.clone(),
        categories_path: config.categories_path.clone(),
        database_path: config.database_path.clone(),
        table_name,
        rows_loaded,
        rows_saved: cleaned.len(),
        duplicates_removed: stats.duplicates_dropped,
        unlabeled_dropped: stats.unlabeled_dropped,
        labels: stats.labels,
    };
    info!(
        "run complete: {} rows loaded, {} saved to {}",
        report.rows_loaded, report.rows_saved, report.table_name
    );

    if let Some(path) = &config.report_path {
        let json = serde_json::to_string_pretty(&report).context("serializing run report")?;
        std::fs::write(path, json)
            .with_context(|| format!("writing report to {}", path.display()))?;
    }

    Ok(report)
}
