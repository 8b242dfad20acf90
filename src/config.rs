use std::path::PathBuf;

use crate::data::clean::CleanOptions;
use crate::data::persist::IfExists;

/// Everything one run needs. Defaults match the usual dataset layout:
/// join on `id`, decode `categories`, replace the output table.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub messages_path: PathBuf,
    pub categories_path: PathBuf,
    pub database_path: PathBuf,
    pub key_column: String,
    pub categories_column: String,
    pub if_exists: IfExists,
    pub drop_unlabeled: bool,
    /// Where to write the JSON run report, if anywhere.
    pub report_path: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn new(
        messages_path: impl Into<PathBuf>,
        categories_path: impl Into<PathBuf>,
        database_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            messages_path: messages_path.into(),
            categories_path: categories_path.into(),
            database_path: database_path.into(),
            key_column: "id".to_string(),
            categories_column: "categories".to_string(),
            if_exists: IfExists::default(),
            drop_unlabeled: false,
            report_path: None,
        }
    }

    pub fn clean_options(&self) -> CleanOptions {
        CleanOptions {
            categories_column: self.categories_column.clone(),
            key_column: self.key_column.clone(),
            drop_unlabeled: self.drop_unlabeled,
        }
    }
}
