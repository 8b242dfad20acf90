use thiserror::Error;

/// Shape and format failures while decoding the category column.
/// Any one of these aborts the run.
#[derive(Error, Debug, PartialEq)]
pub enum CleanError {
    #[error("table has no '{0}' column")]
    MissingColumn(String),

    #[error("no rows to derive category names from")]
    Empty,

    #[error("row {row}: '{column}' is not a string ({value})")]
    NotText {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: no category match for key {key}")]
    MissingCategories { row: usize, key: String },

    #[error("row {row}: segment '{segment}' is not of the form name-digit")]
    MalformedSegment { row: usize, segment: String },

    #[error("row {row}: expected {expected} category segments, found {found}")]
    SegmentCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}: segment {position} is '{found}' but the first row has '{expected}'")]
    LabelMismatch {
        row: usize,
        position: usize,
        expected: String,
        found: String,
    },

    #[error("category '{0}' collides with an existing column")]
    DuplicateColumn(String),
}

/// Failures while writing the cleaned table to SQLite.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("table '{0}' already exists")]
    TableExists(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
