use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::merge::left_join;
use super::model::{Cell, Table};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load both inputs and left-join categories onto messages by `key`.
/// Every message row survives; unmatched rows carry null category fields.
pub fn load_data(messages_path: &Path, categories_path: &Path, key: &str) -> Result<Table> {
    let messages = load_file(messages_path)
        .with_context(|| format!("loading messages from {}", messages_path.display()))?;
    let categories = load_file(categories_path)
        .with_context(|| format!("loading categories from {}", categories_path.display()))?;
    info!(
        "loaded {} messages and {} category rows",
        messages.len(),
        categories.len()
    );

    let merged = left_join(&messages, &categories, key)
        .with_context(|| format!("joining on '{key}'"))?;
    debug!("merged columns: {:?}", merged.columns);
    Ok(merged)
}

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one record per line (also the fallback)
/// * `.json`    – `[{ "id": 1, "message": "...", ... }, ...]`
/// * `.parquet` – flat columns of strings, ints, floats or bools
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        _ => load_csv(path),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, then records.
/// Types are inferred per column rather than per cell, so a message that
/// happens to read "42" stays text when its neighbours are text.
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut raw: Vec<Vec<String>> = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        raw.push(record.iter().map(|v| v.to_string()).collect());
    }

    let kinds: Vec<ColumnKind> = (0..columns.len())
        .map(|col| infer_column(raw.iter().map(|row| row[col].as_str())))
        .collect();

    let rows = raw
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&kinds)
                .map(|(value, kind)| kind.parse(&value))
                .collect()
        })
        .collect();

    Table::new(columns, rows)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Integer,
    Float,
    Bool,
    Text,
}

impl ColumnKind {
    fn parse(self, s: &str) -> Cell {
        if is_missing(s) {
            return Cell::Null;
        }
        match self {
            ColumnKind::Integer => s.parse().map(Cell::Integer).unwrap_or(Cell::Null),
            ColumnKind::Float => s.parse().map(Cell::Float).unwrap_or(Cell::Null),
            ColumnKind::Bool => parse_bool(s).map(Cell::Bool).unwrap_or(Cell::Null),
            ColumnKind::Text => Cell::String(s.to_string()),
        }
    }
}

/// Empty cells and the NA spellings dataframe readers treat as missing.
fn is_missing(s: &str) -> bool {
    matches!(
        s,
        "" | "#N/A"
            | "#N/A N/A"
            | "#NA"
            | "-1.#IND"
            | "-1.#QNAN"
            | "-NaN"
            | "-nan"
            | "1.#IND"
            | "1.#QNAN"
            | "<NA>"
            | "N/A"
            | "NA"
            | "NULL"
            | "NaN"
            | "None"
            | "n/a"
            | "nan"
            | "null"
    )
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Narrowest kind every non-missing value fits. An all-missing column is text.
fn infer_column<'a>(values: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;
    for s in values.filter(|s| !is_missing(s)) {
        let fits = if s.parse::<i64>().is_ok() {
            ColumnKind::Integer
        } else if s.parse::<f64>().is_ok() {
            ColumnKind::Float
        } else if parse_bool(s).is_some() {
            ColumnKind::Bool
        } else {
            return ColumnKind::Text;
        };
        kind = Some(match (kind, fits) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Integer), ColumnKind::Float)
            | (Some(ColumnKind::Float), ColumnKind::Integer) => ColumnKind::Float,
            _ => return ColumnKind::Text,
        });
    }
    kind.unwrap_or(ColumnKind::Text)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "id": 2, "message": "Weather update", "genre": "direct" },
///   ...
/// ]
/// ```
///
/// Columns appear in first-seen order; keys missing from a record are null.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_cell).unwrap_or(Cell::Null))
                .collect()
        })
        .collect();

    Table::new(columns, rows)
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) => Cell::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Cell::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Cell::Float(f)
            } else {
                Cell::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Cell::Bool(*b),
        JsonValue::Null => Cell::Null,
        other => Cell::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Nested columns are rejected.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows: Vec<Vec<Cell>> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        // row numbers in errors count across the whole file
        let offset = rows.len();
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .zip(&columns)
                .map(|(col, name)| {
                    extract_cell(col, row).with_context(|| {
                        format!("Row {}, column '{name}'", offset + row)
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(cells);
        }
    }

    Table::new(columns, rows)
}

// -- Parquet / Arrow helpers --

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<Cell> {
    if col.is_null(row) {
        return Ok(Cell::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => {
            let arr = downcast::<StringArray>(col)?;
            Cell::String(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => Cell::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => Cell::Integer(downcast::<Int32Array>(col)?.value(row) as i64),
        DataType::Int64 => Cell::Integer(downcast::<Int64Array>(col)?.value(row)),
        DataType::Float32 => Cell::Float(downcast::<Float32Array>(col)?.value(row) as f64),
        DataType::Float64 => Cell::Float(downcast::<Float64Array>(col)?.value(row)),
        DataType::Boolean => Cell::Bool(downcast::<BooleanArray>(col)?.value(row)),
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(cell)
}

fn downcast<T: 'static>(col: &Arc<dyn Array>) -> Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}
