use std::path::Path;

use log::{debug, info};
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection};

use super::model::{Cell, Table};
use crate::error::PersistError;

/// What to do when the destination table already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum IfExists {
    /// Drop the old table and write a fresh one.
    #[default]
    Replace,
    /// Keep existing rows and insert after them.
    Append,
    /// Refuse to touch an existing table.
    Fail,
}

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Cell::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Cell::Integer(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            Cell::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
            Cell::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            Cell::Null => ToSqlOutput::Owned(Value::Null),
        })
    }
}

/// Table name for a database path: base name, minus `.db`, plus `_table`.
/// Anything outside `[A-Za-z0-9_]` becomes `_`.
pub fn table_name_for(db_path: &Path) -> String {
    let base = db_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output");
    let stem = base.strip_suffix(".db").unwrap_or(base);
    let mut name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    name.push_str("_table");
    name
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQLite column type for a column's cells. Nulls don't vote.
fn sql_type<'a>(cells: impl Iterator<Item = &'a Cell>) -> &'static str {
    let mut ty = None;
    for cell in cells {
        let this = match cell {
            Cell::Null => continue,
            Cell::Integer(_) | Cell::Bool(_) => "INTEGER",
            Cell::Float(_) => "REAL",
            Cell::String(_) => return "TEXT",
        };
        ty = match (ty, this) {
            (None, t) => Some(t),
            (Some("REAL"), _) | (_, "REAL") => Some("REAL"),
            (Some(t), _) => Some(t),
        };
    }
    ty.unwrap_or("TEXT")
}

fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Write `table` into the SQLite file at `db_path`, creating the file if
/// needed. Returns the table name used. The whole write is one
/// transaction; the row index is never stored.
pub fn save_data(
    table: &Table,
    db_path: &Path,
    if_exists: IfExists,
) -> Result<String, PersistError> {
    let name = table_name_for(db_path);
    let ident = quote_ident(&name);
    let mut conn = Connection::open(db_path)?;
    let tx = conn.transaction()?;

    let exists = table_exists(&tx, &name)?;
    match (exists, if_exists) {
        (true, IfExists::Fail) => return Err(PersistError::TableExists(name)),
        (true, IfExists::Replace) => {
            debug!("dropping existing table {name}");
            tx.execute(&format!("DROP TABLE {ident}"), [])?;
        }
        _ => {}
    }

    if !exists || if_exists == IfExists::Replace {
        let defs: Vec<String> = table
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let ty = sql_type(table.rows.iter().map(|row| &row[i]));
                format!("{} {ty}", quote_ident(col))
            })
            .collect();
        tx.execute(&format!("CREATE TABLE {ident} ({})", defs.join(", ")), [])?;
    }

    {
        let cols: Vec<String> = table.columns.iter().map(|c| quote_ident(c)).collect();
        let placeholders: Vec<String> = (1..=cols.len()).map(|i| format!("?{i}")).collect();
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {ident} ({}) VALUES ({})",
            cols.join(", "),
            placeholders.join(", ")
        ))?;
        for row in &table.rows {
            stmt.execute(params_from_iter(row.iter()))?;
        }
    }
    tx.commit()?;

    info!(
        "wrote {} rows to {} in {}",
        table.len(),
        name,
        db_path.display()
    );
    Ok(name)
}

/// Read a persisted table back into memory, columns in table order.
pub fn load_table(db_path: &Path, name: &str) -> Result<Table, PersistError> {
    let conn = Connection::open(db_path)?;
    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", quote_ident(name)))?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let width = columns.len();

    let mut rows = Vec::new();
    let mut query = stmt.query([])?;
    while let Some(row) = query.next()? {
        let cells = (0..width)
            .map(|i| {
                row.get_ref(i).map(|v| match v {
                    ValueRef::Null => Cell::Null,
                    ValueRef::Integer(i) => Cell::Integer(i),
                    ValueRef::Real(f) => Cell::Float(f),
                    ValueRef::Text(t) | ValueRef::Blob(t) => {
                        Cell::String(String::from_utf8_lossy(t).into_owned())
                    }
                })
            })
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.push(cells);
    }

    Ok(Table { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaned(n: i64) -> Table {
        Table::new(
            vec!["id".into(), "message".into(), "related".into()],
            (1..=n)
                .map(|i| vec![Cell::Integer(i), "msg".into(), Cell::Integer(i % 2)])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn table_name_uses_base_name() {
        assert_eq!(table_name_for(Path::new("Output.db")), "Output_table");
        assert_eq!(
            table_name_for(Path::new("data/DisasterResponse.db")),
            "DisasterResponse_table"
        );
        assert_eq!(table_name_for(Path::new("my out.sqlite")), "my_out_sqlite_table");
    }

    #[test]
    fn sql_type_widens_and_ignores_nulls() {
        let cells = [Cell::Null, Cell::Integer(1), Cell::Float(0.5)];
        assert_eq!(sql_type(cells.iter()), "REAL");
        let cells = [Cell::Bool(true), Cell::Integer(1)];
        assert_eq!(sql_type(cells.iter()), "INTEGER");
        let cells = [Cell::Integer(1), "x".into()];
        assert_eq!(sql_type(cells.iter()), "TEXT");
        assert_eq!(sql_type([Cell::Null].iter()), "TEXT");
    }

    #[test]
    fn replace_does_not_double_rows() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("Output.db");

        assert_eq!(save_data(&cleaned(3), &db, IfExists::Replace).unwrap(), "Output_table");
        save_data(&cleaned(2), &db, IfExists::Replace).unwrap();

        let back = load_table(&db, "Output_table").unwrap();
        assert_eq!(back, cleaned(2));
    }

    #[test]
    fn append_and_fail_modes() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("Output.db");

        save_data(&cleaned(2), &db, IfExists::Append).unwrap();
        save_data(&cleaned(2), &db, IfExists::Append).unwrap();
        assert_eq!(load_table(&db, "Output_table").unwrap().len(), 4);

        let err = save_data(&cleaned(1), &db, IfExists::Fail).unwrap_err();
        assert!(matches!(err, PersistError::TableExists(name) if name == "Output_table"));
        assert_eq!(load_table(&db, "Output_table").unwrap().len(), 4);
    }

    #[test]
    fn nulls_and_quotes_survive() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("quotes.db");
        let table = Table::new(
            vec!["id".into(), "say \"hi\"".into()],
            vec![vec![Cell::Integer(1), Cell::Null], vec![Cell::Integer(2), "it's".into()]],
        )
        .unwrap();
        save_data(&table, &db, IfExists::Replace).unwrap();
        assert_eq!(load_table(&db, "quotes_table").unwrap(), table);
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let err = save_data(&cleaned(1), Path::new("/nonexistent/dir/out.db"), IfExists::Replace);
        assert!(err.is_err());
    }
}
