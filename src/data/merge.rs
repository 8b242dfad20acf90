use std::collections::HashMap;

use anyhow::{Context, Result};

use super::model::{Cell, Table};

/// Left outer join of `right` onto `left` by the `key` column.
///
/// Left row order is preserved. A left row with several matches yields one
/// row per match; a left row with none gets null right-hand cells. Non-key
/// columns present on both sides are suffixed `_x` (left) and `_y` (right).
pub fn left_join(left: &Table, right: &Table, key: &str) -> Result<Table> {
    let lk = left
        .column_index(key)
        .with_context(|| format!("left table has no '{key}' column"))?;
    let rk = right
        .column_index(key)
        .with_context(|| format!("right table has no '{key}' column"))?;

    let right_cols: Vec<usize> = (0..right.columns.len()).filter(|&i| i != rk).collect();

    let mut columns: Vec<String> = left
        .columns
        .iter()
        .map(|c| {
            if c != key && right.columns.contains(c) {
                format!("{c}_x")
            } else {
                c.clone()
            }
        })
        .collect();
    columns.extend(right_cols.iter().map(|&i| {
        let c = &right.columns[i];
        if left.columns.contains(c) {
            format!("{c}_y")
        } else {
            c.clone()
        }
    }));

    // key -> right row indices, in right-table order
    let mut index: HashMap<Cell, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows.iter().enumerate() {
        if !row[rk].is_null() {
            index.entry(join_key(&row[rk])).or_default().push(i);
        }
    }

    let mut rows = Vec::with_capacity(left.len());
    for lrow in &left.rows {
        match index.get(&join_key(&lrow[lk])) {
            Some(matches) if !lrow[lk].is_null() => {
                for &ri in matches {
                    let mut row = lrow.clone();
                    row.extend(right_cols.iter().map(|&c| right.rows[ri][c].clone()));
                    rows.push(row);
                }
            }
            _ => {
                let mut row = lrow.clone();
                row.extend(right_cols.iter().map(|_| Cell::Null));
                rows.push(row);
            }
        }
    }

    Table::new(columns, rows)
}

/// Integral floats compare as integers, so `1` in one file meets `1.0` in
/// the other.
fn join_key(cell: &Cell) -> Cell {
    match cell {
        Cell::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Cell::Integer(*f as i64)
        }
        other => other.clone(),
    }
}
