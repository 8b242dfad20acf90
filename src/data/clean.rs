use std::collections::HashSet;

use log::{debug, info, warn};

use super::model::{Cell, Table};
use crate::error::CleanError;

/// Knobs for [`clean_data`].
#[derive(Debug, Clone)]
pub struct CleanOptions {
    /// Column holding the `name-digit;name-digit;...` string.
    pub categories_column: String,
    /// Column used to name rows in error messages.
    pub key_column: String,
    /// Skip rows whose category cell is null instead of failing.
    pub drop_unlabeled: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            categories_column: "categories".to_string(),
            key_column: "id".to_string(),
            drop_unlabeled: false,
        }
    }
}

/// What [`clean_data`] did, for reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanStats {
    pub labels: Vec<String>,
    pub unlabeled_dropped: usize,
    pub duplicates_dropped: usize,
}

// ---------------------------------------------------------------------------
// Segment decoding
// ---------------------------------------------------------------------------

/// Split one `name-digit` segment into its name and its 0/1 value.
/// `2` counts as set; any digit above 2 is malformed.
fn parse_segment(segment: &str, row: usize) -> Result<(&str, i64), CleanError> {
    let malformed = || CleanError::MalformedSegment {
        row,
        segment: segment.to_string(),
    };
    let (name, digit) = segment.trim().rsplit_once('-').ok_or_else(malformed)?;
    let mut chars = digit.chars();
    let value = match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_digit(10).ok_or_else(malformed)?,
        _ => return Err(malformed()),
    };
    if name.is_empty() || value > 2 {
        return Err(malformed());
    }
    Ok((name, i64::from(value != 0)))
}

/// Label names of an encoded string, in left-to-right order.
pub fn category_names(encoded: &str) -> Result<Vec<String>, CleanError> {
    label_names(encoded, 0)
}

fn label_names(encoded: &str, row: usize) -> Result<Vec<String>, CleanError> {
    let mut seen = HashSet::new();
    encoded
        .split(';')
        .map(|seg| {
            let (name, _) = parse_segment(seg, row)?;
            if !seen.insert(name) {
                return Err(CleanError::DuplicateColumn(name.to_string()));
            }
            Ok(name.to_string())
        })
        .collect()
}

/// The 0/1 value of a single segment.
pub fn decode_segment(segment: &str) -> Result<i64, CleanError> {
    parse_segment(segment, 0).map(|(_, v)| v)
}

/// Decode one row against the label names taken from the first row.
fn decode_row(encoded: &str, labels: &[String], row: usize) -> Result<Vec<Cell>, CleanError> {
    let segments: Vec<&str> = encoded.split(';').collect();
    if segments.len() != labels.len() {
        return Err(CleanError::SegmentCount {
            row,
            expected: labels.len(),
            found: segments.len(),
        });
    }
    segments
        .iter()
        .zip(labels)
        .enumerate()
        .map(|(position, (seg, expected))| {
            let (name, value) = parse_segment(seg, row)?;
            if name != expected.as_str() {
                return Err(CleanError::LabelMismatch {
                    row,
                    position,
                    expected: expected.clone(),
                    found: name.to_string(),
                });
            }
            Ok(Cell::Integer(value))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Replace the encoded category column with one 0/1 column per label and
/// drop exact-duplicate rows.
///
/// Label columns are appended to the row they were decoded from, so a row's
/// labels can never drift onto another message.
pub fn clean_data(
    mut table: Table,
    options: &CleanOptions,
) -> Result<(Table, CleanStats), CleanError> {
    let column = options.categories_column.as_str();
    let encoded = table
        .drop_column(column)
        .ok_or_else(|| CleanError::MissingColumn(column.to_string()))?;
    let key_idx = table.column_index(&options.key_column);

    let mut stats = CleanStats::default();
    let mut labels: Option<Vec<String>> = None;
    let mut rows = Vec::with_capacity(table.len());

    for (row_no, (mut row, cell)) in table.rows.into_iter().zip(encoded).enumerate() {
        let text = match &cell {
            Cell::String(s) => s.as_str(),
            Cell::Null => {
                let key = key_idx
                    .map(|k| row[k].to_string())
                    .unwrap_or_else(|| row_no.to_string());
                if options.drop_unlabeled {
                    warn!("dropping row {row_no} (key {key}): no categories");
                    stats.unlabeled_dropped += 1;
                    continue;
                }
                return Err(CleanError::MissingCategories { row: row_no, key });
            }
            other => {
                return Err(CleanError::NotText {
                    row: row_no,
                    column: column.to_string(),
                    value: other.to_string(),
                })
            }
        };

        if labels.is_none() {
            let names = label_names(text, row_no)?;
            if let Some(dup) = names.iter().find(|n| table.columns.contains(*n)) {
                return Err(CleanError::DuplicateColumn(dup.clone()));
            }
            debug!("category labels from row {row_no}: {names:?}");
            labels = Some(names);
        }
        let names = labels.as_deref().unwrap_or_default();

        row.extend(decode_row(text, names, row_no)?);
        rows.push(row);
    }

    let labels = match labels {
        Some(labels) => labels,
        None if stats.unlabeled_dropped > 0 => Vec::new(),
        None => return Err(CleanError::Empty),
    };

    table.columns.extend(labels.iter().cloned());
    table.rows = rows;
    stats.duplicates_dropped = table.drop_duplicates();
    stats.labels = labels;

    info!(
        "cleaned table: {} rows, {} labels, {} duplicates removed",
        table.len(),
        stats.labels.len(),
        stats.duplicates_dropped
    );
    Ok((table, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(categories: &[&str]) -> Table {
        Table::new(
            vec!["id".into(), "message".into(), "categories".into()],
            categories
                .iter()
                .enumerate()
                .map(|(i, c)| vec![Cell::Integer(i as i64 + 1), "msg".into(), (*c).into()])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn k_segments_give_k_columns_in_order() {
        let names = category_names("related-1;request-0;offer-2;aid_related-0").unwrap();
        assert_eq!(names, vec!["related", "request", "offer", "aid_related"]);
    }

    #[test]
    fn names_may_contain_dashes() {
        assert_eq!(category_names("search-and-rescue-1").unwrap(), vec!["search-and-rescue"]);
    }

    #[test]
    fn two_is_coerced_to_one() {
        assert_eq!(decode_segment("related-2").unwrap(), 1);
        assert_eq!(decode_segment("related-1").unwrap(), 1);
        assert_eq!(decode_segment("related-0").unwrap(), 0);
        assert_eq!(decode_segment(" related-0 ").unwrap(), 0);
    }

    #[test]
    fn malformed_segments_are_rejected() {
        assert!(decode_segment("related").is_err());
        assert!(decode_segment("related-x").is_err());
        assert!(decode_segment("related-10").is_err());
        assert_eq!(
            decode_segment("related-3").unwrap_err(),
            CleanError::MalformedSegment {
                row: 0,
                segment: "related-3".into()
            }
        );
        assert!(decode_segment("-1").is_err());
    }

    #[test]
    fn labels_are_appended_and_binary() {
        let (t, stats) = clean_data(
            joined(&["related-1;request-0", "related-2;request-1"]),
            &CleanOptions::default(),
        )
        .unwrap();
        assert_eq!(t.columns, vec!["id", "message", "related", "request"]);
        assert_eq!(stats.labels, vec!["related", "request"]);
        assert_eq!(t.column("related").unwrap(), vec![&Cell::Integer(1), &Cell::Integer(1)]);
        assert_eq!(t.column("request").unwrap(), vec![&Cell::Integer(0), &Cell::Integer(1)]);
    }

    #[test]
    fn segment_count_mismatch_fails_fast() {
        let err = clean_data(
            joined(&["related-1;request-0", "related-1"]),
            &CleanOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CleanError::SegmentCount {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn reordered_labels_fail_fast() {
        let err = clean_data(
            joined(&["related-1;request-0", "request-0;related-1"]),
            &CleanOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CleanError::LabelMismatch { row: 1, position: 0, .. }));
    }

    #[test]
    fn duplicates_are_removed_after_decoding() {
        let mut t = joined(&["related-1", "related-1"]);
        t.rows[1][0] = Cell::Integer(1);
        let (t, stats) = clean_data(t, &CleanOptions::default()).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(stats.duplicates_dropped, 1);
    }

    #[test]
    fn null_categories_fail_unless_dropped() {
        let mut t = joined(&["related-1", "related-0"]);
        t.rows[0][2] = Cell::Null;
        let err = clean_data(t.clone(), &CleanOptions::default()).unwrap_err();
        assert_eq!(
            err,
            CleanError::MissingCategories {
                row: 0,
                key: "1".into()
            }
        );

        let options = CleanOptions {
            drop_unlabeled: true,
            ..CleanOptions::default()
        };
        let (t, stats) = clean_data(t, &options).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(stats.unlabeled_dropped, 1);
        assert_eq!(t.rows[0][0], Cell::Integer(2));
    }

    #[test]
    fn missing_column_and_empty_table() {
        let t = Table::new(vec!["id".into()], vec![]).unwrap();
        assert_eq!(
            clean_data(t, &CleanOptions::default()).unwrap_err(),
            CleanError::MissingColumn("categories".into())
        );
        assert_eq!(
            clean_data(joined(&[]), &CleanOptions::default()).unwrap_err(),
            CleanError::Empty
        );
    }

    #[test]
    fn repeated_label_names_are_rejected() {
        assert_eq!(
            category_names("related-1;request-0;related-0").unwrap_err(),
            CleanError::DuplicateColumn("related".into())
        );
        let err = clean_data(joined(&["related-1;related-0"]), &CleanOptions::default())
            .unwrap_err();
        assert_eq!(err, CleanError::DuplicateColumn("related".into()));
    }

    #[test]
    fn label_colliding_with_column_is_rejected() {
        let err = clean_data(joined(&["message-1"]), &CleanOptions::default()).unwrap_err();
        assert_eq!(err, CleanError::DuplicateColumn("message".into()));
    }
}
