use std::collections::HashSet;

use crate::error::ReconError;
use crate::model::{Frame, Value};

/// Collapse each key group to one representative row: the first in original
/// load order. After reconciliation every reconciled attribute is constant
/// within a group, so any representative would do; the choice still has to
/// be deterministic.
pub fn dedup_by_key(frame: &Frame, key_columns: &[String]) -> Result<Frame, ReconError> {
    let key_idx: Vec<usize> = key_columns
        .iter()
        .map(|c| frame.column_index(c))
        .collect::<Result<_, _>>()?;

    let mut seen: HashSet<Vec<Value>> = HashSet::new();
    let mut rows = Vec::new();

    for row in &frame.rows {
        let key: Vec<Value> = key_idx.iter().map(|&i| row[i].clone()).collect();
        if seen.insert(key) {
            rows.push(row.clone());
        }
    }

    Ok(Frame { columns: frame.columns.clone(), rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(rows: &[(&str, i64, &str)]) -> Frame {
        Frame {
            columns: vec!["id".into(), "year".into(), "status".into()],
            rows: rows
                .iter()
                .map(|(id, year, status)| {
                    vec![
                        Value::Str(id.to_string()),
                        Value::Int(*year),
                        Value::Str(status.to_string()),
                    ]
                })
                .collect(),
        }
    }

    fn keys() -> Vec<String> {
        vec!["id".into(), "year".into()]
    }

    #[test]
    fn keeps_first_row_per_key() {
        let input = frame(&[
            ("1", 2015, "first"),
            ("1", 2015, "second"),
            ("1", 2016, "other-year"),
            ("2", 2015, "other-id"),
        ]);
        let out = dedup_by_key(&input, &keys()).unwrap();
        assert_eq!(out.rows.len(), 3);
        assert_eq!(out.rows[0][2], Value::Str("first".into()));
        assert_eq!(out.rows[1][2], Value::Str("other-year".into()));
        assert_eq!(out.rows[2][2], Value::Str("other-id".into()));
    }

    #[test]
    fn already_distinct_is_a_no_op() {
        let input = frame(&[("1", 2015, "a"), ("1", 2016, "b")]);
        let out = dedup_by_key(&input, &keys()).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn unknown_key_column_is_an_error() {
        let input = frame(&[("1", 2015, "a")]);
        let err = dedup_by_key(&input, &["sid".to_string()]).unwrap_err();
        assert!(err.to_string().contains("'sid'"));
    }
}
