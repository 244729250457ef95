use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::ser::Serializer;
use serde::Serialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A single typed cell. The variant order gives `Value` a total order
/// (`Missing` sorts first), so grouping and frequency maps are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    Missing,
    Int(i64),
    Date(NaiveDate),
    Str(String),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// CSV rendering: `Missing` is the empty field, dates are `%Y-%m-%d`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Int(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// Audit rendering: natural JSON (null / number / string), not enum tags.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Missing => serializer.serialize_none(),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            Self::Str(s) => serializer.serialize_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Column-indexed in-memory table. Rows keep their load order; original
/// order is the stable tie-break for every grouping operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn column_index(&self, name: &str) -> Result<usize, ReconError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ReconError::MissingColumn { column: name.into() })
    }
}

// ---------------------------------------------------------------------------
// Resolution steps
// ---------------------------------------------------------------------------

/// Which step of the policy resolved a key group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStep {
    Mode,
    Lag,
    Lead,
    Max,
    Last,
}

impl fmt::Display for ResolveStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mode => write!(f, "mode"),
            Self::Lag => write!(f, "lag"),
            Self::Lead => write!(f, "lead"),
            Self::Max => write!(f, "max"),
            Self::Last => write!(f, "last"),
        }
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

/// A row whose group exhausted every fallback and carries `Missing` in the
/// output. Surfaced per row so the caller can decide whether that is
/// acceptable; never a hard failure.
#[derive(Debug, Clone, Serialize)]
pub struct Unresolved {
    /// 1-based data row in the input (header excluded).
    pub row: usize,
    /// Identifier values plus period value of the row.
    pub key: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeSummary {
    pub attribute: String,
    pub groups: usize,
    /// Step name -> number of key groups resolved by that step.
    pub resolved_by: BTreeMap<String, usize>,
    pub changed_rows: usize,
    pub unresolved: Vec<Unresolved>,
}

impl AttributeSummary {
    pub fn new(attribute: &str) -> Self {
        Self {
            attribute: attribute.into(),
            groups: 0,
            resolved_by: BTreeMap::new(),
            changed_rows: 0,
            unresolved: Vec::new(),
        }
    }

    pub fn record(&mut self, step: ResolveStep) {
        *self.resolved_by.entry(step.to_string()).or_insert(0) += 1;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub rows_in: usize,
    pub rows_out: usize,
    pub unresolved_rows: usize,
    pub attributes: Vec<AttributeSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub meta: RunMeta,
    pub summary: RunSummary,
    /// The cleaned frame travels as CSV, not inside the JSON audit.
    #[serde(skip)]
    pub frame: Frame,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_ordering() {
        assert!(Value::Missing < Value::Int(0));
        assert!(Value::Int(0) < Value::Int(1));
        assert!(Value::Int(9) < Value::Str("a".into()));
        assert!(Value::Str("F".into()) < Value::Str("R".into()));
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::Missing.to_string(), "");
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Str("Y".into()).to_string(), "Y");
        let d = NaiveDate::from_ymd_opt(2015, 9, 1).unwrap();
        assert_eq!(Value::Date(d).to_string(), "2015-09-01");
    }

    #[test]
    fn value_serializes_as_natural_json() {
        let vals = vec![Value::Missing, Value::Int(3), Value::Str("Y".into())];
        let json = serde_json::to_string(&vals).unwrap();
        assert_eq!(json, r#"[null,3,"Y"]"#);
    }

    #[test]
    fn column_index_reports_missing() {
        let frame = Frame::new(vec!["a".into(), "b".into()]);
        assert_eq!(frame.column_index("b").unwrap(), 1);
        let err = frame.column_index("c").unwrap_err();
        assert!(err.to_string().contains("'c'"));
    }
}
