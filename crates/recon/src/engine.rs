use chrono::NaiveDate;

use crate::config::{PeriodType, ReconConfig, ValueType};
use crate::dedup::dedup_by_key;
use crate::encode::{decode_attribute, encode_attribute};
use crate::error::ReconError;
use crate::model::{Frame, RunMeta, RunOutput, RunSummary, Value};
use crate::reconcile::{reconcile_attribute, AttributeSpec};

/// Run the configured reconciliation against a loaded frame.
///
/// Attributes resolve in declaration order, each pass producing a new
/// frame (encode → reconcile → decode), then the frame is deduplicated to
/// one row per identifier + period.
pub fn run(config: &ReconConfig, frame: &Frame) -> Result<RunOutput, ReconError> {
    config.validate()?;
    check_columns(config, frame)?;

    let mut working = frame.clone();
    let mut attributes = Vec::new();

    for attr in &config.attributes {
        let encoded = match &attr.encoding {
            Some(encoding) => encode_attribute(&working, &attr.column, encoding)?,
            None => working,
        };

        let chain = attr.fallback_chain();
        let spec = AttributeSpec {
            identifier: &config.table.identifier,
            period: &config.table.period,
            column: &attr.column,
            scope: attr.scope,
            fallback: &chain,
        };
        let (resolved, summary) = reconcile_attribute(&encoded, &spec)?;

        working = match &attr.encoding {
            Some(encoding) => decode_attribute(&resolved, &attr.column, encoding)?,
            None => resolved,
        };
        attributes.push(summary);
    }

    let deduped = dedup_by_key(&working, &config.key_columns())?;
    let unresolved_rows = attributes.iter().map(|a| a.unresolved.len()).sum();

    Ok(RunOutput {
        meta: RunMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary: RunSummary {
            rows_in: frame.rows.len(),
            rows_out: deduped.rows.len(),
            unresolved_rows,
            attributes,
        },
        frame: deduped,
    })
}

fn check_columns(config: &ReconConfig, frame: &Frame) -> Result<(), ReconError> {
    for col in &config.table.identifier {
        frame.column_index(col)?;
    }
    frame.column_index(&config.table.period)?;
    for attr in &config.attributes {
        frame.column_index(&attr.column)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV edges
// ---------------------------------------------------------------------------

enum ColKind {
    Str,
    Int,
    Date,
}

/// Load a CSV string into a typed frame per the config: the period column
/// parses per `period_type`, int attributes as integers, everything else as
/// strings. Configured missing tokens load as `Missing` in every column.
pub fn load_csv_frame(csv_data: &str, config: &ReconConfig) -> Result<Frame, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let kinds: Vec<ColKind> = headers
        .iter()
        .map(|h| {
            if *h == config.table.period {
                match config.table.period_type {
                    PeriodType::Int => ColKind::Int,
                    PeriodType::Date => ColKind::Date,
                    PeriodType::String => ColKind::Str,
                }
            } else if config
                .attributes
                .iter()
                .any(|a| a.column == *h && a.value_type == ValueType::Int)
            {
                ColKind::Int
            } else {
                ColKind::Str
            }
        })
        .collect();

    let mut frame = Frame::new(headers);

    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ReconError::Io(e.to_string()))?;
        let mut row = Vec::with_capacity(frame.columns.len());
        for (col, kind) in kinds.iter().enumerate() {
            let field = record.get(col).unwrap_or("");
            row.push(parse_field(
                field,
                kind,
                &frame.columns[col],
                i + 1,
                &config.table.missing,
            )?);
        }
        frame.rows.push(row);
    }

    Ok(frame)
}

fn parse_field(
    field: &str,
    kind: &ColKind,
    column: &str,
    row: usize,
    missing: &[String],
) -> Result<Value, ReconError> {
    if missing.iter().any(|m| m == field) {
        return Ok(Value::Missing);
    }
    match kind {
        ColKind::Str => Ok(Value::Str(field.to_string())),
        ColKind::Int => field.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            ReconError::ValueParse {
                column: column.into(),
                row,
                value: field.into(),
            }
        }),
        ColKind::Date => NaiveDate::parse_from_str(field, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|_| ReconError::ValueParse {
                column: column.into(),
                row,
                value: field.into(),
            }),
    }
}

/// Render a frame back to CSV. `Missing` writes as the empty field.
pub fn write_csv_frame(frame: &Frame) -> Result<String, ReconError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&frame.columns)
        .map_err(|e| ReconError::Io(e.to_string()))?;
    for row in &frame.rows {
        let fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writer
            .write_record(&fields)
            .map_err(|e| ReconError::Io(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ReconError::Io(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReconError::Io(e.to_string()))
}
