use crate::error::ReconError;
use crate::model::{Frame, Value};

/// Map a categorical attribute onto its ordered codes (position in the
/// encoding list). Run before reconciliation so `max` compares codes, not
/// label spellings. `Missing` passes through.
pub fn encode_attribute(
    frame: &Frame,
    attribute: &str,
    encoding: &[String],
) -> Result<Frame, ReconError> {
    let idx = frame.column_index(attribute)?;
    let mut rows = frame.rows.clone();

    for row in &mut rows {
        let code = match &row[idx] {
            Value::Missing => continue,
            Value::Str(label) => encoding.iter().position(|e| e == label),
            other => {
                return Err(ReconError::EncodingMiss {
                    attribute: attribute.into(),
                    value: other.to_string(),
                })
            }
        };
        match code {
            Some(code) => row[idx] = Value::Int(code as i64),
            None => {
                return Err(ReconError::EncodingMiss {
                    attribute: attribute.into(),
                    value: row[idx].to_string(),
                })
            }
        }
    }

    Ok(Frame { columns: frame.columns.clone(), rows })
}

/// Inverse of [`encode_attribute`]: codes back to labels, so the output
/// value domain matches the input.
pub fn decode_attribute(
    frame: &Frame,
    attribute: &str,
    encoding: &[String],
) -> Result<Frame, ReconError> {
    let idx = frame.column_index(attribute)?;
    let mut rows = frame.rows.clone();

    for row in &mut rows {
        let label = match &row[idx] {
            Value::Missing => continue,
            Value::Int(code) if *code >= 0 => encoding.get(*code as usize),
            _ => None,
        };
        match label {
            Some(label) => row[idx] = Value::Str(label.clone()),
            None => {
                return Err(ReconError::EncodingMiss {
                    attribute: attribute.into(),
                    value: row[idx].to_string(),
                })
            }
        }
    }

    Ok(Frame { columns: frame.columns.clone(), rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(vals: &[Value]) -> Frame {
        Frame {
            columns: vec!["ell".into()],
            rows: vals.iter().map(|v| vec![v.clone()]).collect(),
        }
    }

    fn encoding() -> Vec<String> {
        vec!["N".into(), "Y".into()]
    }

    #[test]
    fn encode_decode_round_trip() {
        let input = frame(&[
            Value::Str("Y".into()),
            Value::Str("N".into()),
            Value::Missing,
        ]);
        let encoded = encode_attribute(&input, "ell", &encoding()).unwrap();
        assert_eq!(
            encoded.rows,
            vec![vec![Value::Int(1)], vec![Value::Int(0)], vec![Value::Missing]]
        );
        let decoded = decode_attribute(&encoded, "ell", &encoding()).unwrap();
        assert_eq!(decoded.rows, input.rows);
    }

    #[test]
    fn encode_rejects_unknown_label() {
        let input = frame(&[Value::Str("U".into())]);
        let err = encode_attribute(&input, "ell", &encoding()).unwrap_err();
        assert!(err.to_string().contains("'U' not in encoding"));
    }

    #[test]
    fn decode_rejects_out_of_range_code() {
        let input = frame(&[Value::Int(7)]);
        let err = decode_attribute(&input, "ell", &encoding()).unwrap_err();
        assert!(err.to_string().contains("'7' not in encoding"));
    }

    #[test]
    fn missing_column_is_an_error() {
        let input = frame(&[Value::Str("Y".into())]);
        assert!(encode_attribute(&input, "frpl", &encoding()).is_err());
    }
}
