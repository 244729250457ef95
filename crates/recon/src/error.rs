use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad scope, duplicate column, etc.).
    ConfigValidation(String),
    /// A referenced column does not exist in the frame.
    MissingColumn { column: String },
    /// A `max` fallback was requested for an attribute with no order
    /// (string-typed and no encoding).
    UnorderedFallback { attribute: String },
    /// A value in the data is absent from the attribute's ordered encoding.
    EncodingMiss { attribute: String, value: String },
    /// A typed CSV field that does not parse.
    ValueParse { column: String, row: usize, value: String },
    /// IO error (CSV read/write).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { column } => write!(f, "missing column '{column}'"),
            Self::UnorderedFallback { attribute } => {
                write!(
                    f,
                    "attribute '{attribute}': 'max' fallback requires an int type or an ordered encoding"
                )
            }
            Self::EncodingMiss { attribute, value } => {
                write!(f, "attribute '{attribute}': value '{value}' not in encoding")
            }
            Self::ValueParse { column, row, value } => {
                write!(f, "column '{column}', row {row}: cannot parse '{value}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
