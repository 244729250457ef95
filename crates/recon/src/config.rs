use serde::Deserialize;

use crate::error::ReconError;
use crate::model::ResolveStep;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    pub table: TableConfig,
    /// Attributes are an array of tables: reconciliation order is part of
    /// the contract, and a named map would drop declaration order.
    pub attributes: Vec<AttributeConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    /// CSV file, resolved relative to the config file's directory.
    pub file: String,
    /// Columns whose combined value identifies an entity (e.g. student id).
    pub identifier: Vec<String>,
    /// Column that orders an identifier's records chronologically.
    pub period: String,
    #[serde(default)]
    pub period_type: PeriodType,
    /// Tokens that load as the missing sentinel.
    #[serde(default = "default_missing")]
    pub missing: Vec<String>,
}

fn default_missing() -> Vec<String> {
    vec![String::new()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Int,
    Date,
    String,
}

impl Default for PeriodType {
    fn default() -> Self {
        Self::Int
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AttributeConfig {
    pub column: String,
    pub scope: AttributeScope,
    #[serde(rename = "type", default)]
    pub value_type: ValueType,
    /// Ordered label list for categoricals; position is the code.
    #[serde(default)]
    pub encoding: Option<Vec<String>>,
    /// Steps tried after the mode, in order. Defaults per scope.
    #[serde(default)]
    pub fallback: Option<Vec<FallbackStep>>,
}

impl AttributeConfig {
    /// Effective fallback chain: explicit, or the scope's documented default.
    pub fn fallback_chain(&self) -> Vec<FallbackStep> {
        match &self.fallback {
            Some(steps) => steps.clone(),
            None => match self.scope {
                AttributeScope::Period => {
                    vec![FallbackStep::Lag, FallbackStep::Lead, FallbackStep::Max]
                }
                AttributeScope::Identifier => vec![FallbackStep::Last],
            },
        }
    }

    /// Whether the attribute's domain is totally ordered (`max` needs this).
    pub fn orderable(&self) -> bool {
        self.value_type == ValueType::Int || self.encoding.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeScope {
    /// Constant for the identifier's entire lifetime (e.g. demographics).
    Identifier,
    /// Constant within identifier + period, may change across periods.
    Period,
}

impl std::fmt::Display for AttributeScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identifier => write!(f, "identifier"),
            Self::Period => write!(f, "period"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Int,
}

impl Default for ValueType {
    fn default() -> Self {
        Self::String
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStep {
    Lag,
    Lead,
    Max,
    Last,
}

impl FallbackStep {
    pub fn resolve_step(self) -> ResolveStep {
        match self {
            Self::Lag => ResolveStep::Lag,
            Self::Lead => ResolveStep::Lead,
            Self::Max => ResolveStep::Max,
            Self::Last => ResolveStep::Last,
        }
    }
}

impl std::fmt::Display for FallbackStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.resolve_step())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub csv: Option<String>,
    #[serde(default)]
    pub audit: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The dedup key: identifier columns plus the period column.
    pub fn key_columns(&self) -> Vec<String> {
        let mut cols = self.table.identifier.clone();
        cols.push(self.table.period.clone());
        cols
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let table = &self.table;

        if table.identifier.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one identifier column is required".into(),
            ));
        }

        for (i, col) in table.identifier.iter().enumerate() {
            if table.identifier[..i].contains(col) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate identifier column '{col}'"
                )));
            }
        }

        if table.identifier.contains(&table.period) {
            return Err(ReconError::ConfigValidation(format!(
                "period column '{}' is also an identifier column",
                table.period
            )));
        }

        if self.attributes.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one attribute is required".into(),
            ));
        }

        for (i, attr) in self.attributes.iter().enumerate() {
            if self.attributes[..i].iter().any(|a| a.column == attr.column) {
                return Err(ReconError::ConfigValidation(format!(
                    "attribute '{}' listed twice",
                    attr.column
                )));
            }
            if table.identifier.contains(&attr.column) || attr.column == table.period {
                return Err(ReconError::ConfigValidation(format!(
                    "attribute '{}' is a key column",
                    attr.column
                )));
            }

            if let Some(encoding) = &attr.encoding {
                if attr.value_type != ValueType::String {
                    return Err(ReconError::ConfigValidation(format!(
                        "attribute '{}': encoding only applies to string attributes",
                        attr.column
                    )));
                }
                if encoding.is_empty() {
                    return Err(ReconError::ConfigValidation(format!(
                        "attribute '{}': encoding must not be empty",
                        attr.column
                    )));
                }
                for (i, label) in encoding.iter().enumerate() {
                    if encoding[..i].contains(label) {
                        return Err(ReconError::ConfigValidation(format!(
                            "attribute '{}': duplicate encoding label '{label}'",
                            attr.column
                        )));
                    }
                }
            }

            let chain = attr.fallback_chain();
            for (i, step) in chain.iter().enumerate() {
                if chain[..i].contains(step) {
                    return Err(ReconError::ConfigValidation(format!(
                        "attribute '{}': fallback step '{step}' listed twice",
                        attr.column
                    )));
                }
                match step {
                    FallbackStep::Lag | FallbackStep::Lead => {
                        if attr.scope != AttributeScope::Period {
                            return Err(ReconError::ConfigValidation(format!(
                                "attribute '{}': '{step}' requires period scope",
                                attr.column
                            )));
                        }
                    }
                    FallbackStep::Max => {
                        if !attr.orderable() {
                            return Err(ReconError::UnorderedFallback {
                                attribute: attr.column.clone(),
                            });
                        }
                    }
                    FallbackStep::Last => {}
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "Student enrollment cleanup"

[table]
file = "enrollments.csv"
identifier = ["student_id"]
period = "school_year"
missing = ["", "NA"]

[[attributes]]
column = "race_ethnicity"
scope = "identifier"

[[attributes]]
column = "ell"
scope = "period"
encoding = ["N", "Y"]

[[attributes]]
column = "grade"
scope = "period"
type = "int"

[output]
csv = "clean.csv"
"#;

    #[test]
    fn parse_valid() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Student enrollment cleanup");
        assert_eq!(config.table.identifier, vec!["student_id"]);
        assert_eq!(config.table.period, "school_year");
        assert_eq!(config.table.period_type, PeriodType::Int);
        assert_eq!(config.table.missing, vec!["".to_string(), "NA".to_string()]);
        assert_eq!(config.attributes.len(), 3);
        assert_eq!(config.output.csv.as_deref(), Some("clean.csv"));
        assert!(config.output.audit.is_none());
        assert_eq!(
            config.key_columns(),
            vec!["student_id".to_string(), "school_year".to_string()]
        );
    }

    #[test]
    fn attribute_order_is_declaration_order() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        let columns: Vec<&str> = config.attributes.iter().map(|a| a.column.as_str()).collect();
        assert_eq!(columns, vec!["race_ethnicity", "ell", "grade"]);
    }

    #[test]
    fn fallback_defaults_per_scope() {
        let config = ReconConfig::from_toml(VALID).unwrap();
        assert_eq!(
            config.attributes[0].fallback_chain(),
            vec![FallbackStep::Last]
        );
        assert_eq!(
            config.attributes[1].fallback_chain(),
            vec![FallbackStep::Lag, FallbackStep::Lead, FallbackStep::Max]
        );
    }

    #[test]
    fn explicit_fallback_wins() {
        let input = r#"
name = "Explicit"

[table]
file = "a.csv"
identifier = ["id"]
period = "year"

[[attributes]]
column = "frpl"
scope = "period"
encoding = ["N", "R", "F"]
fallback = ["max", "lag"]
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(
            config.attributes[0].fallback_chain(),
            vec![FallbackStep::Max, FallbackStep::Lag]
        );
    }

    #[test]
    fn reject_lag_outside_period_scope() {
        let input = r#"
name = "Bad"

[table]
file = "a.csv"
identifier = ["id"]
period = "year"

[[attributes]]
column = "gender"
scope = "identifier"
fallback = ["lag"]
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("requires period scope"));
    }

    #[test]
    fn reject_max_without_order() {
        let input = r#"
name = "Bad"

[table]
file = "a.csv"
identifier = ["id"]
period = "year"

[[attributes]]
column = "ell"
scope = "period"
"#;
        // Default period chain ends in max, but "ell" has no encoding.
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("'max' fallback requires"));
    }

    #[test]
    fn reject_attribute_that_is_a_key() {
        let input = r#"
name = "Bad"

[table]
file = "a.csv"
identifier = ["id"]
period = "year"

[[attributes]]
column = "year"
scope = "identifier"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("key column"));
    }

    #[test]
    fn reject_duplicate_fallback_step() {
        let input = r#"
name = "Bad"

[table]
file = "a.csv"
identifier = ["id"]
period = "year"

[[attributes]]
column = "ell"
scope = "period"
encoding = ["N", "Y"]
fallback = ["lag", "lag", "max"]
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn reject_encoding_on_int() {
        let input = r#"
name = "Bad"

[table]
file = "a.csv"
identifier = ["id"]
period = "year"

[[attributes]]
column = "grade"
scope = "period"
type = "int"
encoding = ["K", "1"]
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("only applies to string"));
    }

    #[test]
    fn reject_unknown_fallback_step() {
        let input = r#"
name = "Bad"

[table]
file = "a.csv"
identifier = ["id"]
period = "year"

[[attributes]]
column = "ell"
scope = "period"
fallback = ["median"]
"#;
        let err = ReconConfig::from_toml(input);
        assert!(err.is_err(), "unknown step should fail deserialization");
    }
}
