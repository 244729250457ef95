use std::collections::BTreeMap;

use crate::model::Value;

/// Outcome of a frequency-mode computation. A tie among most-frequent
/// values is an explicit outcome, never an in-band data value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeOutcome {
    /// Exactly one value attains the maximum count.
    Unique(Value),
    /// Two or more values tie for the maximum count.
    Tie,
    /// No non-missing values at all.
    Empty,
}

/// Most frequent non-missing value of a sequence.
///
/// This is a business-rule mode, not a statistical one: any tie for the
/// maximum count means "no mode" and the caller falls back to its policy.
pub fn mode_of<'a, I>(values: I) -> ModeOutcome
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut counts: BTreeMap<&Value, usize> = BTreeMap::new();
    for v in values {
        if !v.is_missing() {
            *counts.entry(v).or_insert(0) += 1;
        }
    }

    let max = match counts.values().max() {
        Some(&max) => max,
        None => return ModeOutcome::Empty,
    };

    let mut at_max = counts.iter().filter(|(_, &c)| c == max);
    let first = at_max.next().map(|(v, _)| (*v).clone());
    match (first, at_max.next()) {
        (Some(v), None) => ModeOutcome::Unique(v),
        _ => ModeOutcome::Tie,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(vals: &[&str]) -> Vec<Value> {
        vals.iter().map(|s| Value::Str(s.to_string())).collect()
    }

    #[test]
    fn strict_majority_wins() {
        let vals = strs(&["F", "F", "R"]);
        assert_eq!(mode_of(&vals), ModeOutcome::Unique(Value::Str("F".into())));
    }

    #[test]
    fn tie_is_no_mode() {
        let vals = strs(&["F", "R"]);
        assert_eq!(mode_of(&vals), ModeOutcome::Tie);
        let vals = strs(&["F", "F", "R", "R", "N"]);
        assert_eq!(mode_of(&vals), ModeOutcome::Tie);
    }

    #[test]
    fn singleton_is_its_own_mode() {
        let vals = strs(&["Y"]);
        assert_eq!(mode_of(&vals), ModeOutcome::Unique(Value::Str("Y".into())));
    }

    #[test]
    fn missing_values_do_not_count() {
        let vals = vec![
            Value::Missing,
            Value::Str("N".into()),
            Value::Missing,
            Value::Missing,
        ];
        assert_eq!(mode_of(&vals), ModeOutcome::Unique(Value::Str("N".into())));
    }

    #[test]
    fn all_missing_is_empty() {
        let vals = vec![Value::Missing, Value::Missing];
        assert_eq!(mode_of(&vals), ModeOutcome::Empty);
        assert_eq!(mode_of(std::iter::empty::<&Value>()), ModeOutcome::Empty);
    }
}
