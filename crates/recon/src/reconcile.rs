use std::cmp::Ordering;

use crate::config::{AttributeScope, FallbackStep};
use crate::error::ReconError;
use crate::mode::{mode_of, ModeOutcome};
use crate::model::{AttributeSummary, Frame, ResolveStep, Unresolved, Value};

/// Everything [`reconcile_attribute`] needs to know about one attribute.
pub struct AttributeSpec<'a> {
    pub identifier: &'a [String],
    pub period: &'a str,
    pub column: &'a str,
    pub scope: AttributeScope,
    pub fallback: &'a [FallbackStep],
}

/// Resolve one attribute to a single value per key group.
///
/// Per group: a unique frequency mode wins outright; a tie walks the
/// configured fallback chain; an all-missing group stays missing and is
/// reported per row. Returns a new frame plus the audit of which step
/// resolved each group; the input frame is never mutated.
///
/// Lag and lead read the *input* values of the rows adjacent to the group
/// in the identifier's period-ordered sequence, not values resolved
/// earlier in the same pass.
pub fn reconcile_attribute(
    frame: &Frame,
    spec: &AttributeSpec<'_>,
) -> Result<(Frame, AttributeSummary), ReconError> {
    let id_idx: Vec<usize> = spec
        .identifier
        .iter()
        .map(|c| frame.column_index(c))
        .collect::<Result<_, _>>()?;
    let period_idx = frame.column_index(spec.period)?;
    let attr_idx = frame.column_index(spec.column)?;

    // Identity sequence: identifier, then period, then load order (stable).
    let mut order: Vec<usize> = (0..frame.rows.len()).collect();
    order.sort_by(|&a, &b| {
        let (ra, rb) = (&frame.rows[a], &frame.rows[b]);
        for &i in &id_idx {
            match ra[i].cmp(&rb[i]) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        ra[period_idx].cmp(&rb[period_idx]).then(a.cmp(&b))
    });

    let mut rows = frame.rows.clone();
    let mut summary = AttributeSummary::new(spec.column);

    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && same_identity(frame, &id_idx, order[start], order[end]) {
            end += 1;
        }
        resolve_identity_run(
            frame,
            &mut rows,
            &order[start..end],
            &id_idx,
            period_idx,
            attr_idx,
            spec,
            &mut summary,
        );
        start = end;
    }

    summary.unresolved.sort_by_key(|u| u.row);

    Ok((
        Frame { columns: frame.columns.clone(), rows },
        summary,
    ))
}

fn same_identity(frame: &Frame, id_idx: &[usize], a: usize, b: usize) -> bool {
    id_idx.iter().all(|&i| frame.rows[a][i] == frame.rows[b][i])
}

#[allow(clippy::too_many_arguments)]
fn resolve_identity_run(
    frame: &Frame,
    rows: &mut [Vec<Value>],
    run: &[usize],
    id_idx: &[usize],
    period_idx: usize,
    attr_idx: usize,
    spec: &AttributeSpec<'_>,
    summary: &mut AttributeSummary,
) {
    // Key groups: the whole run (identifier scope) or one per period value.
    let mut bounds: Vec<(usize, usize)> = Vec::new();
    match spec.scope {
        AttributeScope::Identifier => bounds.push((0, run.len())),
        AttributeScope::Period => {
            let mut s = 0;
            for i in 1..=run.len() {
                if i == run.len()
                    || frame.rows[run[i]][period_idx] != frame.rows[run[s]][period_idx]
                {
                    bounds.push((s, i));
                    s = i;
                }
            }
        }
    }

    for &(gs, ge) in &bounds {
        summary.groups += 1;
        match resolve_group(frame, run, gs, ge, attr_idx, spec.fallback) {
            Some((value, step)) => {
                summary.record(step);
                for &r in &run[gs..ge] {
                    if rows[r][attr_idx] != value {
                        summary.changed_rows += 1;
                        rows[r][attr_idx] = value.clone();
                    }
                }
            }
            None => {
                for &r in &run[gs..ge] {
                    if !rows[r][attr_idx].is_missing() {
                        summary.changed_rows += 1;
                        rows[r][attr_idx] = Value::Missing;
                    }
                    let mut key: Vec<Value> =
                        id_idx.iter().map(|&i| frame.rows[r][i].clone()).collect();
                    key.push(frame.rows[r][period_idx].clone());
                    summary.unresolved.push(Unresolved { row: r + 1, key });
                }
            }
        }
    }
}

/// One key group against the policy. `run[start..end]` is the group;
/// `run` is the whole identity sequence, so `run[start - 1]` / `run[end]`
/// are the lag / lead neighbors.
fn resolve_group(
    frame: &Frame,
    run: &[usize],
    start: usize,
    end: usize,
    attr_idx: usize,
    fallback: &[FallbackStep],
) -> Option<(Value, ResolveStep)> {
    let group = &run[start..end];
    match mode_of(group.iter().map(|&r| &frame.rows[r][attr_idx])) {
        ModeOutcome::Unique(v) => return Some((v, ResolveStep::Mode)),
        // Neighbors are consulted on a tie only; an all-missing group
        // stays missing so a second pass is always a no-op.
        ModeOutcome::Empty => return None,
        ModeOutcome::Tie => {}
    }

    for step in fallback {
        let candidate = match step {
            FallbackStep::Lag if start > 0 => non_missing(&frame.rows[run[start - 1]][attr_idx]),
            FallbackStep::Lead if end < run.len() => non_missing(&frame.rows[run[end]][attr_idx]),
            FallbackStep::Max => group
                .iter()
                .map(|&r| &frame.rows[r][attr_idx])
                .filter(|v| !v.is_missing())
                .max(),
            FallbackStep::Last => group
                .iter()
                .rev()
                .map(|&r| &frame.rows[r][attr_idx])
                .find(|v| !v.is_missing()),
            _ => None,
        };
        if let Some(v) = candidate {
            return Some((v.clone(), step.resolve_step()));
        }
    }

    None
}

fn non_missing(v: &Value) -> Option<&Value> {
    if v.is_missing() {
        None
    } else {
        Some(v)
    }
}
