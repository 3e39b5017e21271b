use crate::error::{FetchError, FetchResult};
use crate::locator::LocatedRow;
use crate::source::{cell_at, Pending};
use crate::types::{Aggregation, ColumnDetail, GoalComparison};
use crate::util::{column_letter, parse_int_cell, parse_locale_number, round1};
use log::{debug, warn};

/// Sum columns `start..=end` of `row` and compare against `total_col`.
///
/// Blank or non-numeric cells count as 0. A mismatch is flagged in the
/// result and logged, never raised.
pub fn aggregate(
    header: &[String],
    row: &LocatedRow<'_>,
    start: usize,
    end: usize,
    total_col: usize,
) -> Aggregation {
    let mut sum = 0i64;
    let mut overflowed = false;
    let mut columns = Vec::new();
    for col in start..=end {
        let value = parse_int_cell(cell_at(row.cells, col));
        overflowed |= is_saturated(value);
        sum = match sum.checked_add(value) {
            Some(s) => s,
            None => {
                overflowed = true;
                sum.saturating_add(value)
            }
        };
        let label = match cell_at(header, col).trim() {
            "" => format!("Column {}", column_letter(col)),
            h => h.to_string(),
        };
        debug!("  {}: {}", label, value);
        columns.push(ColumnDetail {
            column: label,
            value,
        });
    }
    let reported_total = parse_int_cell(cell_at(row.cells, total_col));
    overflowed |= is_saturated(reported_total);
    if overflowed {
        warn!("order counts on row {} exceed the integer range", row.sheet_row);
    }
    let divergent = sum != reported_total;
    if divergent {
        warn!(
            "computed sum {} differs from reported total {} (row {})",
            sum, reported_total, row.sheet_row
        );
    }
    Aggregation {
        sheet_row: row.sheet_row,
        sum,
        reported_total,
        columns,
        divergent,
        overflowed,
    }
}

fn is_saturated(value: i64) -> bool {
    value == i64::MAX || value == -i64::MAX
}

impl GoalComparison {
    /// Compare the realized total against the goal cell. An unreachable goal
    /// degrades to a goal of 0, which counts as met.
    pub fn evaluate(reported_total: i64, goal: Result<f64, FetchError>) -> Self {
        let (goal, goal_available) = match goal {
            Ok(g) => (g, true),
            Err(e) => {
                warn!("goal cell unavailable, using 0: {}", e);
                (0.0, false)
            }
        };
        let total = reported_total as f64;
        let percentage = if goal > 0.0 {
            round1(total / goal * 100.0)
        } else {
            0.0
        };
        GoalComparison {
            goal,
            met_goal: total >= goal,
            percentage,
            difference: total - goal,
            goal_available,
        }
    }
}

/// Interpret the goal cell text; a blank or unparseable cell is a goal of 0.
pub fn parse_goal(cell: Option<&str>) -> f64 {
    cell.and_then(parse_locale_number).unwrap_or(0.0)
}

/// Wait for the goal cell read and parse it.
pub fn read_goal(cell: Pending<Option<String>>) -> FetchResult<f64> {
    Ok(parse_goal(cell.wait()?.as_deref()))
}
