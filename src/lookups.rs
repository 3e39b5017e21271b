use crate::error::FetchResult;
use crate::types::{Absenteeism, Productivity};
use crate::util::{format_percent, parse_decimal_cell, parse_percent_cell, round2};
use log::warn;

/// Build the absenteeism figure from its overview cell.
pub fn absenteeism_from_cell(cell: FetchResult<Option<String>>) -> Absenteeism {
    match cell {
        Ok(Some(text)) => match parse_percent_cell(&text) {
            Some(value) => Absenteeism {
                value,
                display: format_percent(value, 2),
                available: true,
            },
            None => {
                warn!("absenteeism cell '{}' is not a number, using 0", text);
                Absenteeism::default()
            }
        },
        Ok(None) => Absenteeism::default(),
        Err(e) => {
            warn!("absenteeism unavailable: {}", e);
            Absenteeism {
                value: 0.0,
                display: "N/A".to_string(),
                available: false,
            }
        }
    }
}

/// The four overview cells behind the productivity indicator.
pub struct ProductivityCells {
    pub hourly_realized: FetchResult<Option<String>>,
    pub individual: FetchResult<Option<String>>,
    pub hourly_target: FetchResult<Option<String>>,
    pub individual_target: FetchResult<Option<String>>,
}

fn number(cell: FetchResult<Option<String>>) -> FetchResult<f64> {
    Ok(cell?.as_deref().and_then(parse_decimal_cell).unwrap_or(0.0))
}

/// Build the productivity figures. Any unreadable cell makes the whole
/// indicator unavailable, reported as zeros with the goal not met.
pub fn productivity_from_cells(cells: ProductivityCells) -> Productivity {
    let read = || -> FetchResult<(f64, f64, f64, f64)> {
        Ok((
            number(cells.hourly_realized)?,
            number(cells.individual)?,
            number(cells.hourly_target)?,
            number(cells.individual_target)?,
        ))
    };
    let (hourly_realized, individual, hourly_target, individual_target) = match read() {
        Ok(values) => values,
        Err(e) => {
            warn!("productivity unavailable: {}", e);
            return Productivity::default();
        }
    };
    let deviation_pct = if individual_target > 0.0 {
        round2((individual - individual_target) / individual_target * 100.0)
    } else {
        0.0
    };
    Productivity {
        hourly_realized,
        individual,
        hourly_target,
        individual_target,
        deviation_pct,
        met_goal: individual_target > 0.0 && individual >= individual_target,
        available: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;

    fn text(s: &str) -> FetchResult<Option<String>> {
        Ok(Some(s.to_string()))
    }

    fn lost() -> FetchResult<Option<String>> {
        Err(FetchError::WorkerLost {
            sheet: "Operation Overview".into(),
        })
    }

    #[test]
    fn absenteeism_formats_with_two_decimals() {
        let a = absenteeism_from_cell(text("5,234%"));
        assert_eq!(a.display, "5.23%");
        assert!(a.available);

        let fraction = absenteeism_from_cell(text("0.0523"));
        assert_eq!(fraction.display, "5.23%");
    }

    #[test]
    fn absenteeism_blank_and_failed_cells() {
        let blank = absenteeism_from_cell(Ok(None));
        assert_eq!(blank.value, 0.0);
        assert_eq!(blank.display, "0%");

        let failed = absenteeism_from_cell(lost());
        assert_eq!(failed.display, "N/A");
        assert!(!failed.available);
    }

    #[test]
    fn productivity_deviation_and_goal() {
        let p = productivity_from_cells(ProductivityCells {
            hourly_realized: text("1250"),
            individual: text("110"),
            hourly_target: text("1200"),
            individual_target: text("100"),
        });
        assert_eq!(p.deviation_pct, 10.0);
        assert!(p.met_goal);
        assert!(p.available);

        let below = productivity_from_cells(ProductivityCells {
            hourly_realized: text("900"),
            individual: text("87,5"),
            hourly_target: text("1000"),
            individual_target: text("100"),
        });
        assert_eq!(below.deviation_pct, -12.5);
        assert!(!below.met_goal);
    }

    #[test]
    fn productivity_failure_is_all_zero() {
        let p = productivity_from_cells(ProductivityCells {
            hourly_realized: text("900"),
            individual: lost(),
            hourly_target: text("1000"),
            individual_target: text("100"),
        });
        assert_eq!(p, Productivity::default());
        assert!(!p.met_goal);
    }
}
