use crate::types::{ComposedMetrics, MetricWarning, SlaStatus, TripDetail, TripDetailRow};
use crate::util::{format_int, format_number};
use chrono::Local;
use serde::Serialize;
use std::error::Error;
use std::fmt::Write as _;
use tabled::{settings::Style, Table, Tabled};

/// Composed metrics plus the moment they were produced. The timestamp lives
/// only here so the metrics themselves stay reproducible.
#[derive(Debug, Serialize)]
pub struct MetricsReport<'a> {
    pub generated_at: String,
    pub metrics: &'a ComposedMetrics,
}

impl<'a> MetricsReport<'a> {
    pub fn now(metrics: &'a ComposedMetrics) -> Self {
        MetricsReport {
            generated_at: Local::now().to_rfc3339(),
            metrics,
        }
    }
}

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn trip_detail_rows(details: &[TripDetail]) -> Vec<TripDetailRow> {
    details
        .iter()
        .map(|d| {
            let evidence = match (&d.planned, &d.actual, &d.status) {
                (_, _, Some(status)) => status.clone(),
                (None, None, None) => "N/A".to_string(),
                (planned, actual, None) => format!(
                    "planned {} / actual {}",
                    planned.as_deref().unwrap_or("N/A"),
                    actual.as_deref().unwrap_or("N/A")
                ),
            };
            TripDetailRow {
                trip_id: d.trip_id.clone(),
                shift: d.shift.clone(),
                evidence,
                sla: if d.sla_met { "met" } else { "not met" }.to_string(),
            }
        })
        .collect()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
    if rows.len() > max_rows {
        println!("(+{} more)\n", format_int(rows.len() - max_rows));
    }
}

fn marker(status: SlaStatus) -> &'static str {
    if status.is_met() {
        "[OK]"
    } else {
        "[!!]"
    }
}

fn describe(warning: &MetricWarning) -> String {
    match warning {
        MetricWarning::Divergence { computed, reported } => format!(
            "computed sum {} differs from reported total {}",
            format_int(*computed),
            format_int(*reported)
        ),
        MetricWarning::CountOverflow { sheet_row } => {
            format!("order counts on sheet row {} exceed the integer range", sheet_row)
        }
        MetricWarning::UnrecognizedRequestDate { date } => {
            format!("request date '{}' was not recognized and matched as text", date)
        }
        MetricWarning::GoalUnavailable => "goal cell unavailable, goal taken as 0".to_string(),
        MetricWarning::SourceUnavailable { source } => {
            format!("{} source unavailable, reported as zero", source)
        }
        MetricWarning::UnnormalizedDates { source, count } => {
            format!("{} rows in {} had unreadable dates", count, source)
        }
    }
}

/// Indicators block of the shift-handover message, one line per indicator.
pub fn render_indicators(m: &ComposedMetrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "SHIFT INDICATORS - {} {}", m.shift, m.date);

    let o = &m.orders;
    let _ = writeln!(
        out,
        "{} Orders processed: {} | {} ({} of {})",
        marker(o.goal_status),
        format_int(o.processed),
        if o.goal_status.is_met() { "goal met" } else { "goal not met" },
        o.goal_percentage_display,
        format_number(o.goal, 0)
    );

    for (label, t) in [("Vehicles released", &m.released), ("Vehicles received", &m.received)] {
        let _ = writeln!(
            out,
            "{} {}: {} | {} (SLA: {})",
            marker(t.sla_status),
            label,
            format_int(t.vehicles),
            if t.sla_status.is_met() { "SLA met" } else { "SLA not met" },
            t.sla_percentage_display
        );
    }

    let _ = writeln!(out, "Absenteeism: {}", m.absenteeism.display);

    let p = &m.productivity;
    if p.individual != 0.0 {
        let _ = writeln!(
            out,
            "{} Individual productivity: {} | {} (target: {})",
            marker(SlaStatus::from_met(p.met_goal)),
            format_number(p.individual, 2),
            if p.met_goal { "goal met" } else { "goal not met" },
            format_number(p.individual_target, 2)
        );
        let _ = writeln!(
            out,
            "Hourly average: {} packages (target: {})",
            format_number(p.hourly_realized, 0),
            format_number(p.hourly_target, 0)
        );
        let sign = if p.deviation_pct > 0.0 { "+" } else { "" };
        let _ = writeln!(out, "Productivity deviation: {}{:.2}%", sign, p.deviation_pct);
    }

    for w in &m.warnings {
        let _ = writeln!(out, "Warning: {}", describe(w));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Absenteeism, OrdersMetrics, Productivity, TripMetrics};

    fn trips(vehicles: usize, pct: f64, status: SlaStatus) -> TripMetrics {
        TripMetrics {
            vehicles,
            total_records: vehicles,
            sla_met: 0,
            sla_not_met: 0,
            sla_percentage: pct,
            sla_percentage_display: format!("{:.1}%", pct),
            sla_status: status,
            trip_ids: Vec::new(),
            details: Vec::new(),
            available: true,
        }
    }

    fn metrics() -> ComposedMetrics {
        ComposedMetrics {
            shift: "T1".into(),
            date: "24/10/2025".into(),
            orders: OrdersMetrics {
                processed: 12500,
                computed_sum: 12500,
                divergent: false,
                columns: Vec::new(),
                sheet_row: 2,
                goal: 12000.0,
                goal_status: SlaStatus::Met,
                goal_percentage: 104.2,
                goal_percentage_display: "104.2%".into(),
                difference: 500.0,
            },
            released: trips(12, 91.7, SlaStatus::NotMet),
            received: trips(8, 100.0, SlaStatus::Met),
            absenteeism: Absenteeism {
                value: 5.23,
                display: "5.23%".into(),
                available: true,
            },
            productivity: Productivity::default(),
            warnings: vec![MetricWarning::GoalUnavailable],
        }
    }

    #[test]
    fn indicators_block_lists_each_indicator() {
        let text = render_indicators(&metrics());
        assert!(text.contains("[OK] Orders processed: 12,500 | goal met (104.2% of 12,000)"));
        assert!(text.contains("[!!] Vehicles released: 12 | SLA not met (SLA: 91.7%)"));
        assert!(text.contains("[OK] Vehicles received: 8 | SLA met (SLA: 100.0%)"));
        assert!(text.contains("Absenteeism: 5.23%"));
        assert!(!text.contains("productivity"));
        assert!(text.contains("Warning: goal cell unavailable"));
    }

    #[test]
    fn productivity_lines_show_signed_deviation() {
        let mut m = metrics();
        m.productivity = Productivity {
            hourly_realized: 1250.0,
            individual: 110.0,
            hourly_target: 1200.0,
            individual_target: 100.0,
            deviation_pct: 10.0,
            met_goal: true,
            available: true,
        };
        let text = render_indicators(&m);
        assert!(text.contains("[OK] Individual productivity: 110.00 | goal met (target: 100.00)"));
        assert!(text.contains("Hourly average: 1,250 packages (target: 1,200)"));
        assert!(text.contains("Productivity deviation: +10.00%"));
    }

    #[test]
    fn detail_rows_pick_the_right_evidence() {
        let details = vec![
            TripDetail {
                trip_id: "LT1".into(),
                shift: "T1".into(),
                planned: Some("08:00".into()),
                actual: None,
                status: None,
                sla_met: false,
            },
            TripDetail {
                trip_id: "LT2".into(),
                shift: "T1".into(),
                planned: None,
                actual: None,
                status: Some("NO PRAZO".into()),
                sla_met: true,
            },
        ];
        let rows = trip_detail_rows(&details);
        assert_eq!(rows[0].evidence, "planned 08:00 / actual N/A");
        assert_eq!(rows[0].sla, "not met");
        assert_eq!(rows[1].evidence, "NO PRAZO");
    }
}
