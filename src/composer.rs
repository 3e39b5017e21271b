use crate::types::{
    Absenteeism, Aggregation, ComposedMetrics, GoalComparison, MetricWarning, OrdersMetrics,
    Productivity, ReconciliationResult, ShiftKey, SlaStatus, TripMetrics,
};
use crate::util::format_percent;

fn trip_metrics(r: ReconciliationResult) -> TripMetrics {
    TripMetrics {
        vehicles: r.unique_trip_count,
        total_records: r.total_record_count,
        sla_met: r.sla_met_count,
        sla_not_met: r.sla_not_met_count,
        sla_percentage: r.sla_percentage,
        sla_percentage_display: format_percent(r.sla_percentage, 1),
        sla_status: r.sla_overall_status,
        trip_ids: r.unique_trip_ids,
        details: r.details,
        available: r.available,
    }
}

fn trip_warnings(source: &str, r: &ReconciliationResult, out: &mut Vec<MetricWarning>) {
    if !r.available {
        out.push(MetricWarning::SourceUnavailable {
            source: source.to_string(),
        });
    }
    if r.unnormalized_dates > 0 {
        out.push(MetricWarning::UnnormalizedDates {
            source: source.to_string(),
            count: r.unnormalized_dates,
        });
    }
}

/// Merge the stage outputs into the report payload.
///
/// Only display strings and warnings are derived here; every number comes
/// from the inputs unchanged. Zero-valued fallbacks compose like any other
/// input.
pub fn compose(
    key: &ShiftKey,
    aggregated: Aggregation,
    goal: GoalComparison,
    released: ReconciliationResult,
    received: ReconciliationResult,
    absenteeism: Absenteeism,
    productivity: Productivity,
) -> ComposedMetrics {
    let mut warnings = Vec::new();
    if !key.date_recognized {
        warnings.push(MetricWarning::UnrecognizedRequestDate {
            date: key.date.clone(),
        });
    }
    if aggregated.overflowed {
        warnings.push(MetricWarning::CountOverflow {
            sheet_row: aggregated.sheet_row,
        });
    }
    if aggregated.divergent {
        warnings.push(MetricWarning::Divergence {
            computed: aggregated.sum,
            reported: aggregated.reported_total,
        });
    }
    if !goal.goal_available {
        warnings.push(MetricWarning::GoalUnavailable);
    }
    trip_warnings("released", &released, &mut warnings);
    trip_warnings("received", &received, &mut warnings);
    if !absenteeism.available {
        warnings.push(MetricWarning::SourceUnavailable {
            source: "absenteeism".to_string(),
        });
    }
    if !productivity.available {
        warnings.push(MetricWarning::SourceUnavailable {
            source: "productivity".to_string(),
        });
    }

    let orders = OrdersMetrics {
        processed: aggregated.reported_total,
        computed_sum: aggregated.sum,
        divergent: aggregated.divergent,
        columns: aggregated.columns,
        sheet_row: aggregated.sheet_row,
        goal: goal.goal,
        goal_status: SlaStatus::from_met(goal.met_goal),
        goal_percentage: goal.percentage,
        goal_percentage_display: format_percent(goal.percentage, 1),
        difference: goal.difference,
    };

    ComposedMetrics {
        shift: key.shift.clone(),
        date: key.date.clone(),
        orders,
        released: trip_metrics(released),
        received: trip_metrics(received),
        absenteeism,
        productivity,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(shift: &str) -> ShiftKey {
        ShiftKey {
            shift: shift.to_string(),
            date: "24/10/2025".to_string(),
            date_recognized: true,
        }
    }

    fn aggregation(sum: i64, total: i64) -> Aggregation {
        Aggregation {
            sheet_row: 2,
            sum,
            reported_total: total,
            columns: Vec::new(),
            divergent: sum != total,
            overflowed: false,
        }
    }

    #[test]
    fn all_fallbacks_still_compose() {
        let goal = GoalComparison {
            goal: 0.0,
            met_goal: true,
            percentage: 0.0,
            difference: 10.0,
            goal_available: false,
        };
        let m = compose(
            &key("T1"),
            aggregation(10, 10),
            goal,
            ReconciliationResult::unavailable("T1", "24/10/2025"),
            ReconciliationResult::unavailable("T1", "24/10/2025"),
            Absenteeism::default(),
            Productivity::default(),
        );
        assert_eq!(m.shift, "T1");
        assert_eq!(m.released.sla_percentage_display, "0.0%");
        assert_eq!(m.received.sla_status, SlaStatus::NotMet);
        assert_eq!(m.orders.goal_status, SlaStatus::Met);
        assert!(m.warnings.contains(&MetricWarning::GoalUnavailable));
        assert!(m.warnings.contains(&MetricWarning::SourceUnavailable {
            source: "released".into()
        }));
        assert!(m.warnings.contains(&MetricWarning::SourceUnavailable {
            source: "productivity".into()
        }));
    }

    #[test]
    fn divergence_is_carried_as_a_warning() {
        let goal = GoalComparison {
            goal: 100.0,
            met_goal: false,
            percentage: 55.0,
            difference: -45.0,
            goal_available: true,
        };
        let m = compose(
            &key("T2"),
            aggregation(60, 55),
            goal,
            ReconciliationResult::unavailable("T2", "24/10/2025"),
            ReconciliationResult::unavailable("T2", "24/10/2025"),
            Absenteeism::default(),
            Productivity::default(),
        );
        assert_eq!(m.orders.processed, 55);
        assert_eq!(m.orders.goal_percentage_display, "55.0%");
        assert_eq!(
            m.warnings[0],
            MetricWarning::Divergence {
                computed: 60,
                reported: 55
            }
        );
    }

    #[test]
    fn unreadable_request_date_and_overflow_become_warnings() {
        let goal = GoalComparison {
            goal: 0.0,
            met_goal: true,
            percentage: 0.0,
            difference: 0.0,
            goal_available: true,
        };
        let key = ShiftKey {
            shift: "T1".to_string(),
            date: "Week 43".to_string(),
            date_recognized: false,
        };
        let mut agg = aggregation(i64::MAX, 0);
        agg.overflowed = true;
        let m = compose(
            &key,
            agg,
            goal,
            ReconciliationResult::unavailable("T1", "Week 43"),
            ReconciliationResult::unavailable("T1", "Week 43"),
            Absenteeism::default(),
            Productivity::default(),
        );
        assert_eq!(
            m.warnings[0],
            MetricWarning::UnrecognizedRequestDate {
                date: "Week 43".into()
            }
        );
        assert_eq!(m.warnings[1], MetricWarning::CountOverflow { sheet_row: 2 });
    }
}
