use serde::Serialize;
use tabled::Tabled;

/// Shift code plus sheet-form date (`DD/MM/YYYY`) identifying one metrics row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftKey {
    pub shift: String,
    pub date: String,
    /// `false` when the request date could not be read and `date` holds the
    /// caller's text as given.
    pub date_recognized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlaStatus {
    Met,
    NotMet,
}

impl SlaStatus {
    pub fn from_met(met: bool) -> Self {
        if met {
            SlaStatus::Met
        } else {
            SlaStatus::NotMet
        }
    }

    pub fn is_met(self) -> bool {
        self == SlaStatus::Met
    }
}

/// One trip row that survived the date/shift filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripDetail {
    pub trip_id: String,
    pub shift: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub sla_met: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationResult {
    pub shift: String,
    pub date: String,
    pub unique_trip_count: usize,
    pub total_record_count: usize,
    pub sla_met_count: usize,
    pub sla_not_met_count: usize,
    pub sla_percentage: f64,
    pub sla_overall_status: SlaStatus,
    pub unique_trip_ids: Vec<String>,
    pub details: Vec<TripDetail>,
    /// Rows whose date text could not be normalized.
    pub unnormalized_dates: usize,
    /// `false` only for the zero-valued fallback.
    pub available: bool,
}

impl ReconciliationResult {
    /// Zero-valued stand-in used when the trip sheet cannot be fetched.
    pub fn unavailable(shift: &str, date: &str) -> Self {
        ReconciliationResult {
            shift: shift.to_string(),
            date: date.to_string(),
            unique_trip_count: 0,
            total_record_count: 0,
            sla_met_count: 0,
            sla_not_met_count: 0,
            sla_percentage: 0.0,
            sla_overall_status: SlaStatus::NotMet,
            unique_trip_ids: Vec::new(),
            details: Vec::new(),
            unnormalized_dates: 0,
            available: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDetail {
    pub column: String,
    pub value: i64,
}

/// Sum of the per-category order columns against the sheet's own total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub sheet_row: usize,
    pub sum: i64,
    pub reported_total: i64,
    pub columns: Vec<ColumnDetail>,
    pub divergent: bool,
    /// A cell or the running sum went past the `i64` range and was clamped.
    pub overflowed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalComparison {
    pub goal: f64,
    pub met_goal: bool,
    pub percentage: f64,
    pub difference: f64,
    pub goal_available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Absenteeism {
    pub value: f64,
    pub display: String,
    pub available: bool,
}

impl Default for Absenteeism {
    fn default() -> Self {
        Absenteeism {
            value: 0.0,
            display: "0%".to_string(),
            available: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Productivity {
    pub hourly_realized: f64,
    pub individual: f64,
    pub hourly_target: f64,
    pub individual_target: f64,
    pub deviation_pct: f64,
    pub met_goal: bool,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrdersMetrics {
    pub processed: i64,
    pub computed_sum: i64,
    pub divergent: bool,
    pub columns: Vec<ColumnDetail>,
    pub sheet_row: usize,
    pub goal: f64,
    pub goal_status: SlaStatus,
    pub goal_percentage: f64,
    pub goal_percentage_display: String,
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripMetrics {
    pub vehicles: usize,
    pub total_records: usize,
    pub sla_met: usize,
    pub sla_not_met: usize,
    pub sla_percentage: f64,
    pub sla_percentage_display: String,
    pub sla_status: SlaStatus,
    pub trip_ids: Vec<String>,
    pub details: Vec<TripDetail>,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricWarning {
    Divergence { computed: i64, reported: i64 },
    CountOverflow { sheet_row: usize },
    UnrecognizedRequestDate { date: String },
    GoalUnavailable,
    SourceUnavailable { source: String },
    UnnormalizedDates { source: String, count: usize },
}

/// Everything the handover report needs for one shift, built fresh per
/// request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedMetrics {
    pub shift: String,
    pub date: String,
    pub orders: OrdersMetrics,
    pub released: TripMetrics,
    pub received: TripMetrics,
    pub absenteeism: Absenteeism,
    pub productivity: Productivity,
    pub warnings: Vec<MetricWarning>,
}

/// Flat rendering of a [`TripDetail`] for console tables and CSV export.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TripDetailRow {
    #[serde(rename = "Trip")]
    #[tabled(rename = "Trip")]
    pub trip_id: String,
    #[serde(rename = "Shift")]
    #[tabled(rename = "Shift")]
    pub shift: String,
    #[serde(rename = "Evidence")]
    #[tabled(rename = "Evidence")]
    pub evidence: String,
    #[serde(rename = "SLA")]
    #[tabled(rename = "SLA")]
    pub sla: String,
}
