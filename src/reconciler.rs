//! Trip-level SLA reconciliation for the dispatch and receiving sheets.
//!
//! Both sheets list one row per vehicle movement event, and the same trip
//! code can appear on several rows. Rows are filtered by date and shift,
//! every surviving row contributes one detail record, and trip codes are
//! deduplicated only for the vehicle count.

use crate::source::{cell_at, Sheet};
use crate::types::{ReconciliationResult, SlaStatus, TripDetail};
use crate::util::{round1, try_normalize_date};
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashSet;

/// How a trip row decides whether its SLA was met.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SlaRule {
    /// Met when `actual <= planned`, compared as text. The sheet writes
    /// fixed-width zero-padded times, so text order is time order; either
    /// side blank means not met.
    PlannedVsActual { planned: usize, actual: usize },
    /// Met when the uppercased status text is non-blank and contains none of
    /// `delay_markers`.
    StatusText {
        status: usize,
        delay_markers: Vec<String>,
    },
}

/// Which column holds what, per trip sheet variant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TripColumnMap {
    pub date: usize,
    pub shift: usize,
    pub trip_id: usize,
    pub sla: SlaRule,
}

impl TripColumnMap {
    /// Dispatch sheet: trip B, date C, planned cut-off H, realized I, shift X.
    pub fn dispatch() -> Self {
        TripColumnMap {
            date: 2,
            shift: 23,
            trip_id: 1,
            sla: SlaRule::PlannedVsActual {
                planned: 7,
                actual: 8,
            },
        }
    }

    /// Receiving sheet: ETA date B, trip C, unload shift M, unload status X.
    pub fn receiving() -> Self {
        TripColumnMap {
            date: 1,
            shift: 12,
            trip_id: 2,
            sla: SlaRule::StatusText {
                status: 23,
                delay_markers: vec!["ATRASADO".to_string(), "LATE".to_string()],
            },
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Evaluate the SLA rule for one row, returning the evidence fields and the
/// verdict.
fn evaluate_sla(
    rule: &SlaRule,
    row: &[String],
) -> (Option<String>, Option<String>, Option<String>, bool) {
    match rule {
        SlaRule::PlannedVsActual { planned, actual } => {
            let planned = non_blank(cell_at(row, *planned));
            let actual = non_blank(cell_at(row, *actual));
            let met = match (&planned, &actual) {
                (Some(p), Some(a)) => a.as_str() <= p.as_str(),
                _ => false,
            };
            (planned, actual, None, met)
        }
        SlaRule::StatusText {
            status,
            delay_markers,
        } => {
            let status = non_blank(cell_at(row, *status)).map(|s| s.to_uppercase());
            let met = match &status {
                Some(s) => !delay_markers
                    .iter()
                    .any(|m| s.contains(m.to_uppercase().as_str())),
                None => false,
            };
            (None, None, status, met)
        }
    }
}

/// Filter `sheet` to rows for `shift_code` on `date` (sheet form) and
/// compute trip counts and SLA attainment.
///
/// The overall status is met only when every record met its SLA; an empty
/// selection is not met.
pub fn reconcile(
    sheet: &Sheet,
    shift_code: &str,
    date: &str,
    columns: &TripColumnMap,
) -> ReconciliationResult {
    let wanted_shift = shift_code.trim().to_uppercase();
    let mut seen = HashSet::new();
    let mut unique_trip_ids = Vec::new();
    let mut details = Vec::new();
    let mut unnormalized_dates = 0usize;

    for (sheet_row, row) in sheet.data_rows() {
        let raw_date = cell_at(row, columns.date);
        let row_date = match try_normalize_date(raw_date) {
            Some(d) => d,
            None => {
                unnormalized_dates += 1;
                raw_date.trim().to_string()
            }
        };
        if row_date != date {
            continue;
        }
        let row_shift = cell_at(row, columns.shift).trim().to_uppercase();
        if row_shift != wanted_shift {
            continue;
        }
        let Some(trip_id) = non_blank(cell_at(row, columns.trip_id)) else {
            continue;
        };

        let (planned, actual, status, sla_met) = evaluate_sla(&columns.sla, row);
        debug!(
            "  row {}: trip {} sla {}",
            sheet_row,
            trip_id,
            if sla_met { "met" } else { "not met" }
        );
        if seen.insert(trip_id.clone()) {
            unique_trip_ids.push(trip_id.clone());
        }
        details.push(TripDetail {
            trip_id,
            shift: row_shift,
            planned,
            actual,
            status,
            sla_met,
        });
    }

    let total_record_count = details.len();
    let sla_met_count = details.iter().filter(|d| d.sla_met).count();
    let sla_percentage = if total_record_count > 0 {
        round1(sla_met_count as f64 / total_record_count as f64 * 100.0)
    } else {
        0.0
    };
    let all_met = total_record_count > 0 && sla_met_count == total_record_count;

    info!(
        "'{}' {} {}: {} unique trips, {} records, SLA {}/{} ({}%)",
        sheet.name,
        wanted_shift,
        date,
        unique_trip_ids.len(),
        total_record_count,
        sla_met_count,
        total_record_count,
        sla_percentage
    );
    if unnormalized_dates > 0 {
        debug!(
            "'{}': {} rows with unreadable dates",
            sheet.name, unnormalized_dates
        );
    }

    ReconciliationResult {
        shift: wanted_shift,
        date: date.to_string(),
        unique_trip_count: unique_trip_ids.len(),
        total_record_count,
        sla_met_count,
        sla_not_met_count: total_record_count - sla_met_count,
        sla_percentage,
        sla_overall_status: SlaStatus::from_met(all_met),
        unique_trip_ids,
        details,
        unnormalized_dates,
        available: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Receiving-shaped row: date B, trip C, shift M, status X.
    fn receiving_row(date: &str, trip: &str, shift: &str, status: &str) -> Vec<String> {
        let mut row = vec![String::new(); 24];
        row[1] = date.to_string();
        row[2] = trip.to_string();
        row[12] = shift.to_string();
        row[23] = status.to_string();
        row
    }

    /// Dispatch-shaped row: trip B, date C, planned H, actual I, shift X.
    fn dispatch_row(date: &str, trip: &str, shift: &str, planned: &str, actual: &str) -> Vec<String> {
        let mut row = vec![String::new(); 24];
        row[1] = trip.to_string();
        row[2] = date.to_string();
        row[7] = planned.to_string();
        row[8] = actual.to_string();
        row[23] = shift.to_string();
        row
    }

    fn sheet_with(rows: Vec<Vec<String>>) -> Sheet {
        let mut all = vec![vec!["header".to_string()]];
        all.extend(rows);
        Sheet::new("trips", all)
    }

    #[test]
    fn duplicate_trip_ids_are_counted_once_but_kept_in_details() {
        let sheet = sheet_with(vec![
            receiving_row("24/10/2025", "LT001", "T1", "OK"),
            receiving_row("24/10/2025", "LT001", "T1", "ATRASADO"),
        ]);
        let r = reconcile(&sheet, "T1", "24/10/2025", &TripColumnMap::receiving());
        assert_eq!(r.unique_trip_count, 1);
        assert_eq!(r.total_record_count, 2);
        assert_eq!(r.sla_met_count, 1);
        assert_eq!(r.sla_not_met_count, 1);
        assert_eq!(r.sla_percentage, 50.0);
        assert_eq!(r.sla_overall_status, SlaStatus::NotMet);
    }

    #[test]
    fn receiving_filters_by_normalized_date_and_trimmed_shift() {
        let sheet = sheet_with(vec![
            receiving_row("2025-10-24", "LT010", " t2 ", "NO PRAZO"),
            receiving_row("24-10-2025", "LT011", "T2", "late arrival"),
            receiving_row("24/10/2025", "LT012", "T1", "OK"),
            receiving_row("25/10/2025", "LT013", "T2", "OK"),
            receiving_row("24/10/2025", "  ", "T2", "OK"),
        ]);
        let r = reconcile(&sheet, "T2", "24/10/2025", &TripColumnMap::receiving());
        assert_eq!(r.unique_trip_ids, vec!["LT010", "LT011"]);
        assert!(r.details[0].sla_met);
        assert!(!r.details[1].sla_met);
        assert_eq!(r.details[1].status.as_deref(), Some("LATE ARRIVAL"));
    }

    #[test]
    fn blank_status_is_not_met() {
        let sheet = sheet_with(vec![receiving_row("24/10/2025", "LT020", "T3", "")]);
        let r = reconcile(&sheet, "T3", "24/10/2025", &TripColumnMap::receiving());
        assert_eq!(r.sla_met_count, 0);
        assert_eq!(r.sla_overall_status, SlaStatus::NotMet);
    }

    #[test]
    fn dispatch_compares_times_as_text() {
        let sheet = sheet_with(vec![
            dispatch_row("24/10/2025", "LT100", "T1", "08:30", "08:15"),
            dispatch_row("24/10/2025", "LT101", "T1", "08:30", "08:30"),
            dispatch_row("24/10/2025", "LT102", "T1", "08:30", "09:05"),
            dispatch_row("24/10/2025", "LT103", "T1", "", "07:00"),
        ]);
        let r = reconcile(&sheet, "T1", "24/10/2025", &TripColumnMap::dispatch());
        let verdicts: Vec<bool> = r.details.iter().map(|d| d.sla_met).collect();
        assert_eq!(verdicts, vec![true, true, false, false]);
        assert_eq!(r.sla_percentage, 50.0);
        assert_eq!(r.details[0].planned.as_deref(), Some("08:30"));
    }

    #[test]
    fn all_records_met_is_overall_met() {
        let sheet = sheet_with(vec![
            dispatch_row("24/10/2025", "LT200", "T2", "10:00", "09:00"),
            dispatch_row("24/10/2025", "LT201", "T2", "11:00", "10:59"),
        ]);
        let r = reconcile(&sheet, "t2", "24/10/2025", &TripColumnMap::dispatch());
        assert_eq!(r.sla_percentage, 100.0);
        assert_eq!(r.sla_overall_status, SlaStatus::Met);
    }

    #[test]
    fn empty_selection_is_zero_and_not_met() {
        let sheet = sheet_with(vec![dispatch_row("23/10/2025", "LT300", "T1", "1", "0")]);
        let r = reconcile(&sheet, "T1", "24/10/2025", &TripColumnMap::dispatch());
        assert_eq!(r.total_record_count, 0);
        assert_eq!(r.sla_percentage, 0.0);
        assert_eq!(r.sla_overall_status, SlaStatus::NotMet);
        assert!(r.available);
    }

    #[test]
    fn unreadable_dates_are_counted() {
        let sheet = sheet_with(vec![
            receiving_row("soon", "LT400", "T1", "OK"),
            receiving_row("24/10/2025", "LT401", "T1", "OK"),
        ]);
        let r = reconcile(&sheet, "T1", "24/10/2025", &TripColumnMap::receiving());
        assert_eq!(r.unnormalized_dates, 1);
        assert_eq!(r.total_record_count, 1);
    }
}
