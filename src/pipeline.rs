//! Per-request orchestration: fetch, locate, aggregate, reconcile, compose.
//!
//! Only the metrics sheet is load-bearing. Every other source (goal cell,
//! both trip sheets, absenteeism, productivity) degrades to a zero-valued
//! default when it cannot be read, so one unreachable sheet never blanks the
//! whole handover report.

use crate::aggregator::{aggregate, read_goal};
use crate::composer::compose;
use crate::config::{OverviewCells, ReportConfig};
use crate::error::{ConfigError, FetchResult};
use crate::locator::locate_row;
use crate::lookups::{absenteeism_from_cell, productivity_from_cells, ProductivityCells};
use crate::reconciler::{reconcile, TripColumnMap};
use crate::source::{fetch_rows_async, read_cell_async, CellRef, Pending, Sheet, SheetSource};
use crate::types::{ComposedMetrics, GoalComparison, ReconciliationResult, ShiftKey};
use crate::util::{normalize_date, shift_code, try_normalize_date};
use log::{info, warn};
use std::sync::Arc;

/// Outcome of a metrics lookup for one shift and date.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(ComposedMetrics),
    /// The metrics sheet has no row for this shift and date.
    NotFound(ShiftKey),
}

pub struct ShiftReportPipeline {
    source: Arc<dyn SheetSource>,
    config: ReportConfig,
    cells: OverviewCells,
}

/// Build the sheet key for a domain shift label and an ISO request date.
///
/// A date that cannot be read is kept as given and marked unrecognized, so
/// it can still match a sheet that uses the same free-form text.
pub fn shift_key(shift_label: &str, iso_date: &str) -> ShiftKey {
    let normalized = try_normalize_date(iso_date);
    ShiftKey {
        shift: shift_code(shift_label),
        date_recognized: normalized.is_some(),
        date: normalized.unwrap_or_else(|| normalize_date(iso_date)),
    }
}

impl ShiftReportPipeline {
    pub fn new(source: Arc<dyn SheetSource>, config: ReportConfig) -> Result<Self, ConfigError> {
        let cells = config.overview_cells()?;
        Ok(ShiftReportPipeline {
            source,
            config,
            cells,
        })
    }

    fn read_cell(&self, cell: &CellRef) -> Pending<Option<String>> {
        read_cell_async(&self.source, cell, self.config.fetch_timeout())
    }

    fn settle_trips(
        &self,
        label: &str,
        pending: Pending<Sheet>,
        key: &ShiftKey,
        columns: &TripColumnMap,
    ) -> ReconciliationResult {
        match pending.wait() {
            Ok(sheet) => reconcile(&sheet, &key.shift, &key.date, columns),
            Err(e) => {
                warn!("{} trips unavailable, reporting zeros: {}", label, e);
                ReconciliationResult::unavailable(&key.shift, &key.date)
            }
        }
    }

    /// Run the whole pipeline for `shift_label` (`morning`, `afternoon`,
    /// `night`, or a sheet code) on `iso_date` (`YYYY-MM-DD`).
    ///
    /// Fails only when the metrics sheet itself cannot be read.
    pub fn run(&self, shift_label: &str, iso_date: &str) -> FetchResult<Lookup> {
        let key = shift_key(shift_label, iso_date);
        let timeout = self.config.fetch_timeout();
        info!("collecting metrics for {} on {}", key.shift, key.date);

        // Trip sheets and overview cells do not depend on the metrics row, so
        // read them all while the metrics sheet is being read.
        let released = fetch_rows_async(&self.source, &self.config.dispatch_sheet(), timeout);
        let received = fetch_rows_async(&self.source, &self.config.receiving_sheet(), timeout);
        let goal_cell = self.read_cell(&self.cells.goal);
        let absenteeism_cell = self.read_cell(&self.cells.absenteeism);
        let hourly_realized = self.read_cell(&self.cells.hourly_realized);
        let individual = self.read_cell(&self.cells.individual);
        let hourly_target = self.read_cell(&self.cells.hourly_target);
        let individual_target = self.read_cell(&self.cells.individual_target);

        let metrics = fetch_rows_async(&self.source, &self.config.metrics_sheet(), timeout).wait()?;
        let m = &self.config.metrics;
        let Some(row) = locate_row(&metrics, m.shift_column, m.date_column, &key.shift, &key.date)
        else {
            info!("no metrics row for {} on {}", key.shift, key.date);
            return Ok(Lookup::NotFound(key));
        };
        let aggregated = aggregate(
            metrics.header(),
            &row,
            m.sum_start_column,
            m.sum_end_column,
            m.total_column,
        );

        let goal = GoalComparison::evaluate(
            aggregated.reported_total,
            read_goal(goal_cell),
        );
        info!(
            "orders: {} of goal {} ({}%)",
            aggregated.reported_total, goal.goal, goal.percentage
        );

        let released = self.settle_trips("released", released, &key, &self.config.dispatch.columns);
        let received =
            self.settle_trips("received", received, &key, &self.config.receiving.columns);

        let absenteeism = absenteeism_from_cell(absenteeism_cell.wait());
        let productivity = productivity_from_cells(ProductivityCells {
            hourly_realized: hourly_realized.wait(),
            individual: individual.wait(),
            hourly_target: hourly_target.wait(),
            individual_target: individual_target.wait(),
        });

        Ok(Lookup::Found(compose(
            &key,
            aggregated,
            goal,
            released,
            received,
            absenteeism,
            productivity,
        )))
    }
}
