use crate::error::ConfigError;
use crate::reconciler::TripColumnMap;
use crate::source::{CellRef, SheetRef};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Where the per-shift metrics row lives and which columns it uses.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsSheetConfig {
    pub workbook: String,
    pub sheet: String,
    pub shift_column: usize,
    pub date_column: usize,
    /// First and last (inclusive) order-category columns, C..J by default.
    pub sum_start_column: usize,
    pub sum_end_column: usize,
    /// Column holding the sheet's own total, K by default.
    pub total_column: usize,
}

impl Default for MetricsSheetConfig {
    fn default() -> Self {
        MetricsSheetConfig {
            workbook: "metrics".to_string(),
            sheet: "Métricas".to_string(),
            shift_column: 0,
            date_column: 1,
            sum_start_column: 2,
            sum_end_column: 9,
            total_column: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripSheetConfig {
    pub workbook: String,
    pub sheet: String,
    pub columns: TripColumnMap,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProductivityCellsConfig {
    pub hourly_realized: String,
    pub individual: String,
    pub hourly_target: String,
    pub individual_target: String,
}

impl Default for ProductivityCellsConfig {
    fn default() -> Self {
        ProductivityCellsConfig {
            hourly_realized: "Operation Overview!AI38".to_string(),
            individual: "Operation Overview!AI39".to_string(),
            hourly_target: "Operation Overview!AM38".to_string(),
            individual_target: "Operation Overview!AM39".to_string(),
        }
    }
}

/// Single cells read from the overview workbook, in A1 notation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OverviewConfig {
    pub workbook: String,
    pub goal_cell: String,
    pub absenteeism_cell: String,
    pub productivity: ProductivityCellsConfig,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        OverviewConfig {
            workbook: "metrics".to_string(),
            goal_cell: "Operation Overview!AM15".to_string(),
            absenteeism_cell: "Operation Overview!AI36".to_string(),
            productivity: ProductivityCellsConfig::default(),
        }
    }
}

/// Resolved overview cells.
#[derive(Debug, Clone)]
pub struct OverviewCells {
    pub goal: CellRef,
    pub absenteeism: CellRef,
    pub hourly_realized: CellRef,
    pub individual: CellRef,
    pub hourly_target: CellRef,
    pub individual_target: CellRef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub metrics: MetricsSheetConfig,
    pub dispatch: TripSheetConfig,
    pub receiving: TripSheetConfig,
    pub overview: OverviewConfig,
    pub fetch_timeout_ms: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            metrics: MetricsSheetConfig::default(),
            dispatch: TripSheetConfig {
                workbook: "dispatch".to_string(),
                sheet: "dbExpedicao".to_string(),
                columns: TripColumnMap::dispatch(),
            },
            receiving: TripSheetConfig {
                workbook: "receiving".to_string(),
                sheet: "db_base".to_string(),
                columns: TripColumnMap::receiving(),
            },
            overview: OverviewConfig::default(),
            fetch_timeout_ms: 10_000,
        }
    }
}

impl ReportConfig {
    /// Load a JSON config file. Sections left out keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: display.clone(),
            source: e,
        })?;
        let config: ReportConfig = serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: display,
            source: e,
        })?;
        config.overview_cells()?;
        Ok(config)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn metrics_sheet(&self) -> SheetRef {
        SheetRef::new(&self.metrics.workbook, &self.metrics.sheet)
    }

    pub fn dispatch_sheet(&self) -> SheetRef {
        SheetRef::new(&self.dispatch.workbook, &self.dispatch.sheet)
    }

    pub fn receiving_sheet(&self) -> SheetRef {
        SheetRef::new(&self.receiving.workbook, &self.receiving.sheet)
    }

    pub fn overview_cells(&self) -> Result<OverviewCells, ConfigError> {
        let o = &self.overview;
        let cell = |a1: &str| {
            CellRef::parse(&o.workbook, a1).map_err(|_| ConfigError::Cell(a1.to_string()))
        };
        Ok(OverviewCells {
            goal: cell(&o.goal_cell)?,
            absenteeism: cell(&o.absenteeism_cell)?,
            hourly_realized: cell(&o.productivity.hourly_realized)?,
            individual: cell(&o.productivity.individual)?,
            hourly_target: cell(&o.productivity.hourly_target)?,
            individual_target: cell(&o.productivity.individual_target)?,
        })
    }
}
