//! Tabular data source abstraction.
//!
//! The pipeline only ever needs two things from the outside world: all rows
//! of a named sheet, and the text of a single cell. Everything else (CSV
//! directories, in-memory fixtures, a remote spreadsheet API) hides behind
//! [`SheetSource`].

use crate::error::{FetchError, FetchResult};
use crate::util::column_index;
use std::collections::HashMap;
use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Rows of one sheet. Row 0 is the header; columns are positional and rows
/// may be ragged.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Sheet {
            name: name.into(),
            rows,
        }
    }

    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Data rows paired with their 1-based sheet row number (the header is
    /// row 1, so the first data row is row 2).
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.rows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, r)| (i + 1, r.as_slice()))
    }

    /// Cell text at a zero-based position; `""` when out of range.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Cell text from a row slice; `""` when the row is shorter than `col`.
pub fn cell_at(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetRef {
    pub workbook: String,
    pub sheet: String,
}

impl SheetRef {
    pub fn new(workbook: impl Into<String>, sheet: impl Into<String>) -> Self {
        SheetRef {
            workbook: workbook.into(),
            sheet: sheet.into(),
        }
    }
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.workbook, self.sheet)
    }
}

/// A single cell, addressed with zero-based row and column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRef {
    pub sheet: SheetRef,
    pub column: usize,
    pub row: usize,
}

impl CellRef {
    /// Parse A1 notation with a sheet prefix, e.g. `Operation Overview!AM15`
    /// or `'Operation Overview'!AM15`.
    pub fn parse(workbook: &str, a1: &str) -> FetchResult<CellRef> {
        let invalid = || FetchError::InvalidCell(a1.to_string());
        let (sheet, cell) = a1.rsplit_once('!').ok_or_else(invalid)?;
        let sheet = sheet.trim().trim_matches('\'');
        if sheet.is_empty() {
            return Err(invalid());
        }
        let cell = cell.trim();
        let split = cell
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = cell.split_at(split);
        let column = column_index(letters).ok_or_else(invalid)?;
        let row: usize = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }
        Ok(CellRef {
            sheet: SheetRef::new(workbook, sheet),
            column,
            row: row - 1,
        })
    }
}

pub trait SheetSource: Send + Sync {
    /// All rows of `sheet`. A sheet with no rows at all is
    /// [`FetchError::Empty`].
    fn fetch_rows(&self, sheet: &SheetRef) -> FetchResult<Sheet>;

    /// Trimmed text of one cell, `None` when blank.
    fn read_cell(&self, cell: &CellRef) -> FetchResult<Option<String>> {
        let sheet = self.fetch_rows(&cell.sheet)?;
        let value = sheet.cell(cell.row, cell.column).trim();
        if value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(value.to_string()))
        }
    }
}

/// Sheets held in memory, keyed by workbook and sheet name.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    sheets: HashMap<SheetRef, Vec<Vec<String>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sheet: SheetRef, rows: Vec<Vec<String>>) {
        self.sheets.insert(sheet, rows);
    }

    /// Builder-style insert from string literals.
    pub fn with_sheet(mut self, workbook: &str, sheet: &str, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        self.insert(SheetRef::new(workbook, sheet), rows);
        self
    }
}

impl SheetSource for MemorySource {
    fn fetch_rows(&self, sheet: &SheetRef) -> FetchResult<Sheet> {
        let rows = self
            .sheets
            .get(sheet)
            .ok_or_else(|| FetchError::SheetNotFound {
                workbook: sheet.workbook.clone(),
                sheet: sheet.sheet.clone(),
            })?;
        if rows.is_empty() {
            return Err(FetchError::Empty {
                workbook: sheet.workbook.clone(),
                sheet: sheet.sheet.clone(),
            });
        }
        Ok(Sheet::new(sheet.sheet.clone(), rows.clone()))
    }
}

/// A fetch running on a worker thread, awaited with a deadline.
pub struct Pending<T> {
    label: String,
    rx: mpsc::Receiver<FetchResult<T>>,
    deadline: Instant,
    timeout: Duration,
}

impl<T: Send + 'static> Pending<T> {
    pub fn spawn<F>(label: impl Into<String>, timeout: Duration, fetch: F) -> Self
    where
        F: FnOnce() -> FetchResult<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            // The receiver may already be gone after a timeout.
            let _ = tx.send(fetch());
        });
        Pending {
            label: label.into(),
            rx,
            deadline: Instant::now() + timeout,
            timeout,
        }
    }

    /// Block until the fetch finishes or the deadline passes. Expiry is
    /// reported as [`FetchError::Timeout`]; the worker is left to finish on
    /// its own.
    pub fn wait(self) -> FetchResult<T> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        match self.rx.recv_timeout(remaining) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(FetchError::Timeout {
                sheet: self.label,
                millis: self.timeout.as_millis() as u64,
            }),
            Err(RecvTimeoutError::Disconnected) => {
                Err(FetchError::WorkerLost { sheet: self.label })
            }
        }
    }
}

/// Start fetching all rows of `sheet` in the background.
pub fn fetch_rows_async(
    source: &Arc<dyn SheetSource>,
    sheet: &SheetRef,
    timeout: Duration,
) -> Pending<Sheet> {
    let source = Arc::clone(source);
    let sheet = sheet.clone();
    Pending::spawn(sheet.to_string(), timeout, move || source.fetch_rows(&sheet))
}

/// Start reading one cell in the background.
pub fn read_cell_async(
    source: &Arc<dyn SheetSource>,
    cell: &CellRef,
    timeout: Duration,
) -> Pending<Option<String>> {
    let source = Arc::clone(source);
    let cell = cell.clone();
    Pending::spawn(cell.sheet.to_string(), timeout, move || source.read_cell(&cell))
}
