use crate::error::{FetchError, FetchResult};
use crate::source::{Sheet, SheetRef, SheetSource};
use csv::{ReaderBuilder, StringRecord};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Workbooks exported as CSV, one directory per workbook and one file per
/// sheet: `<root>/<workbook>/<sheet>.csv`.
///
/// Files are read without header handling so row 0 stays in the data, the
/// same as a spreadsheet range read.
#[derive(Debug, Clone)]
pub struct CsvWorkbookSource {
    root: PathBuf,
}

impl CsvWorkbookSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CsvWorkbookSource { root: root.into() }
    }

    pub fn sheet_path(&self, sheet: &SheetRef) -> PathBuf {
        self.root
            .join(&sheet.workbook)
            .join(format!("{}.csv", sheet.sheet))
    }
}

fn is_terminator(b: &u8) -> bool {
    matches!(b, b'\r' | b'\n')
}

/// Line breaks in a run of terminators; `\r\n` counts once.
fn line_breaks(gap: &[u8]) -> usize {
    gap.iter()
        .enumerate()
        .filter(|&(i, &b)| b == b'\n' || (b == b'\r' && gap.get(i + 1) != Some(&b'\n')))
        .count()
}

/// Read every record, keeping each at its sheet row. The csv reader skips
/// blank lines, so they are put back as empty rows to keep A1 row numbers
/// aligned with the file. Line breaks inside quoted cells do not add rows.
fn read_rows(path: &Path) -> FetchResult<Vec<Vec<String>>> {
    let display = path.display().to_string();
    let csv_err = |e: csv::Error| FetchError::Csv {
        path: display.clone(),
        source: e,
    };
    let bytes = fs::read(path).map_err(|e| csv_err(e.into()))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes.as_slice());

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut record = StringRecord::new();
    // Byte offset where the previous record's text ended.
    let mut content_end: Option<usize> = None;
    loop {
        let before = rdr.position().byte() as usize;
        if !rdr.read_record(&mut record).map_err(csv_err)? {
            break;
        }
        let start = before + bytes[before..].iter().take_while(|b| is_terminator(b)).count();
        let breaks = line_breaks(&bytes[content_end.unwrap_or(0)..start]);
        // The first break after a record only ends that record.
        let blank = match content_end {
            Some(_) => breaks.saturating_sub(1),
            None => breaks,
        };
        rows.extend(std::iter::repeat_with(Vec::new).take(blank));
        rows.push(record.iter().map(str::to_string).collect());

        let end = (rdr.position().byte() as usize).max(start);
        let trailing = bytes[start..end].iter().rev().take_while(|b| is_terminator(b)).count();
        content_end = Some(end - trailing);
    }
    Ok(rows)
}

impl SheetSource for CsvWorkbookSource {
    fn fetch_rows(&self, sheet: &SheetRef) -> FetchResult<Sheet> {
        let path = self.sheet_path(sheet);
        if !path.is_file() {
            return Err(FetchError::SheetNotFound {
                workbook: sheet.workbook.clone(),
                sheet: sheet.sheet.clone(),
            });
        }
        let rows = read_rows(&path)?;
        debug!("loaded {} rows from {}", rows.len(), path.display());
        if rows.is_empty() {
            return Err(FetchError::Empty {
                workbook: sheet.workbook.clone(),
                sheet: sheet.sheet.clone(),
            });
        }
        Ok(Sheet::new(sheet.sheet.clone(), rows))
    }
}
