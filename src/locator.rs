use crate::source::{cell_at, Sheet};
use log::debug;

/// A metrics row matched by shift code and date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatedRow<'a> {
    /// 1-based row number in the sheet (the header is row 1).
    pub sheet_row: usize,
    pub cells: &'a [String],
}

/// Find the first data row whose `shift_col` equals `shift_code` and whose
/// `date_col` equals `date`, both compared verbatim.
///
/// `None` means the sheet has no data for this shift and date, which callers
/// report as such rather than as a row of zeros.
pub fn locate_row<'a>(
    sheet: &'a Sheet,
    shift_col: usize,
    date_col: usize,
    shift_code: &str,
    date: &str,
) -> Option<LocatedRow<'a>> {
    let found = sheet
        .data_rows()
        .find(|(_, row)| cell_at(row, shift_col) == shift_code && cell_at(row, date_col) == date)
        .map(|(sheet_row, cells)| LocatedRow { sheet_row, cells });
    match &found {
        Some(row) => debug!("{} {} found at row {}", shift_code, date, row.sheet_row),
        None => debug!("{} {} not present in '{}'", shift_code, date, sheet.name),
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[&str]]) -> Sheet {
        Sheet::new(
            "Metrics",
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn finds_matching_row_and_misses_absent_shift() {
        let s = sheet(&[
            &["Shift", "Date", "A"],
            &["T1", "24/10/2025", "5"],
            &["T2", "24/10/2025", "7"],
        ]);
        let hit = locate_row(&s, 0, 1, "T2", "24/10/2025").unwrap();
        assert_eq!(hit.sheet_row, 3);
        assert_eq!(hit.cells[2], "7");
        assert!(locate_row(&s, 0, 1, "T3", "24/10/2025").is_none());
    }

    #[test]
    fn first_match_wins() {
        let s = sheet(&[
            &["Shift", "Date", "A"],
            &["T1", "24/10/2025", "first"],
            &["T1", "24/10/2025", "second"],
        ]);
        let hit = locate_row(&s, 0, 1, "T1", "24/10/2025").unwrap();
        assert_eq!(hit.cells[2], "first");
    }

    #[test]
    fn header_row_is_never_matched() {
        let s = sheet(&[&["T1", "24/10/2025"]]);
        assert!(locate_row(&s, 0, 1, "T1", "24/10/2025").is_none());
    }

    #[test]
    fn comparison_is_exact() {
        let s = sheet(&[&["Shift", "Date"], &["t1", "24/10/2025"], &["T1 ", "24/10/2025"]]);
        assert!(locate_row(&s, 0, 1, "T1", "24/10/2025").is_none());
    }
}
