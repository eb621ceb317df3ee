//! Check-in export
//!
//! One sheet, one row per participant in roster order, ten check-in columns
//! (newest first) formatted in the event timezone.

use chrono_tz::Tz;
use checkin_common::time::format_local;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;

use crate::store::{ParticipantStore, MAX_CHECK_INS};

pub const SHEET_NAME: &str = "Check-ins";
pub const EXPORT_FILENAME: &str = "checkins.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Fixed columns before the check-in columns, with their widths
const LEADING_COLUMNS: [(&str, f64); 6] = [
    ("序號", 8.0),
    ("ID", 10.0),
    ("Chinese Name", 20.0),
    ("English Name", 20.0),
    ("Email", 30.0),
    ("Voice", 10.0),
];

const CHECK_IN_WIDTH: f64 = 20.0;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to build spreadsheet: {0}")]
    Xlsx(#[from] XlsxError),
}

/// Header row labels
pub fn header_labels() -> Vec<String> {
    LEADING_COLUMNS
        .iter()
        .map(|(label, _)| label.to_string())
        .chain((1..=MAX_CHECK_INS).map(|n| format!("Check-in {}", n)))
        .collect()
}

/// Render the store as `.xlsx` bytes
pub fn export_workbook(store: &ParticipantStore, tz: Tz) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    for (col, label) in header_labels().iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, label, &bold)?;
    }
    for (col, (_, width)) in LEADING_COLUMNS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }
    let first_check_in_col = LEADING_COLUMNS.len() as u16;
    for n in 0..MAX_CHECK_INS as u16 {
        sheet.set_column_width(first_check_in_col + n, CHECK_IN_WIDTH)?;
    }

    for (index, (id, participant)) in store.iter().enumerate() {
        let row = index as u32 + 1;
        sheet.write_number(row, 0, (index + 1) as f64)?;
        sheet.write_string(row, 1, id)?;
        sheet.write_string(row, 2, &participant.name)?;
        sheet.write_string(row, 3, &participant.ename)?;
        sheet.write_string(row, 4, &participant.email)?;
        sheet.write_string(row, 5, &participant.voice)?;

        for (n, ts) in participant.check_ins.iter().take(MAX_CHECK_INS).enumerate() {
            sheet.write_string(row, first_check_in_col + n as u16, format_local(ts, tz))?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}
