//! Roster import
//!
//! Reads the first sheet of an uploaded `.xlsx`/`.xls` workbook into a
//! [`Roster`]. The first row is the header; columns are located by name
//! (`id`, `cname`, `ename`, `email`, `voice`, `status`) in any order. A row
//! that lacks an `id` or a textual `status` fails the whole import.

use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::store::{Participant, Roster};

/// Accepted upload MIME types and the file extension each maps to
pub const SPREADSHEET_TYPES: &[(&str, &str)] = &[
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ),
    ("application/vnd.ms-excel", "xls"),
];

/// File extension for an accepted spreadsheet MIME type
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    SPREADSHEET_TYPES
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(essence))
        .map(|(_, ext)| *ext)
}

/// Why a single row was refused
#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("missing id")]
    MissingId,

    #[error("missing status")]
    MissingStatus,

    #[error("status is not text (found {0})")]
    NonTextStatus(String),
}

/// Import failures
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Cannot read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Workbook has no sheets")]
    NoSheets,

    #[error("Row {row}: {reason}")]
    Row { row: usize, reason: RowError },
}

/// Header positions of the roster columns
#[derive(Debug, Default)]
struct Columns {
    id: Option<usize>,
    cname: Option<usize>,
    ename: Option<usize>,
    email: Option<usize>,
    voice: Option<usize>,
    status: Option<usize>,
}

impl Columns {
    fn from_header(header: &[Data]) -> Self {
        let mut columns = Self::default();
        for (index, cell) in header.iter().enumerate() {
            let slot = match cell_text(cell).as_deref().map(str::trim) {
                Some("id") => &mut columns.id,
                Some("cname") => &mut columns.cname,
                Some("ename") => &mut columns.ename,
                Some("email") => &mut columns.email,
                Some("voice") => &mut columns.voice,
                Some("status") => &mut columns.status,
                _ => continue,
            };
            // first occurrence wins
            slot.get_or_insert(index);
        }
        columns
    }
}

/// Read the first sheet of the workbook at `path`
///
/// The format is picked from the file extension.
pub fn read_roster(path: &Path) -> Result<Roster, ImportError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ImportError::NoSheets)?;
    debug!("Importing roster from sheet '{}'", sheet);

    let range = workbook.worksheet_range(&sheet)?;
    let roster = parse_roster(&range)?;

    info!("Parsed {} participants from {}", roster.len(), path.display());
    Ok(roster)
}

/// Turn a sheet range into a roster
pub fn parse_roster(range: &Range<Data>) -> Result<Roster, ImportError> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Roster::new());
    };
    let columns = Columns::from_header(header);

    // Spreadsheet row number of the header, for error messages
    let first_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

    let mut roster = Roster::new();
    for (offset, row) in rows.enumerate() {
        if row.iter().all(is_blank) {
            continue;
        }
        let row_number = first_row + offset + 1;
        let (id, participant) = parse_row(row, &columns).map_err(|reason| ImportError::Row {
            row: row_number,
            reason,
        })?;
        roster.insert(id, participant);
    }

    Ok(roster)
}

fn parse_row(row: &[Data], columns: &Columns) -> Result<(String, Participant), RowError> {
    let field = |column: Option<usize>| -> Option<String> {
        column
            .and_then(|index| row.get(index))
            .and_then(cell_text)
    };

    let id = field(columns.id)
        .filter(|id| !id.is_empty())
        .ok_or(RowError::MissingId)?;

    let status = match columns.status.and_then(|index| row.get(index)) {
        None | Some(Data::Empty) => return Err(RowError::MissingStatus),
        Some(Data::String(status)) => status,
        Some(other) => return Err(RowError::NonTextStatus(other.to_string())),
    };

    let participant = Participant {
        name: field(columns.cname).unwrap_or_default(),
        ename: field(columns.ename).unwrap_or_default(),
        email: field(columns.email).unwrap_or_default(),
        voice: field(columns.voice).unwrap_or_default(),
        is_valid: status.eq_ignore_ascii_case("valid"),
        check_ins: Vec::new(),
    };

    Ok((id, participant))
}

/// Text of a cell, `None` when blank
///
/// Whole numbers lose their `.0`, so numeric IDs come through as `1001`.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
        other => Some(other.to_string()),
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    fn range_of(rows: Vec<Vec<Data>>) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.into_iter().enumerate() {
            for (c, cell) in row.into_iter().enumerate() {
                range.set_value((r as u32, c as u32), cell);
            }
        }
        range
    }

    fn header() -> Vec<Data> {
        ["id", "cname", "ename", "email", "voice", "status"]
            .into_iter()
            .map(text)
            .collect()
    }

    #[test]
    fn test_extension_for_content_type() {
        assert_eq!(
            extension_for("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            Some("xlsx")
        );
        assert_eq!(extension_for("application/vnd.ms-excel"), Some("xls"));
        assert_eq!(extension_for("application/vnd.ms-excel; charset=binary"), Some("xls"));
        assert_eq!(extension_for("text/csv"), None);
        assert_eq!(extension_for("application/octet-stream"), None);
    }

    #[test]
    fn test_parse_rows_and_validity() {
        let range = range_of(vec![
            header(),
            vec![text("A1"), text("陳大文"), text("Tai Man"), text("a1@example.com"), text("T"), text("Valid")],
            vec![text("B2"), text("李小明"), Data::Empty, Data::Empty, Data::Empty, text("expired")],
            vec![text("C3"), Data::Empty, Data::Empty, Data::Empty, Data::Empty, text("VALID")],
            vec![text("D4"), Data::Empty, Data::Empty, Data::Empty, Data::Empty, text("Valid ")],
        ]);

        let roster = parse_roster(&range).unwrap();
        assert_eq!(roster.len(), 4);

        let a1 = &roster["A1"];
        assert_eq!(a1.name, "陳大文");
        assert_eq!(a1.ename, "Tai Man");
        assert_eq!(a1.email, "a1@example.com");
        assert_eq!(a1.voice, "T");
        assert!(a1.is_valid);
        assert!(a1.check_ins.is_empty());

        assert!(!roster["B2"].is_valid);
        assert_eq!(roster["B2"].ename, "");
        assert!(roster["C3"].is_valid);
        // only an exact case-insensitive match counts
        assert!(!roster["D4"].is_valid);
    }

    #[test]
    fn test_columns_found_by_name_in_any_order() {
        let range = range_of(vec![
            vec![text("status"), text("ename"), text("id")],
            vec![text("valid"), text("Only English"), text("X1")],
        ]);

        let roster = parse_roster(&range).unwrap();
        let x1 = &roster["X1"];
        assert_eq!(x1.ename, "Only English");
        assert_eq!(x1.name, "");
        assert_eq!(x1.voice, "");
        assert!(x1.is_valid);
    }

    #[test]
    fn test_numeric_id_has_no_decimal() {
        let range = range_of(vec![
            vec![text("id"), text("status")],
            vec![Data::Float(1001.0), text("valid")],
            vec![Data::Int(1002), text("valid")],
        ]);

        let roster = parse_roster(&range).unwrap();
        assert!(roster.contains_key("1001"));
        assert!(roster.contains_key("1002"));
    }

    #[test]
    fn test_missing_status_fails_with_row_number() {
        let range = range_of(vec![
            header(),
            vec![text("A1"), text("A"), Data::Empty, Data::Empty, Data::Empty, text("valid")],
            vec![text("B2"), text("B"), Data::Empty, Data::Empty, Data::Empty, Data::Empty],
        ]);

        match parse_roster(&range) {
            Err(ImportError::Row { row, reason }) => {
                assert_eq!(row, 3);
                assert_eq!(reason, RowError::MissingStatus);
            }
            other => panic!("expected row error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_text_status_fails() {
        let range = range_of(vec![
            vec![text("id"), text("status")],
            vec![text("A1"), Data::Bool(true)],
        ]);

        assert!(matches!(
            parse_roster(&range),
            Err(ImportError::Row { row: 2, reason: RowError::NonTextStatus(_) })
        ));
    }

    #[test]
    fn test_missing_id_fails() {
        let range = range_of(vec![
            vec![text("id"), text("cname"), text("status")],
            vec![Data::Empty, text("Nobody"), text("valid")],
        ]);

        assert!(matches!(
            parse_roster(&range),
            Err(ImportError::Row { row: 2, reason: RowError::MissingId })
        ));
    }

    #[test]
    fn test_blank_rows_skipped_and_duplicates_overwrite() {
        let range = range_of(vec![
            vec![text("id"), text("cname"), text("status")],
            vec![text("A1"), text("First"), text("valid")],
            vec![Data::Empty, Data::Empty, Data::Empty],
            vec![text("B2"), text("Bee"), text("valid")],
            vec![text("A1"), text("Second"), text("invalid")],
        ]);

        let roster = parse_roster(&range).unwrap();
        let ids: Vec<&String> = roster.keys().collect();
        assert_eq!(ids, ["A1", "B2"]);
        assert_eq!(roster["A1"].name, "Second");
        assert!(!roster["A1"].is_valid);
    }

    #[test]
    fn test_header_only_sheet_is_empty_roster() {
        let range = range_of(vec![header()]);
        assert!(parse_roster(&range).unwrap().is_empty());
    }

    #[test]
    fn test_read_roster_from_xlsx_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in ["id", "cname", "ename", "email", "voice", "status"].iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        sheet.write_string(1, 0, "A1").unwrap();
        sheet.write_string(1, 1, "陳大文").unwrap();
        sheet.write_string(1, 5, "Valid").unwrap();
        sheet.write_number(2, 0, 2002).unwrap();
        sheet.write_string(2, 5, "pending").unwrap();
        // a second sheet is ignored
        let other = workbook.add_worksheet();
        other.write_string(0, 0, "id").unwrap();
        other.write_string(1, 0, "IGNORED").unwrap();
        workbook.save(&path).unwrap();

        let roster = read_roster(&path).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster["A1"].name, "陳大文");
        assert!(roster["A1"].is_valid);
        assert!(!roster["2002"].is_valid);
        assert!(!roster.contains_key("IGNORED"));
    }

    #[test]
    fn test_read_roster_rejects_non_spreadsheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.xlsx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();

        assert!(matches!(read_roster(&path), Err(ImportError::Workbook(_))));
    }
}
