//! Turning uploaded spreadsheet bytes into per-sheet rows.
//!
//! Only `.xls` and `.xlsx` uploads are accepted, and the extension alone is not
//! trusted: the bytes must also start with the container signature of that format
//! (see [`format`]). Parsing itself is left to `calamine`.
//!
//! Each sheet is reduced to a header row plus a list of row objects:
//! - the first row holding any value is the header row;
//! - blank headers become `__EMPTY`, `__EMPTY_1`, ... and repeated headers get a
//!   `_1`, `_2`, ... suffix, so every column has a unique key;
//! - every later row with at least one value becomes an object of header -> value,
//!   with empty cells left out.

mod format;

pub use format::{detect_format, WorkbookFormat};

use crate::error::{ServiceError, ServiceResult};
use calamine::{Data, Range, Reader, Xls, Xlsx};
use common::model::file_record::Row;
use rayon::prelude::*;
use serde_json::{Number, Value};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::io::{Cursor, Read, Seek};

const BLANK_HEADER: &str = "__EMPTY";

/// One worksheet after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSheet {
    pub name: String,
    pub column_headers: Vec<String>,
    pub rows: Vec<Row>,
}

/// Parses every worksheet of the workbook, in workbook order.
///
/// Blocking: call it from a blocking thread.
pub fn parse_workbook(format: WorkbookFormat, bytes: Vec<u8>) -> ServiceResult<Vec<ParsedSheet>> {
    let cursor = Cursor::new(bytes);
    match format {
        WorkbookFormat::Xlsx => {
            let mut workbook: Xlsx<_> = Xlsx::new(cursor).map_err(parse_error)?;
            read_sheets(&mut workbook)
        }
        WorkbookFormat::Xls => {
            let mut workbook: Xls<_> = Xls::new(cursor).map_err(parse_error)?;
            read_sheets(&mut workbook)
        }
    }
}

fn parse_error(err: impl Display) -> ServiceError {
    ServiceError::Parse(err.to_string())
}

fn read_sheets<RS, R>(workbook: &mut R) -> ServiceResult<Vec<ParsedSheet>>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: Display,
{
    let names = workbook.sheet_names();
    let mut ranges = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name).map_err(parse_error)?;
        ranges.push((name, range));
    }

    // Reading is sequential (one archive cursor), converting ranges into rows is not.
    Ok(ranges
        .into_par_iter()
        .map(|(name, range)| sheet_from_range(name, &range))
        .collect())
}

fn sheet_from_range(name: String, range: &Range<Data>) -> ParsedSheet {
    let mut rows = range
        .rows()
        .filter(|cells| cells.iter().any(|cell| !is_blank(cell)));

    let Some(header_cells) = rows.next() else {
        return ParsedSheet {
            name,
            column_headers: Vec::new(),
            rows: Vec::new(),
        };
    };

    let column_headers = header_names(header_cells);
    let rows = rows
        .map(|cells| {
            column_headers
                .iter()
                .zip(cells)
                .filter_map(|(header, cell)| cell_value(cell).map(|value| (header.clone(), value)))
                .collect::<Row>()
        })
        .collect();

    ParsedSheet {
        name,
        column_headers,
        rows,
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Unique, non-empty column keys for a header row.
pub(crate) fn header_names(cells: &[Data]) -> Vec<String> {
    let mut next_suffix: HashMap<String, usize> = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();

    cells
        .iter()
        .map(|cell| {
            let base = if is_blank(cell) {
                BLANK_HEADER.to_string()
            } else {
                cell.to_string().trim().to_string()
            };

            let mut n = next_suffix.get(&base).copied().unwrap_or(0);
            let mut candidate = if n == 0 {
                base.clone()
            } else {
                format!("{}_{}", base, n)
            };
            // A literal "Name_1" header must not be shadowed by a generated one.
            while used.contains(&candidate) {
                n += 1;
                candidate = format!("{}_{}", base, n);
            }
            next_suffix.insert(base, n + 1);
            used.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// JSON value of a cell; `None` for empty cells.
pub(crate) fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(Value::String(s.clone())),
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => Some(
            Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(f.to_string())),
        ),
        Data::Bool(b) => Some(Value::Bool(*b)),
        other => Some(Value::String(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_xlsxwriter::Workbook;
    use serde_json::json;

    fn s(value: &str) -> Data {
        Data::String(value.to_string())
    }

    #[test]
    fn headers_are_made_unique() {
        let cells = vec![s("Name"), Data::Empty, s("Name"), s(" "), s("Name_1"), Data::Float(2024.0)];
        assert_eq!(
            header_names(&cells),
            vec!["Name", "__EMPTY", "Name_1", "__EMPTY_1", "Name_1_1", "2024"]
        );
    }

    #[test]
    fn literal_suffix_headers_are_not_shadowed() {
        let cells = vec![s("Total_1"), s("Total"), s("Total")];
        assert_eq!(header_names(&cells), vec!["Total_1", "Total", "Total_2"]);
    }

    #[test]
    fn cell_values_keep_their_json_type() {
        assert_eq!(cell_value(&Data::Empty), None);
        assert_eq!(cell_value(&Data::Int(7)), Some(json!(7)));
        assert_eq!(cell_value(&Data::Float(2.5)), Some(json!(2.5)));
        assert_eq!(cell_value(&Data::Bool(true)), Some(json!(true)));
        assert_eq!(cell_value(&s("north")), Some(json!("north")));
        assert_eq!(cell_value(&Data::Float(f64::NAN)), Some(json!("NaN")));
    }

    fn sample_xlsx() -> Vec<u8> {
        let mut workbook = Workbook::new();

        let sales = workbook.add_worksheet();
        sales.set_name("Sales").unwrap();
        sales.write_string(0, 0, "Region").unwrap();
        sales.write_string(0, 1, "Units").unwrap();
        sales.write_string(1, 0, "North").unwrap();
        sales.write_number(1, 1, 120).unwrap();
        // Row 2 left blank on purpose; row 3 misses its region.
        sales.write_number(3, 1, 80.5).unwrap();

        let notes = workbook.add_worksheet();
        notes.set_name("Notes").unwrap();

        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn parses_every_sheet_in_workbook_order() {
        let sheets = parse_workbook(WorkbookFormat::Xlsx, sample_xlsx()).unwrap();
        assert_eq!(
            sheets.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            vec!["Sales", "Notes"]
        );

        let sales = &sheets[0];
        assert_eq!(sales.column_headers, vec!["Region", "Units"]);
        assert_eq!(
            sales.rows,
            vec![
                json!({"Region": "North", "Units": 120.0}).as_object().cloned().unwrap(),
                json!({"Units": 80.5}).as_object().cloned().unwrap(),
            ]
        );

        let notes = &sheets[1];
        assert!(notes.column_headers.is_empty());
        assert!(notes.rows.is_empty());
    }

    #[test]
    fn corrupt_archives_are_parse_errors() {
        let mut bytes = b"PK\x03\x04".to_vec();
        bytes.extend_from_slice(&[0u8; 64]);
        assert!(matches!(
            parse_workbook(WorkbookFormat::Xlsx, bytes),
            Err(ServiceError::Parse(_))
        ));
    }
}
