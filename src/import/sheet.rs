use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("could not read file as a spreadsheet or delimited text: {0}")]
    Unreadable(String),
    #[error("workbook contains no sheets")]
    NoSheets,
}

/// Supported tabular containers, picked from the upload's file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Native spreadsheet container (xlsx/xls/xlsb/ods).
    Spreadsheet,
    /// Plain delimited text.
    Delimited,
}

impl FileKind {
    pub fn from_name(name: &str) -> FileKind {
        let ext = name.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => FileKind::Spreadsheet,
            _ => FileKind::Delimited,
        }
    }
}

/// One loaded cell. The loader keeps the source typing (text vs number vs
/// native date) so the field extractors can honor it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(chrono::NaiveDateTime),
}

impl Cell {
    /// Plain-text rendering. Whole numbers drop the trailing `.0` so house
    /// and contact numbers loaded as floats read back as typed.
    pub fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Cell::Bool(b) => b.to_string(),
            Cell::Date(dt) => dt.date().to_string(),
        }
    }
}

/// A 2D grid of cells, positioned exactly as in the source file (leading
/// blank rows and columns preserved) so row numbers in diagnostics match what
/// the user sees. Header inference is entirely the caller's business.
#[derive(Debug, Default)]
pub struct Sheet {
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, idx: usize) -> &[Cell] {
        self.rows.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

/// Load raw bytes into a [`Sheet`]. Spreadsheet input that calamine cannot
/// open falls back to the delimited reader, mirroring how uploads with a
/// misleading extension were handled upstream.
pub fn load_sheet(bytes: &[u8], kind: FileKind) -> Result<Sheet, SheetError> {
    match kind {
        FileKind::Spreadsheet => match load_workbook(bytes) {
            Ok(sheet) => Ok(sheet),
            Err(SheetError::NoSheets) => Err(SheetError::NoSheets),
            Err(workbook_err) => {
                tracing::warn!(
                    target = "balangay",
                    event = "workbook_fallback_csv",
                    error = %workbook_err
                );
                load_delimited(bytes).map_err(|_| workbook_err)
            }
        },
        FileKind::Delimited => load_delimited(bytes),
    }
}

fn load_workbook(bytes: &[u8]) -> Result<Sheet, SheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| SheetError::Unreadable(e.to_string()))?;

    let names = workbook.sheet_names().to_owned();
    let first = names.first().ok_or(SheetError::NoSheets)?.clone();
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| SheetError::Unreadable(e.to_string()))?;

    // The used range can start anywhere; pad back to A1 so coordinates stay
    // absolute.
    let (row_offset, col_offset) = match range.start() {
        Some((r, c)) => (r as usize, c as usize),
        None => (0, 0),
    };

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for source_row in range.rows() {
        let mut row = vec![Cell::Empty; col_offset];
        row.extend(source_row.iter().map(convert_cell));
        rows.push(row);
    }
    Ok(Sheet { rows })
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => Cell::Date(naive),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

fn load_delimited(bytes: &[u8]) -> Result<Sheet, SheetError> {
    // Lossy decode keeps cp1252 exports readable instead of failing the run.
    let text = String::from_utf8_lossy(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SheetError::Unreadable(e.to_string()))?;
        let row = record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        rows.push(row);
    }
    Ok(Sheet { rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kind_from_name() {
        assert_eq!(FileKind::from_name("masterlist.xlsx"), FileKind::Spreadsheet);
        assert_eq!(FileKind::from_name("OLD.XLS"), FileKind::Spreadsheet);
        assert_eq!(FileKind::from_name("residents.csv"), FileKind::Delimited);
        assert_eq!(FileKind::from_name("noext"), FileKind::Delimited);
    }

    #[test]
    fn render_drops_float_artifacts() {
        assert_eq!(Cell::Number(12.0).render(), "12");
        assert_eq!(Cell::Number(12.5).render(), "12.5");
        assert_eq!(Cell::Empty.render(), "");
    }

    #[test]
    fn delimited_rows_keep_position() {
        let bytes = b"a,b,c\n,,\nx,,z\n";
        let sheet = load_delimited(bytes).unwrap();
        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.cell(0, 1), &Cell::Text("b".into()));
        assert_eq!(sheet.cell(1, 1), &Cell::Empty);
        assert_eq!(sheet.cell(2, 2), &Cell::Text("z".into()));
        assert_eq!(sheet.cell(9, 9), &Cell::Empty);
    }
}
