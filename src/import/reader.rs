use calamine::{Data, Reader, Xlsx};
use std::io::Cursor;

use super::{ImportError, SheetFormat};

/// First row as headings, remaining rows as optional cell text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

pub fn read_sheet(bytes: &[u8], format: SheetFormat) -> Result<Sheet, ImportError> {
    match format {
        SheetFormat::Csv => read_csv(bytes),
        SheetFormat::Xlsx => read_xlsx(bytes),
    }
}

fn read_csv(bytes: &[u8]) -> Result<Sheet, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(cell_text).collect());
    }

    Ok(Sheet { headers, rows })
}

/// Reads the first worksheet
fn read_xlsx(bytes: &[u8]) -> Result<Sheet, ImportError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::EmptyWorkbook)??;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(first) => first
            .iter()
            .map(|cell| xlsx_cell_text(cell).unwrap_or_default())
            .collect(),
        None => return Ok(Sheet::default()),
    };

    let rows = rows.map(|row| row.iter().map(xlsx_cell_text).collect()).collect();

    Ok(Sheet { headers, rows })
}

fn cell_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Numbers with no fractional part lose the `.0` (phone numbers stored as numbers)
fn xlsx_cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => cell_text(s),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
        other => cell_text(&other.to_string()),
    }
}
