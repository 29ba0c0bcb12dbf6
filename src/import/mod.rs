//! Bulk customer import from CSV and Excel uploads.

pub mod reader;
pub mod row_mapper;

use thiserror::Error;

pub use reader::{read_sheet, Sheet};
pub use row_mapper::{normalize_header, HeaderMap, ImportReport, MappedRow, RowOutcome};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("xlsx: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("workbook has no worksheets")]
    EmptyWorkbook,
}

/// Upload formats recognised by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Xlsx,
}

impl SheetFormat {
    pub const ACCEPTED: &'static str = "csv, xlsx";

    pub fn from_file_name(name: &str) -> Result<Self, ImportError> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(SheetFormat::Csv),
            "xlsx" => Ok(SheetFormat::Xlsx),
            _ => Err(ImportError::UnsupportedFormat(name.to_string())),
        }
    }
}
