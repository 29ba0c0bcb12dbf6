use rust_xlsxwriter::{Format, Workbook};

use super::projector::{project, HEADINGS};
use super::{ExportError, ExportFormat};
use crate::database::models::Customer;

pub fn write_export(customers: &[Customer], format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => write_csv(customers),
        ExportFormat::Xlsx => write_xlsx(customers),
    }
}

fn write_csv(customers: &[Customer]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADINGS)?;
    for customer in customers {
        writer.write_record(project(customer))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::CsvBuffer(e.to_string()))
}

fn write_xlsx(customers: &[Customer]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Customers")?;

    for (col, heading) in HEADINGS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *heading, &bold)?;
    }

    for (i, customer) in customers.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, value) in project(customer).iter().enumerate() {
            sheet.write_string(row, col as u16, value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}
