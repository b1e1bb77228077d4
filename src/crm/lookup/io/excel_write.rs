use std::path::Path;

use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::Value;

use crate::crm::lookup::error::Result;
use crate::crm::lookup::flatten::{Cell, Table};

/// Name of the single worksheet holding the results.
pub const RESULTS_SHEET: &str = "Results";

/// Writes the table to a single-sheet workbook at the given path.
///
/// Numbers and booleans become typed cells; absent and `null` cells stay
/// empty. Non-empty results are wrapped in an autofiltered Excel table.
pub fn write_workbook(path: &Path, table: &Table) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(RESULTS_SHEET)?;

    for (col_idx, header) in table.columns().iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            write_cell(worksheet, (row_idx + 1) as u32, col_idx as u16, cell)?;
        }
    }

    if !table.columns().is_empty() && !table.is_empty() {
        let mut excel_table = rust_xlsxwriter::Table::new();
        excel_table.set_autofilter(true);
        let col_end = (table.columns().len() as u16).saturating_sub(1);
        let row_end = table.len() as u32;
        worksheet.add_table(0, 0, row_end, col_end, &excel_table)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    match cell {
        None | Some(Value::Null) => {}
        Some(Value::String(text)) => {
            worksheet.write_string(row, col, text)?;
        }
        Some(Value::Bool(flag)) => {
            worksheet.write_boolean(row, col, *flag)?;
        }
        Some(Value::Number(number)) => match number.as_f64() {
            Some(value) => {
                worksheet.write_number(row, col, value)?;
            }
            None => {
                worksheet.write_string(row, col, number.to_string())?;
            }
        },
        Some(other) => {
            worksheet.write_string(row, col, other.to_string())?;
        }
    }
    Ok(())
}
