use std::path::Path;

use crate::crm::lookup::error::Result;
use crate::crm::lookup::flatten::{Table, cell_text};

/// Writes the table as CSV. A table without columns produces an empty file.
pub fn write_csv(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    if !table.columns().is_empty() {
        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(row.iter().map(cell_text))?;
        }
    }

    writer.flush()?;
    Ok(())
}
