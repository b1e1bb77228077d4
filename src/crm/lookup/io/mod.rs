//! Export sink: writes a [`Table`] to CSV or an Excel workbook.

pub mod csv_write;
pub mod excel_write;

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::crm::lookup::error::{LookupError, Result};
use crate::crm::lookup::flatten::Table;

/// File formats a table can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    /// Guesses the format from a file extension.
    pub fn detect(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(ExportFormat::Csv),
            "xlsx" => Some(ExportFormat::Xlsx),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Settles the destination path and format of an export.
///
/// With an explicit format a path without extension gets that format's
/// extension appended. Without one, the format comes from the extension.
pub fn resolve_destination(
    path: &Path,
    format: Option<ExportFormat>,
) -> Result<(PathBuf, ExportFormat)> {
    match (format, ExportFormat::detect(path)) {
        (Some(format), _) if path.extension().is_none() => {
            Ok((path.with_extension(format.extension()), format))
        }
        (Some(format), _) => Ok((path.to_path_buf(), format)),
        (None, Some(detected)) => Ok((path.to_path_buf(), detected)),
        (None, None) => Err(LookupError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Writes the table to `path`: a header of column names, then one row per
/// record in table order.
///
/// Failures are reported as [`LookupError::ExportWrite`]. A partially written
/// file is left in place.
#[instrument(
    level = "info",
    skip_all,
    fields(path = %path.display(), %format, rows = table.len())
)]
pub fn export_table(table: &Table, path: &Path, format: ExportFormat) -> Result<()> {
    let outcome = match format {
        ExportFormat::Csv => csv_write::write_csv(path, table),
        ExportFormat::Xlsx => excel_write::write_workbook(path, table),
    };

    outcome.map_err(|error| {
        warn!(%error, "export failed");
        LookupError::ExportWrite {
            path: path.to_path_buf(),
            reason: error.to_string(),
        }
    })?;

    info!("export written");
    Ok(())
}
