use crate::error::{Error, Result};
use crate::table::{Cell, CleanedTable};
use csv::Writer;
use std::io;
use std::path::Path;
use tracing::info;

fn csv_error(e: csv::Error) -> Error {
    match e.into_kind() {
        csv::ErrorKind::Io(io_err) => Error::Io(io_err),
        other => Error::Io(io::Error::other(format!("csv write failed: {:?}", other))),
    }
}

fn format_cell(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        Cell::Date(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Cell::Int(i) => i.to_string(),
        Cell::Null => String::new(),
    }
}

/// Write the cleaned table as the downloadable CSV artifact: normalized
/// headers first, dates as `YYYY-MM-DD HH:MM:SS`, absent values empty.
pub fn write_cleaned_csv(table: &CleanedTable, path: &Path) -> Result<()> {
    let mut wtr = Writer::from_path(path).map_err(csv_error)?;
    wtr.write_record(&table.headers).map_err(csv_error)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(format_cell))
            .map_err(csv_error)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = table.rows.len(), "artifact written");
    Ok(())
}
