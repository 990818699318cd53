use crate::error::{Error, Result};
use crate::table::RawTable;
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Read a CSV source into a [`RawTable`], skipping `start_row` records before
/// the header row. Ragged rows are padded (or truncated) to the header width.
///
/// A missing file is [`Error::NotFound`]; a file that exists but cannot be
/// decoded as tabular data is [`Error::Malformed`].
pub fn read_table(path: &Path, start_row: usize) -> Result<RawTable> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let malformed = |reason: String| Error::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    let mut headers: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<String>> = Vec::new();

    for (idx, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| malformed(format!("record {}: {}", idx, e)))?;
        if idx < start_row {
            continue;
        }

        let fields: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        match headers {
            None => {
                debug!(columns = fields.len(), "header row located");
                headers = Some(fields);
            }
            Some(ref h) => {
                let mut row = fields;
                row.resize(h.len(), String::new());
                rows.push(row);
            }
        }
    }

    let headers = headers.ok_or_else(|| {
        malformed(format!(
            "no header row found after skipping {} record(s)",
            start_row
        ))
    })?;

    let table = RawTable { headers, rows };
    info!(path = %path.display(), rows = table.rows.len(), columns = table.headers.len(), "source loaded");
    Ok(table)
}
