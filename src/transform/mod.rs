pub mod columns;
pub mod date_parser;

use crate::error::{Error, Result};
use crate::ingest;
use crate::table::{Cell, CleanedTable, RawTable};
use columns::{
    normalize_column_name, DEFAULT_DATE_COLS, DEFAULT_KEEP_COLS, ETC_AGE_COL, LAST_ETC_DATE_COL,
    RELEASED_STATUS, REPORT_DATE_COL, SERVICE_LINE_COL, STATUS_COL,
};
use std::path::Path;
use tracing::info;

/// Parameters for one transform run. `start_row` is signed so that the
/// non-negative precondition is checked here rather than at the call site.
#[derive(Debug, Clone)]
pub struct TransformOptions {
    pub start_row: i64,
    pub service_line: String,
    /// Override of the retained-column list; defaults to [`DEFAULT_KEEP_COLS`].
    pub keep_cols: Option<Vec<String>>,
    /// Override of the date-coerced columns; defaults to [`DEFAULT_DATE_COLS`].
    pub date_cols: Option<Vec<String>>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions {
            start_row: 0,
            service_line: "Consulting".to_string(),
            keep_cols: None,
            date_cols: None,
        }
    }
}

impl TransformOptions {
    pub fn with_service_line(service_line: impl Into<String>) -> Self {
        TransformOptions {
            service_line: service_line.into(),
            ..Default::default()
        }
    }

    fn validated_start_row(&self) -> Result<usize> {
        usize::try_from(self.start_row)
            .map_err(|_| Error::InvalidArgument("start_row must be a non-negative integer".into()))
    }
}

/// Read the engagement list at `path` and run the full transform. This is the
/// one-call entry point for an upload action.
pub fn process_engagement_data(path: &Path, opts: &TransformOptions) -> Result<CleanedTable> {
    let start_row = opts.validated_start_row()?;
    info!(path = %path.display(), start_row, service_line = %opts.service_line, "processing engagement data");
    let raw = ingest::read_table(path, start_row)?;
    transform(&raw, opts)
}

/// Pure transform core: narrow to the kept columns, filter to released
/// engagements on the requested service line, coerce dates, derive
/// `last_etc_date` / `report_date` / `etc_age`, and normalize headers.
///
/// Deterministic for a given table and options; the only cross-row value is
/// `report_date`, the maximum `Last Time Charged Date` of the filtered set.
pub fn transform(raw: &RawTable, opts: &TransformOptions) -> Result<CleanedTable> {
    opts.validated_start_row()?;

    let keep: Vec<&str> = match &opts.keep_cols {
        Some(cols) => cols.iter().map(String::as_str).collect(),
        None => DEFAULT_KEEP_COLS.to_vec(),
    };
    let date_cols: Vec<&str> = match &opts.date_cols {
        Some(cols) => cols.iter().map(String::as_str).collect(),
        None => DEFAULT_DATE_COLS.to_vec(),
    };

    // Narrow to the kept columns; every one of them must exist in the source.
    let keep_idx: Vec<usize> = keep
        .iter()
        .map(|name| {
            raw.column_index(name)
                .ok_or_else(|| Error::Schema((*name).to_string()))
        })
        .collect::<Result<_>>()?;
    info!(rows = raw.rows.len(), columns = keep.len(), "narrowed to kept columns");

    // The filter and derivation columns must be part of the kept set.
    let pos_of = |name: &str| -> Result<usize> {
        keep.iter()
            .position(|c| *c == name)
            .ok_or_else(|| Error::Schema(name.to_string()))
    };
    let service_pos = pos_of(SERVICE_LINE_COL)?;
    let status_pos = pos_of(STATUS_COL)?;
    let release_pos = pos_of("Release Date")?;
    let charged_pos = pos_of("Last Time Charged Date")?;
    let etcp_pos = pos_of("Last Active ETC-P Date")?;

    let is_date_col: Vec<bool> = keep.iter().map(|c| date_cols.contains(c)).collect();
    for dc in &date_cols {
        if !keep.contains(dc) {
            return Err(Error::Schema((*dc).to_string()));
        }
    }

    // Filter: released engagements on the requested service line. The service
    // line compares case-insensitively on trimmed text, status is exact.
    let wanted_line = opts.service_line.trim().to_lowercase();
    let filtered: Vec<&Vec<String>> = raw
        .rows
        .iter()
        .filter(|row| {
            let line = row[keep_idx[service_pos]].trim().to_lowercase();
            let status = row[keep_idx[status_pos]].trim();
            line == wanted_line && status == RELEASED_STATUS
        })
        .collect();
    info!(rows = filtered.len(), service_line = %opts.service_line, "filtered to released engagements");

    // Type the kept cells. A date cell that fails to parse becomes Null rather
    // than aborting the load; blank text also becomes Null.
    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(filtered.len());
    for src in &filtered {
        let mut row: Vec<Cell> = Vec::with_capacity(keep_idx.len() + 3);
        for (pos, &idx) in keep_idx.iter().enumerate() {
            let value = src[idx].trim();
            let cell = if is_date_col[pos] {
                match date_parser::parse_datetime(value) {
                    Some(dt) => Cell::Date(dt),
                    None => Cell::Null,
                }
            } else if value.is_empty() {
                Cell::Null
            } else {
                Cell::Text(value.to_string())
            };
            row.push(cell);
        }
        rows.push(row);
    }

    // report_date is corpus-wide: the max Last Time Charged Date of the
    // filtered set. An empty set has no rows to stamp, so derivation never
    // fails.
    let report_date = rows
        .iter()
        .filter_map(|r| r[charged_pos].as_date())
        .max();

    for row in &mut rows {
        let last_etc = row[etcp_pos]
            .as_date()
            .or_else(|| row[release_pos].as_date());
        row.push(match last_etc {
            Some(dt) => Cell::Date(dt),
            None => Cell::Null,
        });
        row.push(match report_date {
            Some(dt) => Cell::Date(dt),
            None => Cell::Null,
        });
        row.push(match (report_date, last_etc) {
            (Some(report), Some(etc)) => Cell::Int((report - etc).num_days()),
            _ => Cell::Null,
        });
    }

    let mut headers: Vec<String> = keep.iter().map(|c| normalize_column_name(c)).collect();
    headers.push(LAST_ETC_DATE_COL.to_string());
    headers.push(REPORT_DATE_COL.to_string());
    headers.push(ETC_AGE_COL.to_string());

    let cleaned = CleanedTable { headers, rows };
    info!(rows = cleaned.rows.len(), columns = cleaned.headers.len(), "transform complete");
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample_row(
        id: &str,
        service_line: &str,
        status: &str,
        release: &str,
        charged: &str,
        etcp: &str,
    ) -> Vec<String> {
        vec![
            id.to_string(),
            "2024-01-05".to_string(), // Creation Date
            release.to_string(),
            charged.to_string(),
            "2024-05-20".to_string(), // Last Expenses Charged Date
            etcp.to_string(),
            format!("Engagement {}", id),
            "Acme Ltd".to_string(),
            "Pat Partner".to_string(),
            "P001".to_string(),
            "Max Manager".to_string(),
            "M001".to_string(),
            service_line.to_string(),
            status.to_string(),
        ]
    }

    fn sample_table(rows: Vec<Vec<String>>) -> RawTable {
        RawTable {
            headers: DEFAULT_KEEP_COLS.iter().map(|s| s.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn negative_start_row_is_invalid_argument() {
        let opts = TransformOptions {
            start_row: -1,
            ..Default::default()
        };
        let err = transform(&sample_table(vec![]), &opts).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn missing_source_is_not_found() {
        let err = process_engagement_data(
            Path::new("/no/such/engagement_list.csv"),
            &TransformOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn missing_keep_column_is_schema_error() {
        let mut table = sample_table(vec![]);
        table.headers.retain(|h| h != "Client");
        let err = transform(&table, &TransformOptions::default()).unwrap_err();
        match err {
            Error::Schema(col) => assert_eq!(col, "Client"),
            other => panic!("expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn filters_on_status_and_service_line() {
        let table = sample_table(vec![
            sample_row("E1", "Consulting", "Released", "2024-06-10", "2024-06-01", ""),
            sample_row("E2", "consulting", "Released", "2024-06-10", "2024-06-01", ""),
            sample_row("E3", "Consulting", "Active", "2024-06-10", "2024-06-01", ""),
            sample_row("E4", "Advisory", "Released", "2024-06-10", "2024-06-01", ""),
        ]);
        let cleaned = transform(&table, &TransformOptions::default()).unwrap();
        let ids: Vec<_> = cleaned
            .column("engagement_id")
            .unwrap()
            .map(|c| c.as_text().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["E1", "E2"]);
        for status in cleaned.column("engagement_status").unwrap() {
            assert_eq!(status.as_text(), Some("Released"));
        }
    }

    #[test]
    fn derives_last_etc_report_date_and_etc_age() {
        // The spec scenario: one Consulting row with no ETC-P date, one
        // Advisory row that the filter drops.
        let table = sample_table(vec![
            sample_row("E1", "Consulting", "Released", "2024-06-10", "2024-06-01", ""),
            sample_row("E2", "Advisory", "Released", "2024-06-10", "2024-06-01", ""),
        ]);
        let cleaned =
            transform(&table, &TransformOptions::with_service_line("Consulting")).unwrap();
        assert_eq!(cleaned.rows.len(), 1);

        let row = &cleaned.rows[0];
        let last_etc = cleaned.column_index("last_etc_date").unwrap();
        let report = cleaned.column_index("report_date").unwrap();
        let age = cleaned.column_index("etc_age").unwrap();
        assert_eq!(row[last_etc], Cell::Date(dt(2024, 6, 10)));
        assert_eq!(row[report], Cell::Date(dt(2024, 6, 1)));
        assert_eq!(row[age], Cell::Int(-9));
    }

    #[test]
    fn etcp_date_wins_over_release_date() {
        let table = sample_table(vec![sample_row(
            "E1",
            "Consulting",
            "Released",
            "2024-06-10",
            "2024-07-01",
            "2024-06-20",
        )]);
        let cleaned = transform(&table, &TransformOptions::default()).unwrap();
        let row = &cleaned.rows[0];
        let last_etc = cleaned.column_index("last_etc_date").unwrap();
        let age = cleaned.column_index("etc_age").unwrap();
        assert_eq!(row[last_etc], Cell::Date(dt(2024, 6, 20)));
        assert_eq!(row[age], Cell::Int(11));
    }

    #[test]
    fn report_date_is_constant_across_rows() {
        let table = sample_table(vec![
            sample_row("E1", "Consulting", "Released", "2024-06-10", "2024-06-01", ""),
            sample_row("E2", "Consulting", "Released", "2024-06-12", "2024-06-05", ""),
            sample_row("E3", "Consulting", "Released", "2024-06-14", "", ""),
        ]);
        let cleaned = transform(&table, &TransformOptions::default()).unwrap();
        for cell in cleaned.column("report_date").unwrap() {
            assert_eq!(*cell, Cell::Date(dt(2024, 6, 5)));
        }
    }

    #[test]
    fn no_matching_rows_is_empty_not_error() {
        let table = sample_table(vec![
            sample_row("E1", "Consulting", "Released", "2024-06-10", "2024-06-01", ""),
        ]);
        let cleaned = transform(&table, &TransformOptions::with_service_line("TAX")).unwrap();
        assert!(cleaned.is_empty());
        // full column set survives: 14 kept + 3 derived
        assert_eq!(cleaned.headers.len(), DEFAULT_KEEP_COLS.len() + 3);
        assert!(cleaned.column_index("etc_age").is_some());
    }

    #[test]
    fn unparseable_dates_become_null() {
        let table = sample_table(vec![sample_row(
            "E1",
            "Consulting",
            "Released",
            "garbage",
            "2024-06-01",
            "",
        )]);
        let cleaned = transform(&table, &TransformOptions::default()).unwrap();
        let row = &cleaned.rows[0];
        let release = cleaned.column_index("release_date").unwrap();
        let last_etc = cleaned.column_index("last_etc_date").unwrap();
        let age = cleaned.column_index("etc_age").unwrap();
        assert_eq!(row[release], Cell::Null);
        // both ETC-P and release are absent, so last_etc_date and the age are too
        assert_eq!(row[last_etc], Cell::Null);
        assert_eq!(row[age], Cell::Null);
    }

    #[test]
    fn transform_is_deterministic() {
        let table = sample_table(vec![
            sample_row("E1", "Consulting", "Released", "2024-06-10", "2024-06-01", ""),
            sample_row("E2", "Consulting", "Released", "2024-06-12", "2024-06-05", ""),
        ]);
        let opts = TransformOptions::default();
        let first = transform(&table, &opts).unwrap();
        let second = transform(&table, &opts).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn headers_are_normalized() {
        let table = sample_table(vec![]);
        let cleaned = transform(&table, &TransformOptions::default()).unwrap();
        assert_eq!(cleaned.headers[0], "engagement_id");
        assert!(cleaned.headers.contains(&"last_active_etcp_date".to_string()));
        assert!(cleaned
            .headers
            .contains(&"engagement_partner_service_line".to_string()));
    }
}
