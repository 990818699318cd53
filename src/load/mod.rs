pub mod delegates;

use crate::error::{Error, Result};
use crate::table::{Cell, CleanedTable};
use crate::transform::columns::{
    normalize_column_name, DEFAULT_KEEP_COLS, ETC_AGE_COL, LAST_ETC_DATE_COL, REPORT_DATE_COL,
};
use chrono::NaiveDateTime;
use duckdb::types::{TimeUnit, Value};
use duckdb::{Connection, ToSql};
use std::path::Path;
use tracing::info;

/// Provenance attached to every persisted row of one upload action.
#[derive(Debug, Clone)]
pub struct UploadStamp {
    pub timestamp: NaiveDateTime,
    pub user: String,
}

/// Scoped handle on the relational store. The connection is released when the
/// loader is dropped, on every exit path.
pub struct DbLoader {
    pub(crate) conn: Connection,
}

/// Cleaned-table columns expected by the engagement DDL, in persisted order.
fn engagement_columns() -> Vec<String> {
    let mut cols: Vec<String> = DEFAULT_KEEP_COLS
        .iter()
        .map(|c| normalize_column_name(c))
        .collect();
    cols.push(LAST_ETC_DATE_COL.to_string());
    cols.push(REPORT_DATE_COL.to_string());
    cols.push(ETC_AGE_COL.to_string());
    cols
}

/// Destination names are interpolated into DDL/DML (the store cannot bind
/// identifiers), so only bare identifiers are accepted.
fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "`{}` is not a valid destination table name",
            name
        )))
    }
}

fn cell_to_value(cell: &Cell) -> Value {
    match cell {
        Cell::Text(s) => Value::Text(s.clone()),
        Cell::Date(dt) => Value::Timestamp(TimeUnit::Microsecond, dt.and_utc().timestamp_micros()),
        Cell::Int(i) => Value::BigInt(*i),
        Cell::Null => Value::Null,
    }
}

impl DbLoader {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(Error::Connection)?;
        Ok(DbLoader { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Error::Connection)?;
        Ok(DbLoader { conn })
    }

    /// Create the destination if absent. Never alters an existing table; an
    /// incompatible existing shape surfaces later as a write failure.
    pub fn ensure_engagement_table(&self, dest: &str) -> Result<()> {
        validate_identifier(dest)?;
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                engagement_id VARCHAR,
                creation_date TIMESTAMP,
                release_date TIMESTAMP,
                last_time_charged_date TIMESTAMP,
                last_expenses_charged_date TIMESTAMP,
                last_active_etcp_date TIMESTAMP,
                engagement VARCHAR,
                client VARCHAR,
                engagement_partner VARCHAR,
                engagement_partner_gui VARCHAR,
                engagement_manager VARCHAR,
                engagement_manager_gui VARCHAR,
                engagement_partner_service_line VARCHAR,
                engagement_status VARCHAR,
                last_etc_date TIMESTAMP,
                report_date TIMESTAMP,
                etc_age BIGINT,
                upload_timestamp TIMESTAMP,
                upload_user VARCHAR,
                UNIQUE (engagement_id, creation_date)
            );",
            dest
        );
        self.conn.execute_batch(&ddl).map_err(Error::Write)
    }

    /// Insert every row of `table` into `dest`, tagged with `stamp`. Rows whose
    /// (`engagement_id`, `creation_date`) already exist are skipped, never
    /// updated. The whole batch runs in one transaction with a single commit;
    /// any statement failure aborts it uncommitted.
    ///
    /// Returns the number of rows actually written.
    pub fn load_engagements(
        &mut self,
        table: &CleanedTable,
        dest: &str,
        stamp: &UploadStamp,
    ) -> Result<usize> {
        validate_identifier(dest)?;
        self.ensure_engagement_table(dest)?;

        let columns = engagement_columns();
        let indices: Vec<usize> = columns
            .iter()
            .map(|name| {
                table
                    .column_index(name)
                    .ok_or_else(|| Error::Schema(name.clone()))
            })
            .collect::<Result<_>>()?;

        let placeholders = vec!["?"; columns.len() + 2].join(", ");
        let sql = format!(
            "INSERT OR IGNORE INTO {} ({}, upload_timestamp, upload_user) VALUES ({});",
            dest,
            columns.join(", "),
            placeholders
        );

        let stamp_ts = Value::Timestamp(
            TimeUnit::Microsecond,
            stamp.timestamp.and_utc().timestamp_micros(),
        );

        let tx = self.conn.transaction().map_err(Error::Write)?;
        let mut written = 0usize;
        {
            let mut stmt = tx.prepare(&sql).map_err(Error::Write)?;
            for row in &table.rows {
                let mut values: Vec<Value> =
                    indices.iter().map(|&i| cell_to_value(&row[i])).collect();
                values.push(stamp_ts.clone());
                values.push(Value::Text(stamp.user.clone()));
                let params: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
                written += stmt.execute(&params[..]).map_err(Error::Write)?;
            }
        }
        tx.commit().map_err(Error::Write)?;

        info!(
            dest,
            attempted = table.rows.len(),
            written,
            user = %stamp.user,
            "engagement rows loaded"
        );
        Ok(written)
    }

    /// Row count of a destination table, for previews and re-load checks.
    pub fn count_rows(&self, dest: &str) -> Result<i64> {
        validate_identifier(dest)?;
        self.conn
            .query_row(&format!("SELECT count(*) FROM {};", dest), [], |row| {
                row.get(0)
            })
            .map_err(Error::Write)
    }
}

/// One-shot scoped load: open, ensure, insert, commit, release. Mirrors a
/// single upload action; nothing is retained between calls.
pub fn load_data_to_db(
    db_path: &Path,
    table: &CleanedTable,
    dest: &str,
    stamp: &UploadStamp,
) -> Result<usize> {
    let mut loader = DbLoader::open(db_path)?;
    loader.load_engagements(table, dest, stamp)
}
