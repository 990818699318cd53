use super::DbLoader;
use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use duckdb::types::{TimeUnit, Value};
use duckdb::ToSql;
use tracing::info;

/// One delegate authorization as submitted: ordinal number within the
/// engagement, name, internal identifier (GUI), email, and an optional expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delegate {
    pub number: i64,
    pub name: String,
    pub gui: String,
    pub email: String,
    pub end_date: Option<NaiveDate>,
}

/// A persisted delegate authorization, as read back for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateRow {
    pub engagement_id: String,
    pub delegate: Delegate,
    pub added_by: String,
    pub added_at: NaiveDateTime,
}

fn date_to_value(date: Option<NaiveDate>) -> Value {
    match date {
        Some(d) => {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            Value::Date32((d - epoch).num_days() as i32)
        }
        None => Value::Null,
    }
}

impl DbLoader {
    /// Create the delegates destination if absent. Insert-only entity; no
    /// update or delete path exists.
    pub fn ensure_delegates_table(&self, dest: &str) -> Result<()> {
        super::validate_identifier(dest)?;
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                engagement_id VARCHAR,
                delegate_number BIGINT,
                delegate_name VARCHAR,
                delegate_gui VARCHAR,
                delegate_email VARCHAR,
                end_date DATE,
                added_by VARCHAR,
                added_at TIMESTAMP
            );",
            dest
        );
        self.conn.execute_batch(&ddl).map_err(Error::Write)
    }

    /// Insert a batch of delegates for one engagement in a single transaction.
    /// `added_at` is taken once per call. Returns the number of rows written.
    pub fn add_delegates(
        &mut self,
        dest: &str,
        engagement_id: &str,
        delegates: &[Delegate],
        added_by: &str,
    ) -> Result<usize> {
        super::validate_identifier(dest)?;
        self.ensure_delegates_table(dest)?;

        let sql = format!(
            "INSERT INTO {} (
                engagement_id, delegate_number, delegate_name,
                delegate_gui, delegate_email, end_date, added_by, added_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?);",
            dest
        );
        let added_at = Value::Timestamp(TimeUnit::Microsecond, Utc::now().timestamp_micros());

        let tx = self.conn.transaction().map_err(Error::Write)?;
        let mut written = 0usize;
        {
            let mut stmt = tx.prepare(&sql).map_err(Error::Write)?;
            for delegate in delegates {
                let values: Vec<Value> = vec![
                    Value::Text(engagement_id.to_string()),
                    Value::BigInt(delegate.number),
                    Value::Text(delegate.name.clone()),
                    Value::Text(delegate.gui.clone()),
                    Value::Text(delegate.email.clone()),
                    date_to_value(delegate.end_date),
                    Value::Text(added_by.to_string()),
                    added_at.clone(),
                ];
                let params: Vec<&dyn ToSql> = values.iter().map(|v| v as &dyn ToSql).collect();
                written += stmt.execute(&params[..]).map_err(Error::Write)?;
            }
        }
        tx.commit().map_err(Error::Write)?;

        info!(dest, engagement_id, written, added_by, "delegates added");
        Ok(written)
    }

    /// Delegates recorded for one engagement, ordered by delegate number.
    pub fn list_delegates(&self, dest: &str, engagement_id: &str) -> Result<Vec<DelegateRow>> {
        super::validate_identifier(dest)?;
        let sql = format!(
            "SELECT engagement_id, delegate_number, delegate_name,
                    delegate_gui, delegate_email,
                    CAST(end_date AS VARCHAR), added_by,
                    CAST(added_at AS VARCHAR)
             FROM {}
             WHERE engagement_id = ?
             ORDER BY delegate_number;",
            dest
        );

        let mut stmt = self.conn.prepare(&sql).map_err(Error::Write)?;
        let rows = stmt
            .query_map([engagement_id], |row| {
                let end_date: Option<String> = row.get(5)?;
                let added_at: String = row.get(7)?;
                let added_at = NaiveDateTime::parse_from_str(&added_at, "%Y-%m-%d %H:%M:%S%.f")
                    .map_err(|e| {
                        duckdb::Error::FromSqlConversionFailure(
                            7,
                            duckdb::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                Ok(DelegateRow {
                    engagement_id: row.get(0)?,
                    delegate: Delegate {
                        number: row.get(1)?,
                        name: row.get(2)?,
                        gui: row.get(3)?,
                        email: row.get(4)?,
                        end_date: end_date
                            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
                    },
                    added_by: row.get(6)?,
                    added_at,
                })
            })
            .map_err(Error::Write)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::Write)?;
        Ok(rows)
    }
}
