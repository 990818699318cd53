/// Columns retained from the raw engagement list, in persisted order.
pub static DEFAULT_KEEP_COLS: &[&str] = &[
    "Engagement ID",
    "Creation Date",
    "Release Date",
    "Last Time Charged Date",
    "Last Expenses Charged Date",
    "Last Active ETC-P Date",
    "Engagement",
    "Client",
    "Engagement Partner",
    "Engagement Partner GUI",
    "Engagement Manager",
    "Engagement Manager GUI",
    "Engagement Partner Service Line",
    "Engagement Status",
];

/// Columns coerced to timestamps during the transform.
pub static DEFAULT_DATE_COLS: &[&str] = &[
    "Creation Date",
    "Release Date",
    "Last Time Charged Date",
    "Last Expenses Charged Date",
    "Last Active ETC-P Date",
];

pub const SERVICE_LINE_COL: &str = "Engagement Partner Service Line";
pub const STATUS_COL: &str = "Engagement Status";
pub const RELEASED_STATUS: &str = "Released";

/// Derived column names, appended after the kept columns in this order.
pub const LAST_ETC_DATE_COL: &str = "last_etc_date";
pub const REPORT_DATE_COL: &str = "report_date";
pub const ETC_AGE_COL: &str = "etc_age";

/// Lowercase, spaces to underscores, everything else non-alphanumeric dropped.
/// `"Last Active ETC-P Date"` becomes `"last_active_etcp_date"`.
pub fn normalize_column_name(name: &str) -> String {
    name.trim()
        .chars()
        .filter_map(|c| {
            if c == ' ' {
                Some('_')
            } else if c.is_ascii_alphanumeric() || c == '_' {
                Some(c.to_ascii_lowercase())
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_headers() {
        assert_eq!(normalize_column_name("Engagement ID"), "engagement_id");
        assert_eq!(
            normalize_column_name("Last Active ETC-P Date"),
            "last_active_etcp_date"
        );
        assert_eq!(
            normalize_column_name("  Engagement Partner Service Line "),
            "engagement_partner_service_line"
        );
        assert_eq!(normalize_column_name("already_clean"), "already_clean");
    }
}
