use chrono::{DateTime, Utc};

#[must_use]
pub fn format_date(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(
        || "Date not recorded".to_string(),
        |at| at.format("%Y-%m-%d").to_string(),
    )
}
