use autopatch_core::CommitRecord;
use chrono::DateTime;

/// Format a key-value pair for display.
pub fn kv(key: &str, value: &str) -> String {
    format!("{key:>10}: {value}")
}

/// `YYYY-MM-DD HH:MM` in UTC.
pub fn format_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn commit_table(records: &[&CommitRecord]) -> String {
    let mut out = format!(
        "{:<14} {:<16} {:<16} {:<7} {:<5} {:<5} {:<9} {}\n",
        "key", "created", "updated", "version", "group", "order", "status", "title"
    );
    for r in records {
        out.push_str(&format!(
            "{:<14} {:<16} {:<16} v{:<6} {:<5} {:<5} {:<9} {}\n",
            r.key.as_str(),
            format_timestamp(r.created_at_ms),
            format_timestamp(r.updated_at_ms),
            r.version,
            r.group,
            r.order,
            r.status.as_str(),
            r.title
        ));
    }
    out
}
