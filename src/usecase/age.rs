use time::OffsetDateTime;

/// Coarse age label for the message footer plus `created_at` in epoch seconds.
pub fn format_age(created_at: OffsetDateTime, now: OffsetDateTime) -> (String, i64) {
    let diff = now - created_at;
    let (value, unit) = if diff.whole_days() > 0 {
        (diff.whole_days(), "day")
    } else if diff.whole_hours() > 0 {
        (diff.whole_hours(), "hour")
    } else if diff.whole_minutes() > 0 {
        (diff.whole_minutes(), "minute")
    } else {
        (diff.whole_seconds(), "second")
    };

    let label = if value > 0 {
        let plural = if value == 1 { "" } else { "s" };
        format!("{value} {unit}{plural} old")
    } else {
        "Just now".to_string()
    };
    (label, created_at.unix_timestamp())
}
