//! Shared utility functions

/// Format seconds as human-readable interval (e.g., "5m", "2h", "1d")
pub fn format_interval(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 && secs % 3600 != 0 {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    } else if secs < 86400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86400)
    }
}

/// Format an interval given in minutes
pub fn format_minutes(minutes: u64) -> String {
    format_interval(minutes.saturating_mul(60))
}
