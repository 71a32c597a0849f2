use crate::model::{Minutes, Slot};
use crate::time::{format_hhmm, parse_clock};

pub const LABEL_SEPARATOR: &str = " - ";

/// "HH:mm - HH:mm", zero-padded 24-hour.
pub fn format_label(window_start: Minutes, window_end: Minutes) -> String {
    format!(
        "{}{LABEL_SEPARATOR}{}",
        format_hhmm(window_start),
        format_hhmm(window_end)
    )
}

/// `(window_start, window_end, display_label)` for a window running from
/// `first` to `last`. A localized clock field on a boundary member wins over
/// the normalized value.
pub fn window_labels(
    first: &Slot,
    last: &Slot,
    start: Minutes,
    end: Minutes,
) -> (String, String, String) {
    let start_local = first.start_time_local.as_deref().and_then(parse_clock);
    let end_local = last.end_time_local.as_deref().and_then(parse_clock);
    let start = start_local.unwrap_or(start);
    let end = end_local.unwrap_or(end);
    (format_hhmm(start), format_hhmm(end), format_label(start, end))
}
