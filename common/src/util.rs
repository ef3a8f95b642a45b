/// Formats a throughput given in MB/s with the largest unit that keeps the
/// value at or above 1, e.g. `0.1` -> `100 KB/s`, `1000` -> `1 GB/s`
pub fn throughput_label(mb_per_sec: f64) -> String {
    let (value, unit) = if mb_per_sec >= 1000.0 {
        (mb_per_sec / 1000.0, "GB/s")
    } else if mb_per_sec >= 1.0 {
        (mb_per_sec, "MB/s")
    } else {
        (mb_per_sec * 1000.0, "KB/s")
    };
    let value = (value * 1000.0).round() / 1000.0;
    format!("{value} {unit}")
}

/// The integer `value` sits on, if any
pub fn as_integer(value: f64) -> Option<i64> {
    let rounded = value.round();
    if (value - rounded).abs() < 1e-6 {
        Some(rounded as i64)
    } else {
        None
    }
}
