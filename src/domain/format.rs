//! Human-readable number formatting for result output.

/// Abbreviates a count: `1.50B`, `2.3M`, `4.5K`, or the plain integer.
///
/// Fractional input is truncated toward zero first, so an average volume of
/// 999.9 prints as `999`.
pub fn format_magnitude(n: f64) -> String {
    let n = n.trunc();
    if n >= 1_000_000_000.0 {
        format!("{:.2}B", n / 1_000_000_000.0)
    } else if n >= 1_000_000.0 {
        format!("{:.1}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{:.1}K", n / 1_000.0)
    } else {
        format!("{}", n as i64)
    }
}

/// Rounds to two decimal places, half away from zero.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
