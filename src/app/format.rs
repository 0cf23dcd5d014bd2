//! Human-readable byte formatting
//!
//! Scales raw byte counts into the unit table used throughout the view.

/// Unit suffixes, in ascending powers of 1024
const UNITS: [&str; 5] = ["bytes", "KB", "MB", "GB", "TB"];

/// Format a byte count as a human-scaled string
///
/// Divides by 1024 while the remaining value is at least 1024 and a larger
/// unit exists. Values beyond the table stay in TB, so `2 * 1024^5` renders
/// as `"2048.0TB"` rather than overflowing the unit index. One decimal digit,
/// no space before the suffix.
pub fn format_bytes(num: f64) -> String {
    let mut value = num;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", value, UNITS[unit])
}

/// Format a transfer rate as bytes per second
pub fn format_speed(num: f64) -> String {
    format!("{}/s", format_bytes(num))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_below_first_boundary() {
        assert_eq!(format_bytes(0.0), "0.0bytes");
        assert_eq!(format_bytes(512.0), "512.0bytes");
        assert_eq!(format_bytes(1023.0), "1023.0bytes");
    }

    #[test]
    fn test_unit_boundaries() {
        assert_eq!(format_bytes(1024.0), "1.0KB");
        assert_eq!(format_bytes(1024.0 * 1024.0), "1.0MB");
        assert_eq!(format_bytes(1024.0 * 1024.0 * 1024.0), "1.0GB");
    }

    #[test]
    fn test_fractional_values() {
        assert_eq!(format_bytes(1536.0), "1.5KB");
        assert_eq!(format_bytes(2_621_440.0), "2.5MB");
    }

    #[test]
    fn test_clamps_at_terabytes() {
        let two_tb = 2.0 * 1024f64.powi(4);
        assert_eq!(format_bytes(two_tb), "2.0TB");

        // No unit beyond TB even when the value is >= 1024
        let huge = 2.0 * 1024f64.powi(5);
        assert_eq!(format_bytes(huge), "2048.0TB");
    }

    #[test]
    fn test_speed_suffix() {
        assert_eq!(format_speed(1024.0), "1.0KB/s");
        assert_eq!(format_speed(0.0), "0.0bytes/s");
    }
}
