//! Human-readable byte counts and durations.

/// Decimal units, two decimals: `"512.00 B"`, `"1.50 MB"`. Unknown (or
/// negative) values render as `"∞ B"`.
pub fn bytes_to_string(bytes: Option<f64>) -> String {
    match bytes {
        Some(b) if b >= 0.0 && b.is_finite() => {
            if b < 1e3 {
                format!("{:.2} B", b)
            } else if b < 1e6 {
                format!("{:.2} kB", b / 1e3)
            } else if b < 1e9 {
                format!("{:.2} MB", b / 1e6)
            } else {
                format!("{:.2} GB", b / 1e9)
            }
        }
        _ => "∞ B".to_string(),
    }
}

/// `HH:MM:SS`; hours are not wrapped. Unknown renders as `"∞ s"`.
pub fn seconds_to_string(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s >= 0.0 && s.is_finite() => {
            let total = s as u64;
            format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
        }
        _ => "∞ s".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_units() {
        assert_eq!(bytes_to_string(Some(0.0)), "0.00 B");
        assert_eq!(bytes_to_string(Some(999.0)), "999.00 B");
        assert_eq!(bytes_to_string(Some(1500.0)), "1.50 kB");
        assert_eq!(bytes_to_string(Some(2_500_000.0)), "2.50 MB");
        assert_eq!(bytes_to_string(Some(3e9)), "3.00 GB");
    }

    #[test]
    fn bytes_unknown() {
        assert_eq!(bytes_to_string(None), "∞ B");
        assert_eq!(bytes_to_string(Some(-1.0)), "∞ B");
        assert_eq!(bytes_to_string(Some(f64::NAN)), "∞ B");
    }

    #[test]
    fn seconds_clock() {
        assert_eq!(seconds_to_string(Some(0.0)), "00:00:00");
        assert_eq!(seconds_to_string(Some(61.9)), "00:01:01");
        assert_eq!(seconds_to_string(Some(3725.0)), "01:02:05");
        assert_eq!(seconds_to_string(Some(360_000.0)), "100:00:00");
    }

    #[test]
    fn seconds_unknown() {
        assert_eq!(seconds_to_string(None), "∞ s");
        assert_eq!(seconds_to_string(Some(-5.0)), "∞ s");
    }
}
