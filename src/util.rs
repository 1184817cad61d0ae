pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Full timer readout, `MM:SS.mmm` (or `HH:MM:SS.mmm` past an hour)
pub fn format_time(ms: u64) -> String {
    let total_secs = ms / 1000;
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    let millis = ms % 1000;

    if minutes >= 60 {
        let hours = minutes / 60;
        return format!("{hours:02}:{:02}:{seconds:02}.{millis:03}", minutes % 60);
    }

    format!("{minutes:02}:{seconds:02}.{millis:03}")
}

/// Compact form for lists: `S.cc` or `M:SS.cc`
pub fn format_time_short(ms: u64) -> String {
    let total_secs = ms / 1000;
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    let centis = (ms % 1000) / 10;

    if minutes > 0 {
        format!("{minutes}:{seconds:02}.{centis:02}")
    } else {
        format!("{seconds}.{centis:02}")
    }
}

/// Statistics fields are fractional; shown with the same short format
pub fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) if v >= 0.0 => format_time_short(v as u64),
        Some(v) => format!("{v:.0}"),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[15., 7., 55., 12., 4.]), Some(18.6));
    }

    #[test]
    fn test_mean_single_value() {
        assert_eq!(mean(&[42.0]), Some(42.0));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_mean_negative_values() {
        assert_eq!(mean(&[-5.0, -10.0, -15.0]), Some(-10.0));
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00.000");
        assert_eq!(format_time(83_456), "01:23.456");
        assert_eq!(format_time(3_723_004), "01:02:03.004");
    }

    #[test]
    fn test_format_time_short() {
        assert_eq!(format_time_short(9_876), "9.87");
        assert_eq!(format_time_short(83_456), "1:23.45");
        assert_eq!(format_time_short(50), "0.05");
    }

    #[test]
    fn test_format_stat() {
        assert_eq!(format_stat(None), "-");
        assert_eq!(format_stat(Some(12_345.6)), "12.34");
    }
}
