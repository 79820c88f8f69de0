//! Display formatting for money, dates and rates.

use chrono::{DateTime, Utc};

/// `1234.5` → `"$1,234.50"`.
pub fn format_earnings(amount: f64) -> String {
    let cents = (amount.max(0.0) * 100.0).round() as u64;
    let (whole, frac) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${grouped}.{frac:02}")
}

/// Calendar date of a join timestamp, `-` when unknown.
pub fn format_joined(joined: Option<&DateTime<Utc>>) -> String {
    match joined {
        Some(dt) => dt.format("%Y/%m/%d").to_string(),
        None => "-".to_string(),
    }
}

/// `3.456` → `"3.5%"`, `-` when unknown.
pub fn format_rate(rate: Option<f64>) -> String {
    rate.map_or_else(|| "-".to_string(), |r| format!("{r:.1}%"))
}

/// Truncate to `max` characters, ending in `…` when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0.0, "$0.00")]
    #[case(200.0, "$200.00")]
    #[case(1234.5, "$1,234.50")]
    #[case(1_000_000.0, "$1,000,000.00")]
    #[case(-3.0, "$0.00")]
    fn earnings(#[case] amount: f64, #[case] expected: &str) {
        assert_eq!(format_earnings(amount), expected);
    }

    #[test]
    fn joined_date() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format_joined(Some(&dt)), "2024/03/01");
        assert_eq!(format_joined(None), "-");
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate("Alice", 10), "Alice");
        assert_eq!(truncate("Bartholomew", 5), "Bart…");
        assert_eq!(truncate("abc", 0), "");
        assert_eq!(format_rate(Some(3.456)), "3.5%");
    }
}
