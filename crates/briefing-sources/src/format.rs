//! Number formatting for section bodies

/// Format with thousands separators: `1234567.891, 2` -> `1,234,567.89`
pub fn thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Like [`thousands`] but always carries a sign: `+15.20`, `-3.00`
pub fn signed(value: f64, decimals: usize) -> String {
    if value >= 0.0 {
        format!("+{}", thousands(value, decimals))
    } else {
        thousands(value, decimals)
    }
}

/// Signed percentage with two decimals: `+0.58%`
pub fn signed_pct(value: f64) -> String {
    format!("{}%", signed(value, 2))
}

/// Integer count with thousands separators
pub fn count(value: u64) -> String {
    thousands(value as f64, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(2655.284, 2), "2,655.28");
        assert_eq!(thousands(78500.0, 0), "78,500");
        assert_eq!(thousands(999.0, 0), "999");
        assert_eq!(thousands(1_234_567.0, 1), "1,234,567.0");
        assert_eq!(thousands(-1310.5, 2), "-1,310.50");
        assert_eq!(thousands(-0.001, 2), "0.00");
    }

    #[test]
    fn test_signed() {
        assert_eq!(signed(15.2, 2), "+15.20");
        assert_eq!(signed(-3.0, 2), "-3.00");
        assert_eq!(signed_pct(0.583), "+0.58%");
        assert_eq!(count(12_345_678), "12,345,678");
    }
}
