//! Lenient amount parsing and fixed-point display formatting.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Parse the numeric prefix of `text`, the way a text field's contents are read.
///
/// Leading whitespace is skipped, then an optional sign, digits, an optional
/// fraction and an optional exponent are consumed. Anything after the longest
/// valid prefix is ignored (`"12."` is 12, `"3abc"` is 3). Text with no
/// numeric prefix, including the empty string, reads as 0.
pub fn parse_amount(text: &str) -> f64 {
    let bytes = text.trim_start().as_bytes();
    let mut idx = 0;
    let mut literal = String::new();

    if let Some(&sign) = bytes.first() {
        if sign == b'-' || sign == b'+' {
            literal.push(sign as char);
            idx += 1;
        }
    }

    let int_start = idx;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    let int_digits = &bytes[int_start..idx];

    let mut frac_digits: &[u8] = &[];
    if idx < bytes.len() && bytes[idx] == b'.' {
        let frac_start = idx + 1;
        let mut end = frac_start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        frac_digits = &bytes[frac_start..end];
        idx = end;
    }

    if int_digits.is_empty() && frac_digits.is_empty() {
        return 0.0;
    }

    literal.push_str(if int_digits.is_empty() {
        "0"
    } else {
        std::str::from_utf8(int_digits).unwrap_or("0")
    });
    if !frac_digits.is_empty() {
        literal.push('.');
        literal.push_str(std::str::from_utf8(frac_digits).unwrap_or("0"));
    }

    // Exponent only counts when at least one digit follows it.
    if idx < bytes.len() && (bytes[idx] == b'e' || bytes[idx] == b'E') {
        let mut end = idx + 1;
        if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
            end += 1;
        }
        let exp_digits_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end > exp_digits_start {
            literal.push_str(std::str::from_utf8(&bytes[idx..end]).unwrap_or(""));
        }
    }

    match literal.parse::<f64>() {
        Ok(value) if !value.is_nan() => value,
        _ => 0.0,
    }
}

/// Format `value` with exactly `decimal_places` fraction digits.
///
/// Rounds half away from zero. Non-finite values render as `NaN`,
/// `Infinity` or `-Infinity` so an unguarded zero rate stays visible.
///
/// Rounding starts from the shortest decimal form of `value`, not its exact
/// binary expansion, so a literal midpoint such as `1.005` rounds up to
/// `"1.01"` even though the stored double lies just below it. Rounding the
/// binary value directly would give `"1.00"`.
pub fn format_amount(value: f64, decimal_places: u32) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    // Normalize negative zero.
    let value = if value == 0.0 { 0.0 } else { value };
    let places = decimal_places as usize;

    match Decimal::from_f64(value) {
        Some(decimal) => {
            let rounded =
                decimal.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.*}", places, rounded)
        }
        // Outside Decimal's range; fall back to float formatting.
        None => format!("{:.*}", places, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_numbers() {
        assert_eq!(parse_amount("100"), 100.0);
        assert_eq!(parse_amount("12.5"), 12.5);
        assert_eq!(parse_amount("-3.25"), -3.25);
        assert_eq!(parse_amount("  7"), 7.0);
    }

    #[test]
    fn test_parse_partial_input() {
        assert_eq!(parse_amount("12."), 12.0);
        assert_eq!(parse_amount(".5"), 0.5);
        assert_eq!(parse_amount("0."), 0.0);
        assert_eq!(parse_amount("3abc"), 3.0);
        assert_eq!(parse_amount("1e3"), 1000.0);
        assert_eq!(parse_amount("2e"), 2.0);
    }

    #[test]
    fn test_parse_invalid_is_zero() {
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("."), 0.0);
        assert_eq!(parse_amount("-"), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
    }

    #[test]
    fn test_format_fixed_places() {
        assert_eq!(format_amount(13.5, 2), "13.50");
        assert_eq!(format_amount(100.0, 0), "100");
        assert_eq!(format_amount(1.005, 3), "1.005");
        assert_eq!(format_amount(2.5, 0), "3");
        assert_eq!(format_amount(-2.5, 0), "-3");
        assert_eq!(format_amount(0.125, 2), "0.13");
        assert_eq!(format_amount(-0.0, 2), "0.00");
    }

    #[test]
    fn test_format_rounds_shortest_decimal_form() {
        assert_eq!(format_amount(1.005, 2), "1.01");
    }

    #[test]
    fn test_format_non_finite() {
        assert_eq!(format_amount(f64::NAN, 2), "NaN");
        assert_eq!(format_amount(f64::INFINITY, 2), "Infinity");
        assert_eq!(format_amount(f64::NEG_INFINITY, 2), "-Infinity");
    }

    #[test]
    fn test_format_out_of_decimal_range() {
        let formatted = format_amount(1e30, 2);
        assert!(formatted.ends_with(".00"));
        assert!(formatted.starts_with("1000000000000000019884624838656"));
    }
}
