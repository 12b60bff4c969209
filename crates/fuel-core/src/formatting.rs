use chrono::NaiveDate;

use crate::time_utils::split_month_key;

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use fuel_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    // Handle the sign separately so the thousands grouping works on the
    // absolute value.
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Round to the requested decimal places.
    // Add a tiny epsilon (half ULP at the target precision) before rounding
    // to avoid IEEE 754 binary-representation issues at exact midpoints.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    // Build the thousands-separated integer portion.
    let int_str = integer_part.to_string();
    let grouped = group_thousands(&int_str);

    let result = if decimals == 0 {
        grouped
    } else {
        // Format the fractional part to the exact number of decimals.
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // `frac_str` starts with "0.", e.g. "0.50". Strip the leading "0".
        let decimal_digits = &frac_str[1..]; // ".50"
        format!("{}{}", grouped, decimal_digits)
    };

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a monetary amount in pounds sterling with two decimal places and
/// thousands separators.
///
/// # Examples
///
/// ```
/// use fuel_core::formatting::format_currency;
///
/// assert_eq!(format_currency(1234.56), "£1,234.56");
/// assert_eq!(format_currency(0.0),     "£0.00");
/// assert_eq!(format_currency(-9.99),   "£-9.99");
/// ```
pub fn format_currency(amount: f64) -> String {
    if amount < 0.0 {
        format!("£-{}", format_number(amount.abs(), 2))
    } else {
        format!("£{}", format_number(amount, 2))
    }
}

/// Format a litres-per-hour efficiency to two decimals, e.g. `"1.44 L/hr"`.
pub fn format_efficiency(litres_per_hour: f64) -> String {
    format!("{} L/hr", format_number(litres_per_hour, 2))
}

/// Format a litre total with no decimals, e.g. `"1,120 L"`.
pub fn format_litres(litres: f64) -> String {
    format!("{} L", format_number(litres, 0))
}

/// Turn a `"YYYY-MM"` month key into its short en-GB label.
///
/// Keys that are not valid months are returned unchanged.
///
/// # Examples
///
/// ```
/// use fuel_core::formatting::format_month_label;
///
/// assert_eq!(format_month_label("2024-03"), "Mar 2024");
/// assert_eq!(format_month_label("2023-12"), "Dec 2023");
/// ```
pub fn format_month_label(month_key: &str) -> String {
    split_month_key(month_key)
        .and_then(|(year, month)| NaiveDate::from_ymd_opt(year, month, 1))
        .map(|date| date.format("%b %Y").to_string())
        .unwrap_or_else(|| month_key.to_string())
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// # Examples
///
/// ```
/// use fuel_core::formatting::percentage;
///
/// assert!((percentage(50.0, 200.0, 1) - 25.0).abs() < 1e-9);
/// assert_eq!(percentage(0.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_no_thousands() {
        assert_eq!(format_number(123.456, 2), "123.46");
    }

    #[test]
    fn test_format_number_with_thousands() {
        assert_eq!(format_number(1_234.5, 1), "1,234.5");
    }

    #[test]
    fn test_format_number_millions() {
        assert_eq!(format_number(1_234_567.0, 0), "1,234,567");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-9_876.5, 1), "-9,876.5");
    }

    #[test]
    fn test_format_number_exact_thousands() {
        assert_eq!(format_number(1_000.0, 0), "1,000");
    }

    #[test]
    fn test_format_number_small_decimals() {
        assert_eq!(format_number(0.001, 3), "0.001");
    }

    #[test]
    fn test_format_number_rounds_up() {
        assert_eq!(format_number(1.005, 2), "1.01");
    }

    // ── format_currency ──────────────────────────────────────────────────────

    #[test]
    fn test_format_currency_positive() {
        assert_eq!(format_currency(1_234.56), "£1,234.56");
    }

    #[test]
    fn test_format_currency_zero() {
        assert_eq!(format_currency(0.0), "£0.00");
    }

    #[test]
    fn test_format_currency_negative() {
        assert_eq!(format_currency(-9.99), "£-9.99");
    }

    #[test]
    fn test_format_currency_projected_cost() {
        assert_eq!(format_currency(200.0 * 0.70), "£140.00");
    }

    // ── format_efficiency / format_litres ────────────────────────────────────

    #[test]
    fn test_format_efficiency_two_decimals() {
        assert_eq!(format_efficiency(130.0 / 90.0), "1.44 L/hr");
        assert_eq!(format_efficiency(3.0), "3.00 L/hr");
    }

    #[test]
    fn test_format_litres_no_decimals() {
        assert_eq!(format_litres(119.6), "120 L");
        assert_eq!(format_litres(1_120.0), "1,120 L");
    }

    // ── format_month_label ───────────────────────────────────────────────────

    #[test]
    fn test_format_month_label() {
        assert_eq!(format_month_label("2024-01"), "Jan 2024");
        assert_eq!(format_month_label("2024-03"), "Mar 2024");
    }

    #[test]
    fn test_format_month_label_invalid_key_passthrough() {
        assert_eq!(format_month_label("2024-13"), "2024-13");
        assert_eq!(format_month_label("unknown"), "unknown");
    }

    // ── percentage ───────────────────────────────────────────────────────────

    #[test]
    fn test_percentage_basic() {
        let p = percentage(50.0, 200.0, 1);
        assert!((p - 25.0).abs() < 1e-9, "percentage = {p}");
    }

    #[test]
    fn test_percentage_zero_whole() {
        assert_eq!(percentage(10.0, 0.0, 2), 0.0);
    }

    #[test]
    fn test_percentage_full() {
        let p = percentage(100.0, 100.0, 0);
        assert!((p - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentage_rounding() {
        let p = percentage(1.0, 3.0, 2);
        assert!((p - 33.33).abs() < 1e-2, "percentage = {p}");
    }

    #[test]
    fn test_percentage_zero_part() {
        assert_eq!(percentage(0.0, 100.0, 2), 0.0);
    }

    // ── group_thousands (via format_number) ──────────────────────────────────

    #[test]
    fn test_group_thousands_one_digit() {
        assert_eq!(format_number(5.0, 0), "5");
    }

    #[test]
    fn test_group_thousands_four_digits() {
        assert_eq!(format_number(1234.0, 0), "1,234");
    }

    #[test]
    fn test_group_thousands_seven_digits() {
        assert_eq!(format_number(1_234_567.0, 0), "1,234,567");
    }
}
