//! Number formatting helpers shared by the filters.
//!
//! Output of these helpers must match what the templates have always printed,
//! so rounding is half away from zero and floats print with at most 14
//! significant digits.

/// Rounds `value` to `precision` decimal places, half away from zero.
///
/// Negative precision rounds to tens, hundreds, and so on. The scaled value is
/// first reduced to 15 significant digits so that representation error
/// (`1.005 * 100 == 100.49999…`) does not flip the result.
///
/// # Example
///
/// ```rust
/// use skeleton_template::util::round_half_away;
///
/// assert_eq!(round_half_away(2.5, 0), 3.0);
/// assert_eq!(round_half_away(-2.5, 0), -3.0);
/// assert_eq!(round_half_away(1.005, 2), 1.01);
/// assert_eq!(round_half_away(1250.0, -2), 1300.0);
/// ```
pub fn round_half_away(value: f64, precision: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let factor = 10f64.powi(precision.saturating_abs());
    let scaled = if precision >= 0 {
        value * factor
    } else {
        value / factor
    };
    if !scaled.is_finite() {
        return value;
    }

    let pre_rounded: f64 = format!("{:.14e}", scaled).parse().unwrap_or(scaled);
    let rounded = pre_rounded.round();
    let result = if precision >= 0 {
        rounded / factor
    } else {
        rounded * factor
    };

    if result.is_finite() {
        result
    } else {
        value
    }
}

/// Formats a number with grouped thousands.
///
/// The value is rounded to `decimals` places, `decimal_point` separates the
/// fraction and `thousands_sep` is inserted between every group of three
/// integer digits. Values that round to zero never carry a minus sign.
///
/// # Example
///
/// ```rust
/// use skeleton_template::util::number_format;
///
/// assert_eq!(number_format(1234567.891, 2, ".", ","), "1,234,567.89");
/// assert_eq!(number_format(1234.5, 0, ".", ","), "1,235");
/// assert_eq!(number_format(0.5, 2, ",", " "), "0,50");
/// assert_eq!(number_format(-0.001, 2, ".", ""), "0.00");
/// ```
pub fn number_format(
    value: f64,
    decimals: usize,
    decimal_point: &str,
    thousands_sep: &str,
) -> String {
    let decimals = decimals.min(MAX_DECIMALS);
    let rounded = round_half_away(value, decimals as i32);
    let formatted = format!("{:.*}", decimals, rounded.abs());
    let (integer, fraction) = match formatted.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (formatted.as_str(), None),
    };

    let grouping = integer.len() / 3 * thousands_sep.len();
    let mut out = String::with_capacity(formatted.len() + grouping + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    out.push_str(&group_digits(integer, thousands_sep));
    if let Some(fraction) = fraction {
        out.push_str(decimal_point);
        out.push_str(fraction);
    }
    out
}

/// Upper bound on the decimals [`number_format`] prints; larger requests are
/// clamped.
pub const MAX_DECIMALS: usize = 100;

/// Inserts `separator` between groups of three digits, counting from the right.
pub fn group_digits(digits: &str, separator: &str) -> String {
    if separator.is_empty() || digits.len() <= 3 {
        return digits.to_string();
    }

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    let lead = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - lead) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(c);
    }
    out
}

/// Prints a number the way it appears when interpolated into a template.
///
/// Integral values print without a fraction, other values with at most 14
/// significant digits and no trailing zeros.
///
/// # Example
///
/// ```rust
/// use skeleton_template::util::format_number;
///
/// assert_eq!(format_number(1023.0), "1023");
/// assert_eq!(format_number(12.5), "12.5");
/// assert_eq!(format_number(0.1 + 0.2), "0.3");
/// ```
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let reduced: f64 = format!("{:.13e}", value).parse().unwrap_or(value);
    format!("{}", reduced)
}
