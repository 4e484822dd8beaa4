//! Numeric formatting: `round`, `number_format`, `byte_format`, `filesize`.

use minijinja::{Error, Value};

use super::{bool_arg, int_arg, is_missing, number_arg, str_arg};
use crate::error::FilterError;
use crate::util::{format_number, number_format, round_half_away, MAX_DECIMALS};

const BINARY_PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];
const SI_PREFIXES: [char; 6] = ['k', 'M', 'G', 'T', 'P', 'E'];

const IEC_SUFFIXES: [&str; 9] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB", "ZiB", "YiB"];
const METRIC_SUFFIXES: [&str; 9] = ["B", "kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Unit system for [`filesize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeSystem {
    /// Powers of 1024 with `KiB`, `MiB`, … suffixes.
    #[default]
    Iec,
    /// Powers of 1000 with `kB`, `MB`, … suffixes.
    Metric,
}

impl std::str::FromStr for SizeSystem {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iec" => Ok(SizeSystem::Iec),
            "metric" => Ok(SizeSystem::Metric),
            other => Err(FilterError::UnsupportedSystem(other.to_string())),
        }
    }
}

impl SizeSystem {
    fn unit(self) -> f64 {
        match self {
            SizeSystem::Iec => 1024.0,
            SizeSystem::Metric => 1000.0,
        }
    }

    fn suffixes(self) -> &'static [&'static str; 9] {
        match self {
            SizeSystem::Iec => &IEC_SUFFIXES,
            SizeSystem::Metric => &METRIC_SUFFIXES,
        }
    }
}

/// Formats a byte count with binary (`KiB`) or SI (`kB`) prefixes and one
/// decimal.
///
/// Counts up to and including one unit print as plain bytes.
///
/// # Example
///
/// ```rust
/// use skeleton_template::filters::format::byte_format;
///
/// assert_eq!(byte_format(1023.0, false, false), "1023 B");
/// assert_eq!(byte_format(1024.0, false, false), "1024 B");
/// assert_eq!(byte_format(1536.0, false, false), "1.5 KiB");
/// assert_eq!(byte_format(1_500_000.0, true, false), "1.5 MB");
/// ```
pub fn byte_format(bytes: f64, use_si: bool, group_thousands: bool) -> String {
    let (unit, prefixes) = if use_si {
        (1000.0_f64, &SI_PREFIXES)
    } else {
        (1024.0_f64, &BINARY_PREFIXES)
    };

    if bytes <= unit {
        if group_thousands {
            return format!("{} B", number_format(bytes, 0, ".", ","));
        }
        return format!("{} B", format_number(bytes));
    }

    let mut exponent = 1;
    while exponent < prefixes.len() && bytes >= unit.powi(exponent as i32 + 1) {
        exponent += 1;
    }
    let prefix = prefixes[exponent - 1];
    let binary_marker = if use_si { "" } else { "i" };
    let scaled = bytes / unit.powi(exponent as i32);
    let number = if group_thousands {
        number_format(scaled, 1, ".", ",")
    } else {
        number_format(scaled, 1, ".", "")
    };

    format!("{number} {prefix}{binary_marker}B")
}

/// Formats a file size by dividing through the unit ladder until the next
/// step would drop below one.
///
/// Thousands are grouped with a space.
///
/// # Errors
///
/// Returns [`FilterError::UnsupportedSystem`] for systems other than `iec`
/// and `metric`.
///
/// # Example
///
/// ```rust
/// use skeleton_template::filters::format::filesize;
///
/// assert_eq!(filesize(1048576.0, 2, ".", "iec").unwrap(), "1.00 MiB");
/// assert_eq!(filesize(500.0, 2, ".", "metric").unwrap(), "500.00 B");
/// assert_eq!(filesize(1000.0, 1, ",", "iec").unwrap(), "1 000,0 B");
/// assert!(filesize(1.0, 2, ".", "si").is_err());
/// ```
pub fn filesize(
    size: f64,
    precision: usize,
    decimal_mark: &str,
    system: &str,
) -> Result<String, FilterError> {
    let system: SizeSystem = system.parse()?;
    let unit = system.unit();

    let mut current = size;
    for suffix in system.suffixes() {
        let next = current / unit;
        if next < 1.0 {
            return Ok(format!(
                "{} {}",
                number_format(current, precision, decimal_mark, " "),
                suffix
            ));
        }
        current = next;
    }

    Ok(format_number(size))
}

/// A decimal count between zero and [`MAX_DECIMALS`]. Negative counts mean
/// no decimals.
fn decimals_arg(
    filter: &'static str,
    argument: &'static str,
    value: Option<&Value>,
    default: i64,
) -> Result<usize, FilterError> {
    let decimals = int_arg(filter, argument, value, default)?;
    if decimals > MAX_DECIMALS as i64 {
        return Err(FilterError::argument(
            filter,
            argument,
            format!("must be at most {MAX_DECIMALS}, got {decimals}"),
        ));
    }
    Ok(decimals.max(0) as usize)
}

/// `round(decimals=0)`
pub fn round_filter(value: Value, decimals: Option<Value>) -> Result<Value, Error> {
    let number = number_arg("round", "value", &value)?;
    let decimals = int_arg("round", "decimals", decimals.as_ref(), 0)?;
    let decimals = decimals.clamp(i32::MIN as i64, i32::MAX as i64) as i32;

    let rounded = round_half_away(number, decimals);
    if rounded.fract() == 0.0 && rounded.abs() < 9.0e15 {
        Ok(Value::from(rounded as i64))
    } else {
        Ok(Value::from(rounded))
    }
}

/// `number_format(decimals=2, decimal_point='.', thousands_sep='')`
pub fn number_format_filter(
    value: Value,
    decimals: Option<Value>,
    decimal_point: Option<Value>,
    thousands_sep: Option<Value>,
) -> Result<String, Error> {
    let number = number_arg("number_format", "value", &value)?;
    let decimals = decimals_arg("number_format", "decimals", decimals.as_ref(), 2)?;
    let decimal_point = str_arg("number_format", "decimal_point", decimal_point.as_ref(), ".")?;
    let thousands_sep = str_arg("number_format", "thousands_sep", thousands_sep.as_ref(), "")?;

    Ok(number_format(number, decimals, decimal_point, thousands_sep))
}

/// `byte_format(use_si=false, group_thousands=false)`
///
/// Blank strings and `none` count as zero bytes.
pub fn byte_format_filter(
    bytes: Value,
    use_si: Option<Value>,
    group_thousands: Option<Value>,
) -> Result<String, Error> {
    let blank = is_missing(Some(&bytes)) || bytes.as_str().is_some_and(|s| s.trim().is_empty());
    let count = if blank {
        0.0
    } else {
        number_arg("byte_format", "bytes", &bytes)?
    };
    let use_si = bool_arg("byte_format", "use_si", use_si.as_ref(), false)?;
    let group_thousands = bool_arg(
        "byte_format",
        "group_thousands",
        group_thousands.as_ref(),
        false,
    )?;

    Ok(byte_format(count, use_si, group_thousands))
}

/// `filesize(precision=2, decimal_mark='.', system='iec')`
pub fn filesize_filter(
    size: Value,
    precision: Option<Value>,
    decimal_mark: Option<Value>,
    system: Option<Value>,
) -> Result<String, Error> {
    let size = number_arg("filesize", "filesize", &size)?;
    let precision = decimals_arg("filesize", "precision", precision.as_ref(), 2)?;
    let decimal_mark = str_arg("filesize", "decimal_mark", decimal_mark.as_ref(), ".")?;
    let system = str_arg("filesize", "system", system.as_ref(), "iec")?;

    Ok(filesize(size, precision, decimal_mark, system)?)
}
