//! The filter library.
//!
//! Each submodule holds plain Rust functions with the actual semantics (easy
//! to test and to call from application code) plus thin `*_filter` adapters
//! that take engine values, validate them and report bad input as
//! [`FilterError::Argument`] naming the filter and the offending argument.
//!
//! Arguments are positional, in the order documented on each adapter.
//! Missing or `none` optional arguments take their defaults.
//!
//! | Filter | Module |
//! |--------|--------|
//! | `round`, `number_format`, `byte_format`, `filesize` | [`format`] |
//! | `object_sort` | [`sort`] |
//! | `truncate`, `transliterate`, `slug`, `strpos` | [`text`] |
//! | `date`, `datetime` | [`date`] |
//! | `print_r`, `serialize`, `json_decode`, `get_class` | [`dump`] |
//! | `rewrite`, `reverse_rewrite` | [`url`] |

pub mod date;
pub mod dump;
pub mod format;
pub mod sort;
pub mod text;
pub mod url;

use minijinja::value::ValueKind;
use minijinja::Value;

use crate::error::FilterError;

/// Whether an optional argument was left out (or passed as `none`).
pub(crate) fn is_missing(value: Option<&Value>) -> bool {
    value.map_or(true, |v| v.is_undefined() || v.is_none())
}

pub(crate) fn number_arg(
    filter: &'static str,
    argument: &'static str,
    value: &Value,
) -> Result<f64, FilterError> {
    if value.kind() != ValueKind::Number {
        return Err(FilterError::argument(
            filter,
            argument,
            format!("expected a number, got {}", value.kind()),
        ));
    }
    f64::try_from(value.clone())
        .map_err(|_| FilterError::argument(filter, argument, "number out of range"))
}

pub(crate) fn int_arg(
    filter: &'static str,
    argument: &'static str,
    value: Option<&Value>,
    default: i64,
) -> Result<i64, FilterError> {
    let value = match value {
        Some(value) if !is_missing(Some(value)) => value,
        _ => return Ok(default),
    };
    let number = number_arg(filter, argument, value)?;
    if number.fract() != 0.0 || number.abs() > i64::MAX as f64 {
        return Err(FilterError::argument(
            filter,
            argument,
            format!("expected an integer, got {number}"),
        ));
    }
    Ok(number as i64)
}

pub(crate) fn bool_arg(
    filter: &'static str,
    argument: &'static str,
    value: Option<&Value>,
    default: bool,
) -> Result<bool, FilterError> {
    match value {
        Some(value) if !is_missing(Some(value)) => match value.kind() {
            ValueKind::Bool => Ok(value.is_true()),
            kind => Err(FilterError::argument(
                filter,
                argument,
                format!("expected a boolean, got {kind}"),
            )),
        },
        _ => Ok(default),
    }
}

pub(crate) fn str_arg<'a>(
    filter: &'static str,
    argument: &'static str,
    value: Option<&'a Value>,
    default: &'a str,
) -> Result<&'a str, FilterError> {
    match value {
        Some(value) if !is_missing(Some(value)) => value.as_str().ok_or_else(|| {
            FilterError::argument(
                filter,
                argument,
                format!("expected a string, got {}", value.kind()),
            )
        }),
        _ => Ok(default),
    }
}

/// A string input; `none` and undefined read as the empty string.
pub(crate) fn text_input<'a>(
    filter: &'static str,
    argument: &'static str,
    value: &'a Value,
) -> Result<&'a str, FilterError> {
    if value.is_undefined() || value.is_none() {
        return Ok("");
    }
    value.as_str().ok_or_else(|| {
        FilterError::argument(
            filter,
            argument,
            format!("expected a string, got {}", value.kind()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_arg_rejects_strings() {
        let err = number_arg("round", "value", &Value::from("3")).unwrap_err();
        assert_eq!(
            err,
            FilterError::argument("round", "value", "expected a number, got string")
        );
    }

    #[test]
    fn int_arg_defaults_and_validates() {
        assert_eq!(int_arg("f", "n", None, 30).unwrap(), 30);
        assert_eq!(int_arg("f", "n", Some(&Value::from(())), 30).unwrap(), 30);
        assert_eq!(int_arg("f", "n", Some(&Value::from(12)), 30).unwrap(), 12);
        assert!(int_arg("f", "n", Some(&Value::from(1.5)), 30).is_err());
    }

    #[test]
    fn bool_arg_is_strict() {
        assert!(bool_arg("f", "b", Some(&Value::from(true)), false).unwrap());
        assert!(!bool_arg("f", "b", None, false).unwrap());
        assert!(bool_arg("f", "b", Some(&Value::from(1)), false).is_err());
    }

    #[test]
    fn str_arg_defaults() {
        assert_eq!(str_arg("f", "s", None, "...").unwrap(), "...");
        assert_eq!(str_arg("f", "s", Some(&Value::from("~")), "...").unwrap(), "~");
        assert!(str_arg("f", "s", Some(&Value::from(3)), "...").is_err());
    }

    #[test]
    fn text_input_none_is_empty() {
        assert_eq!(text_input("f", "value", &Value::from(())).unwrap(), "");
        assert_eq!(text_input("f", "value", &Value::UNDEFINED).unwrap(), "");
        assert!(text_input("f", "value", &Value::from(5)).is_err());
    }
}
