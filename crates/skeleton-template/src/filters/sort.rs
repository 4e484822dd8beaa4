//! `object_sort`: sort a list of objects by a property.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use minijinja::value::ValueKind;
use minijinja::{Error, ErrorKind, State, Value};

use super::{is_missing, str_arg};
use crate::error::FilterError;
use crate::filters::date::parse_timestamp;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl Direction {
    /// Applies this direction to an ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(FilterError::argument(
                "object_sort",
                "direction",
                format!("expected 'asc' or 'desc', got '{s}'"),
            )),
        }
    }
}

/// How sort keys are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortType {
    /// Numbers (and numeric strings) numerically, everything else by the
    /// engine's value ordering. Numeric keys sort before all other keys.
    #[default]
    Auto,
    /// ASCII case-insensitive string comparison.
    String,
    /// Keys are parsed as dates and compared as timestamps. Unparseable keys
    /// sort first.
    Date,
}

impl FromStr for SortType {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(SortType::Auto),
            "string" => Ok(SortType::String),
            "date" => Ok(SortType::Date),
            _ => Err(FilterError::argument(
                "object_sort",
                "type",
                format!("expected 'auto', 'string' or 'date', got '{s}'"),
            )),
        }
    }
}

/// The numeric reading of a key: numbers, and strings holding a finite number.
fn numeric(value: &Value) -> Option<f64> {
    match value.kind() {
        ValueKind::Number => f64::try_from(value.clone()).ok(),
        ValueKind::String => value
            .as_str()
            .and_then(|s| s.trim_start().parse::<f64>().ok())
            .filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Compares two sort keys.
///
/// Every sort type is a total order, so mixed keys such as `"2"`, `"10"` and
/// `"10a"` sort the same way whatever their input order.
pub fn compare_keys(a: &Value, b: &Value, sort_type: SortType) -> Ordering {
    match sort_type {
        SortType::Auto => match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        },
        SortType::String => {
            let x = a.to_string().to_ascii_lowercase();
            let y = b.to_string().to_ascii_lowercase();
            x.cmp(&y)
        }
        SortType::Date => parse_timestamp(a).cmp(&parse_timestamp(b)),
    }
}

/// Stable sort of `(key, item)` pairs, returning the items.
///
/// Items with equal keys keep their input order in both directions.
///
/// # Example
///
/// ```rust
/// use minijinja::Value;
/// use skeleton_template::filters::sort::{sort_keyed, Direction, SortType};
///
/// let keyed = vec![
///     (Value::from(3), Value::from("c")),
///     (Value::from(1), Value::from("a")),
///     (Value::from(2), Value::from("b")),
/// ];
/// let sorted = sort_keyed(keyed, Direction::Desc, SortType::Auto);
/// assert_eq!(sorted, vec![Value::from("c"), Value::from("b"), Value::from("a")]);
/// ```
pub fn sort_keyed(
    mut keyed: Vec<(Value, Value)>,
    direction: Direction,
    sort_type: SortType,
) -> Vec<Value> {
    keyed.sort_by(|(a, _), (b, _)| direction.apply(compare_keys(a, b, sort_type)));
    keyed.into_iter().map(|(_, item)| item).collect()
}

/// Functions report a plain kind; macros are map-shaped objects exposing
/// `name`, `arguments` and `caller`.
fn is_callable(value: &Value) -> bool {
    match value.kind() {
        ValueKind::Plain => true,
        ValueKind::Map => {
            value.as_object().is_some()
                && ["name", "arguments", "caller"]
                    .iter()
                    .all(|attr| value.get_attr(attr).is_ok_and(|v| !v.is_undefined()))
        }
        _ => false,
    }
}

/// Resolves the sort key of one item.
///
/// A string property is read as an attribute, then tried as a zero-argument
/// method, then as the name of a callable in scope (called with the item).
/// Any other property value is called with the item. Only a missing method
/// counts as "not found"; errors raised while computing a key fail the sort.
fn resolve_key(state: &State<'_, '_>, item: &Value, property: &Value) -> Result<Value, Error> {
    let Some(name) = property.as_str() else {
        return property.call(state, &[item.clone()]);
    };

    if let Ok(value) = item.get_attr(name) {
        if !value.is_undefined() {
            return Ok(value);
        }
    }

    match item.call_method(state, name, &[]) {
        Ok(value) => return Ok(value),
        Err(err) if err.kind() == ErrorKind::UnknownMethod => {}
        Err(err) => return Err(err),
    }

    match state.lookup(name) {
        Some(callable) if is_callable(&callable) => callable.call(state, &[item.clone()]),
        _ => Ok(Value::UNDEFINED),
    }
}

fn items_of(objects: &Value) -> Result<Vec<Value>, Error> {
    match objects.kind() {
        ValueKind::Undefined | ValueKind::None => Ok(Vec::new()),
        ValueKind::Seq | ValueKind::Iterable => Ok(objects.try_iter()?.collect()),
        ValueKind::Map => objects
            .try_iter()?
            .map(|key| objects.get_item(&key))
            .collect(),
        kind => Err(FilterError::argument(
            "object_sort",
            "objects",
            format!("expected a sequence or map, got {kind}"),
        )
        .into()),
    }
}

/// `object_sort(property, direction='asc', type='auto')`
pub fn object_sort_filter(
    state: &State<'_, '_>,
    objects: Value,
    property: Value,
    direction: Option<Value>,
    sort_type: Option<Value>,
) -> Result<Value, Error> {
    if is_missing(Some(&property)) {
        return Err(
            FilterError::argument("object_sort", "property", "a property is required").into(),
        );
    }
    let direction: Direction =
        str_arg("object_sort", "direction", direction.as_ref(), "asc")?.parse()?;
    let sort_type: SortType = str_arg("object_sort", "type", sort_type.as_ref(), "auto")?.parse()?;

    let items = items_of(&objects)?;
    let keyed = items
        .into_iter()
        .map(|item| Ok((resolve_key(state, &item, &property)?, item)))
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(Value::from(sort_keyed(keyed, direction, sort_type)))
}
