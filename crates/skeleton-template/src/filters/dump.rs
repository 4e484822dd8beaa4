//! Inspection filters: `print_r`, `serialize`, `json_decode`, `get_class`.

use minijinja::value::ValueKind;
use minijinja::{Error, Value};

use super::{bool_arg, text_input};
use crate::error::FilterError;
use crate::util::format_number;

fn is_container(value: &Value) -> bool {
    matches!(value.kind(), ValueKind::Seq | ValueKind::Map | ValueKind::Iterable)
}

/// Key/value pairs of a sequence (indexed from zero) or a map.
fn entries(value: &Value) -> Vec<(Value, Value)> {
    let Ok(iter) = value.try_iter() else {
        return Vec::new();
    };
    match value.kind() {
        ValueKind::Map => iter
            .map(|key| {
                let item = value.get_item(&key).unwrap_or_default();
                (key, item)
            })
            .collect(),
        _ => iter
            .enumerate()
            .map(|(index, item)| (Value::from(index), item))
            .collect(),
    }
}

fn scalar_text(value: &Value) -> String {
    match value.kind() {
        ValueKind::Undefined | ValueKind::None => String::new(),
        ValueKind::Bool => {
            if value.is_true() {
                "1".to_string()
            } else {
                String::new()
            }
        }
        ValueKind::Number => match (value.as_i64(), f64::try_from(value.clone())) {
            (Some(i), _) => i.to_string(),
            (None, Ok(n)) => format_number(n),
            (None, Err(_)) => value.to_string(),
        },
        _ => value.to_string(),
    }
}

fn print_r_into(out: &mut String, value: &Value, indent: usize) {
    if !is_container(value) {
        out.push_str(&scalar_text(value));
        return;
    }

    let pad = " ".repeat(indent);
    out.push_str("Array\n");
    out.push_str(&pad);
    out.push_str("(\n");
    for (key, item) in entries(value) {
        out.push_str(&pad);
        out.push_str("    [");
        out.push_str(&key.to_string());
        out.push_str("] => ");
        print_r_into(out, &item, indent + 8);
        out.push('\n');
    }
    out.push_str(&pad);
    out.push_str(")\n");
}

/// Human-readable dump of a value.
///
/// # Example
///
/// ```rust
/// use minijinja::Value;
/// use skeleton_template::filters::dump::print_r;
///
/// let value = Value::from(vec![Value::from("a"), Value::from(true)]);
/// assert_eq!(print_r(&value), "Array\n(\n    [0] => a\n    [1] => 1\n)\n");
/// assert_eq!(print_r(&Value::from(2.5)), "2.5");
/// ```
pub fn print_r(value: &Value) -> String {
    let mut out = String::new();
    print_r_into(&mut out, value, 0);
    out
}

fn serialize_key(key: &str, out: &mut String) {
    let canonical_int = key
        .parse::<i64>()
        .ok()
        .filter(|n| n.to_string() == key);
    match canonical_int {
        Some(n) => out.push_str(&format!("i:{n};")),
        None => out.push_str(&format!("s:{}:\"{}\";", key.len(), key)),
    }
}

fn serialize_float(n: f64) -> String {
    if n.is_nan() {
        "NAN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "INF" } else { "-INF" }.to_string()
    } else {
        format!("{n}")
    }
}

fn serialize_into(value: &serde_json::Value, out: &mut String) {
    use serde_json::Value as Json;

    match value {
        Json::Null => out.push_str("N;"),
        Json::Bool(b) => out.push_str(if *b { "b:1;" } else { "b:0;" }),
        Json::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => out.push_str(&format!("i:{i};")),
            (None, Some(u), _) => out.push_str(&format!("i:{u};")),
            (None, None, Some(f)) => out.push_str(&format!("d:{};", serialize_float(f))),
            (None, None, None) => out.push_str("N;"),
        },
        Json::String(s) => out.push_str(&format!("s:{}:\"{}\";", s.len(), s)),
        Json::Array(items) => {
            out.push_str(&format!("a:{}:{{", items.len()));
            for (index, item) in items.iter().enumerate() {
                out.push_str(&format!("i:{index};"));
                serialize_into(item, out);
            }
            out.push('}');
        }
        Json::Object(map) => {
            out.push_str(&format!("a:{}:{{", map.len()));
            for (key, item) in map {
                serialize_key(key, out);
                serialize_into(item, out);
            }
            out.push('}');
        }
    }
}

/// Serialises a value in the PHP `serialize` wire format.
///
/// # Example
///
/// ```rust
/// use minijinja::Value;
/// use skeleton_template::filters::dump::serialize;
///
/// assert_eq!(serialize(&Value::from("héllo")).unwrap(), "s:6:\"héllo\";");
/// assert_eq!(
///     serialize(&Value::from(vec![1, 2])).unwrap(),
///     "a:2:{i:0;i:1;i:1;i:2;}"
/// );
/// ```
pub fn serialize(value: &Value) -> Result<String, FilterError> {
    let json = serde_json::to_value(value)
        .map_err(|e| FilterError::argument("serialize", "value", e.to_string()))?;
    let mut out = String::new();
    serialize_into(&json, &mut out);
    Ok(out)
}

/// Parses a JSON document into a template value. An empty string is `none`.
pub fn json_decode(json: &str) -> Result<Value, FilterError> {
    if json.trim().is_empty() {
        return Ok(Value::from(()));
    }
    let parsed: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| FilterError::argument("json_decode", "json", e.to_string()))?;
    Ok(Value::from_serialize(&parsed))
}

/// `print_r(raw=true)`: with `raw=false` the dump is wrapped in `<pre>`.
pub fn print_r_filter(value: Value, raw: Option<Value>) -> Result<Value, Error> {
    let raw = bool_arg("print_r", "raw", raw.as_ref(), true)?;
    let dump = print_r(&value);
    let out = if raw { dump } else { format!("<pre>{dump}</pre>") };
    Ok(Value::from_safe_string(out))
}

/// `serialize`
pub fn serialize_filter(value: Value) -> Result<Value, Error> {
    Ok(Value::from_safe_string(serialize(&value)?))
}

/// `json_decode`
pub fn json_decode_filter(value: Value) -> Result<Value, Error> {
    let json = text_input("json_decode", "json", &value)?;
    Ok(json_decode(json)?)
}

/// `get_class`: the kind of the value (`string`, `number`, `map`, …).
pub fn get_class_filter(value: Value) -> String {
    value.kind().to_string()
}
