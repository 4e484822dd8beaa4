//! String filters: `truncate`, `transliterate`, `slug` and the `strpos`
//! function.

use minijinja::{Error, Value};

use super::{bool_arg, int_arg, str_arg, text_input};
use crate::error::FilterError;

/// Characters removed from the end of a truncated string.
const TRAILING_WHITESPACE: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// Shortens `value` to `length` characters and appends `separator`.
///
/// Strings of at most `length` characters are returned unchanged. With
/// `preserve_words`, the cut moves forward to the first space at or after
/// `length`; when there is none the string is returned unchanged.
///
/// # Example
///
/// ```rust
/// use skeleton_template::filters::text::truncate;
///
/// assert_eq!(truncate("short", 10, false, "..."), "short");
/// assert_eq!(truncate("The quick brown fox", 10, false, "..."), "The quick...");
/// assert_eq!(truncate("The quick brown fox", 10, true, "..."), "The quick brown...");
/// assert_eq!(truncate("The quick brown fox", 9, true, "..."), "The quick...");
/// ```
pub fn truncate(value: &str, length: usize, preserve_words: bool, separator: &str) -> String {
    if value.chars().count() <= length {
        return value.to_string();
    }

    let mut cut = length;
    if preserve_words {
        match value.chars().skip(length).position(|c| c == ' ') {
            Some(offset) => cut = length + offset,
            None => return value.to_string(),
        }
    }

    let head: String = value.chars().take(cut).collect();
    let mut out = head.trim_end_matches(TRAILING_WHITESPACE).to_string();
    out.push_str(separator);
    out
}

/// One step of a transliteration ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Ascii,
    Lower,
    Upper,
    Keep,
}

fn parse_rules(ruleset: &str) -> Result<Vec<Rule>, FilterError> {
    ruleset
        .split(';')
        .map(str::trim)
        .filter(|rule| !rule.is_empty())
        .map(|rule| {
            let name = rule.strip_suffix("()").unwrap_or(rule).to_ascii_lowercase();
            match name.as_str() {
                "any-latin" | "latin-ascii" | "any-ascii" => Ok(Rule::Ascii),
                "lower" | "any-lower" => Ok(Rule::Lower),
                "upper" | "any-upper" => Ok(Rule::Upper),
                "nfc" | "nfd" | "nfkc" | "nfkd" | "null" | "any-null" => Ok(Rule::Keep),
                _ => Err(FilterError::argument(
                    "transliterate",
                    "ruleset",
                    format!("unsupported rule '{rule}'"),
                )),
            }
        })
        .collect()
}

/// Applies a `;`-separated transliteration ruleset.
///
/// # Errors
///
/// Returns [`FilterError::Argument`] when the ruleset names an unknown rule.
///
/// # Example
///
/// ```rust
/// use skeleton_template::filters::text::transliterate;
///
/// assert_eq!(transliterate("Crème Brûlée", "Any-Latin;").unwrap(), "Creme Brulee");
/// assert_eq!(transliterate("Ünïcödé", "Any-Latin; Latin-ASCII; Lower()").unwrap(), "unicode");
/// ```
pub fn transliterate(value: &str, ruleset: &str) -> Result<String, FilterError> {
    let rules = parse_rules(ruleset)?;
    let mut out = value.to_string();
    for rule in rules {
        out = match rule {
            Rule::Ascii => deunicode::deunicode(&out),
            Rule::Lower => out.to_lowercase(),
            Rule::Upper => out.to_uppercase(),
            Rule::Keep => out,
        };
    }
    Ok(out)
}

/// Turns `value` into an ASCII slug.
///
/// Runs of characters other than ASCII letters and digits become a single
/// `separator`; case is kept.
///
/// # Example
///
/// ```rust
/// use skeleton_template::filters::text::slug;
///
/// assert_eq!(slug("Hello, Wörld!", "-"), "Hello-World");
/// assert_eq!(slug("  a  b  ", "_"), "a_b");
/// ```
pub fn slug(value: &str, separator: &str) -> String {
    let ascii = deunicode::deunicode(value);
    let mut out = String::with_capacity(ascii.len());
    let mut pending = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending && !out.is_empty() {
                out.push_str(separator);
            }
            pending = false;
            out.push(c);
        } else {
            pending = true;
        }
    }

    out
}

/// Character offset of the first `needle` in `haystack`.
pub fn strpos(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte| haystack[..byte].chars().count())
}

/// `truncate(length=30, preserve_words=false, separator='...')`
pub fn truncate_filter(
    value: Value,
    length: Option<Value>,
    preserve_words: Option<Value>,
    separator: Option<Value>,
) -> Result<String, Error> {
    let text = text_input("truncate", "value", &value)?;
    let length = int_arg("truncate", "length", length.as_ref(), 30)?;
    if length < 0 {
        return Err(FilterError::argument("truncate", "length", "must not be negative").into());
    }
    let preserve_words = bool_arg("truncate", "preserve_words", preserve_words.as_ref(), false)?;
    let separator = str_arg("truncate", "separator", separator.as_ref(), "...")?;

    Ok(truncate(text, length as usize, preserve_words, separator))
}

/// `transliterate(ruleset='Any-Latin;')`
pub fn transliterate_filter(value: Value, ruleset: Option<Value>) -> Result<String, Error> {
    let text = text_input("transliterate", "value", &value)?;
    let ruleset = str_arg("transliterate", "ruleset", ruleset.as_ref(), "Any-Latin;")?;
    Ok(transliterate(text, ruleset)?)
}

/// `slug(separator='-')`
pub fn slug_filter(value: Value, separator: Option<Value>) -> Result<String, Error> {
    let text = text_input("slug", "value", &value)?;
    let separator = str_arg("slug", "separator", separator.as_ref(), "-")?;
    Ok(slug(text, separator))
}

/// `strpos(haystack, needle)`: offset or `false`.
pub fn strpos_function(haystack: Value, needle: Value) -> Result<Value, Error> {
    let haystack = text_input("strpos", "haystack", &haystack)?;
    let needle = text_input("strpos", "needle", &needle)?;
    Ok(match strpos(haystack, needle) {
        Some(offset) => Value::from(offset),
        None => Value::from(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_exact_length_unchanged() {
        assert_eq!(truncate("12345", 5, false, "..."), "12345");
        assert_eq!(truncate("", 0, false, "..."), "");
    }

    #[test]
    fn truncate_hard_cut_trims_whitespace() {
        assert_eq!(truncate("Hello world", 6, false, "..."), "Hello...");
        assert_eq!(truncate("Hello\t\nworld", 7, false, "~"), "Hello~");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("héllo wörld", 4, false, "…"), "héll…");
    }

    #[test]
    fn truncate_preserve_without_later_space() {
        assert_eq!(
            truncate("The quick brownfox", 12, true, "..."),
            "The quick brownfox"
        );
    }

    #[test]
    fn truncate_preserve_on_space_boundary() {
        assert_eq!(truncate("ab cd ef", 2, true, "."), "ab.");
    }

    #[test]
    fn truncate_filter_validates() {
        assert_eq!(
            truncate_filter(Value::from("abcdef"), Some(Value::from(3)), None, None).unwrap(),
            "abc..."
        );
        assert_eq!(
            truncate_filter(Value::from(()), None, None, None).unwrap(),
            ""
        );
        assert!(truncate_filter(Value::from("abc"), Some(Value::from(-1)), None, None).is_err());
        assert!(truncate_filter(Value::from(42), None, None, None).is_err());
    }

    #[test]
    fn transliterate_rules() {
        assert_eq!(transliterate("Ærøskøbing", "Any-Latin").unwrap(), "AEroskobing");
        assert_eq!(transliterate("straße", "Latin-ASCII; Upper").unwrap(), "STRASSE");
        assert_eq!(transliterate("abc", "NFC; ;").unwrap(), "abc");
        assert_eq!(transliterate("abc", "").unwrap(), "abc");
    }

    #[test]
    fn transliterate_unknown_rule() {
        let err = transliterate("abc", "Any-Klingon").unwrap_err();
        assert_eq!(
            err,
            FilterError::argument("transliterate", "ruleset", "unsupported rule 'Any-Klingon'")
        );
    }

    #[test]
    fn slug_collapses_runs() {
        assert_eq!(slug("--Hello--World--", "-"), "Hello-World");
        assert_eq!(slug("Ça va?", "-"), "Ca-va");
        assert_eq!(slug("!!!", "-"), "");
    }

    #[test]
    fn strpos_offsets() {
        assert_eq!(strpos("hello", "l"), Some(2));
        assert_eq!(strpos("héllo", "l"), Some(2));
        assert_eq!(strpos("hello", "z"), None);
        assert_eq!(strpos("hello", ""), Some(0));
    }

    #[test]
    fn strpos_function_returns_false() {
        assert_eq!(
            strpos_function(Value::from("abc"), Value::from("x")).unwrap(),
            Value::from(false)
        );
        assert_eq!(
            strpos_function(Value::from("abc"), Value::from("c")).unwrap(),
            Value::from(2)
        );
    }
}
