//! The `common` extension: the filter library plus URL rewriting.

use std::sync::Arc;

use minijinja::{Environment, Error, Value};

use super::Extension;
use crate::capability::UrlRewriter;
use crate::filters::{date, dump, format, sort, text, text_input, url};

/// Registers the filter library.
///
/// `rewrite` and `reverse_rewrite` use the rewriter supplied through
/// [`Capabilities::with_rewriter`](crate::Capabilities::with_rewriter).
#[derive(Debug, Clone, Default)]
pub struct CommonExtension {
    rewriter: Option<Arc<dyn UrlRewriter>>,
}

impl CommonExtension {
    pub fn new(rewriter: Option<Arc<dyn UrlRewriter>>) -> Self {
        Self { rewriter }
    }
}

impl Extension for CommonExtension {
    fn name(&self) -> &str {
        "common"
    }

    fn register(&self, env: &mut Environment<'static>) {
        env.add_filter("round", format::round_filter);
        env.add_filter("number_format", format::number_format_filter);
        env.add_filter("byte_format", format::byte_format_filter);
        env.add_filter("filesize", format::filesize_filter);
        env.add_filter("object_sort", sort::object_sort_filter);
        env.add_filter("truncate", text::truncate_filter);
        env.add_filter("transliterate", |value: Value, ruleset: Option<Value>| {
            text::transliterate_filter(value, ruleset).map(Value::from_safe_string)
        });
        env.add_filter("date", date::date_filter);
        env.add_filter("datetime", date::datetime_filter);
        env.add_filter("print_r", dump::print_r_filter);
        env.add_filter("serialize", dump::serialize_filter);
        env.add_filter("json_decode", dump::json_decode_filter);
        env.add_filter("get_class", dump::get_class_filter);
        env.add_function("strpos", text::strpos_function);

        let rewriter = self.rewriter.clone();
        env.add_filter("rewrite", move |value: Value| -> Result<Value, Error> {
            let link = text_input("rewrite", "url", &value)?;
            Ok(Value::from_safe_string(url::rewrite(rewriter.as_deref(), link)))
        });

        let rewriter = self.rewriter.clone();
        env.add_filter("reverse_rewrite", move |value: Value| -> Result<Value, Error> {
            let link = text_input("reverse_rewrite", "url", &value)?;
            Ok(Value::from_safe_string(url::reverse_rewrite(rewriter.as_deref(), link)?))
        });
    }
}
