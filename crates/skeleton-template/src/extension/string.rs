//! The `string` extension.

use minijinja::Environment;

use super::Extension;
use crate::filters::text;

/// Registers `slug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringExtension;

impl Extension for StringExtension {
    fn name(&self) -> &str {
        "string"
    }

    fn register(&self, env: &mut Environment<'static>) {
        env.add_filter("slug", text::slug_filter);
    }
}
