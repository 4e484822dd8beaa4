//! The `string_loader` extension: templates compiled from strings at render
//! time.

use std::collections::BTreeMap;

use minijinja::{Environment, Error, State, Value};

use super::Extension;

/// Registers `template_from_string`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringLoaderExtension;

/// `template_from_string(source, name=none)`
///
/// Compiles `source` with the engine's filters and functions and renders it
/// with every variable visible at the call site. `name` (defaulting to the
/// calling template's name) picks the auto-escape mode and appears in errors.
/// The output is already escaped, so it is returned as a safe string.
pub fn template_from_string(
    state: &State<'_, '_>,
    source: String,
    name: Option<String>,
) -> Result<Value, Error> {
    let ctx: BTreeMap<String, Value> = state
        .known_variables()
        .into_iter()
        .filter_map(|var| {
            let value = state.lookup(&var)?;
            (!value.is_undefined()).then(|| (var.into_owned(), value))
        })
        .collect();

    let name = name.as_deref().unwrap_or_else(|| state.name());
    let output = state.env().render_named_str(name, &source, ctx)?;
    Ok(Value::from_safe_string(output))
}

impl Extension for StringLoaderExtension {
    fn name(&self) -> &str {
        "string_loader"
    }

    fn register(&self, env: &mut Environment<'static>) {
        env.add_function("template_from_string", template_from_string);
    }
}
