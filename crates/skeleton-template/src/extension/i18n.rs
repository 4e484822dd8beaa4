//! The `i18n` extension, registered when translations are enabled.

use minijinja::{Environment, Error, State, Value};

use super::Extension;

/// Adds the `trans` filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct I18nExtension;

/// The `env` the renderer installed as a global. A template variable of the
/// same name does not hide it.
fn render_env(state: &State<'_, '_>) -> Option<Value> {
    state
        .env()
        .globals()
        .find(|(name, _)| *name == "env")
        .map(|(_, value)| value)
        .or_else(|| state.lookup("env"))
}

/// `trans`: translates the value with `env.translation`.
///
/// Without a translation in the current render the value is returned as is.
pub fn trans_filter(state: &State<'_, '_>, value: Value) -> Result<Value, Error> {
    let translation = render_env(state)
        .and_then(|env| env.get_attr("translation").ok())
        .filter(|t| !t.is_undefined() && !t.is_none());

    match translation {
        Some(translation) => {
            let text = value.to_string();
            translation.call_method(state, "translate", &[Value::from(text)])
        }
        None => Ok(value),
    }
}

impl Extension for I18nExtension {
    fn name(&self) -> &str {
        "i18n"
    }

    fn register(&self, env: &mut Environment<'static>) {
        env.add_filter("trans", trans_filter);
    }
}
