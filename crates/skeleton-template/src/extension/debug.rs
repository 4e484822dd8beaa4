//! The `debug` extension, registered when `config.debug` is set.

use minijinja::value::Rest;
use minijinja::{Environment, Value};

use super::Extension;
use crate::filters::dump::print_r;

/// Turns on engine debug information and adds `dump(...)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugExtension;

/// `dump(value, ...)`: each argument as a `print_r` block in `<pre>`.
pub fn dump_function(values: Rest<Value>) -> Value {
    let out: String = values
        .iter()
        .map(|value| format!("<pre>{}</pre>", print_r(value)))
        .collect();
    Value::from_safe_string(out)
}

impl Extension for DebugExtension {
    fn name(&self) -> &str {
        "debug"
    }

    fn register(&self, env: &mut Environment<'static>) {
        env.set_debug(true);
        env.add_function("dump", dump_function);
    }
}
