//! Extensions: named bundles of filters, functions and globals.
//!
//! The engine registers the built-in extensions first and the application's
//! extensions (from [`Config::add_extension`](crate::Config::add_extension))
//! last, so an application filter can replace a built-in one of the same name.
//!
//! | Extension | Registered | Provides |
//! |-----------|------------|----------|
//! | `i18n` | translation capability enabled | `trans` |
//! | `debug` | `config.debug` | `dump`, engine debug mode |
//! | `common` | always | the [filter library](crate::filters), `rewrite`, `reverse_rewrite`, `strpos` |
//! | `string_loader` | always | `template_from_string` |
//! | `string` | always | `slug` |
//! | `markdown` | always | `markdown_to_html` |
//! | `cache` | always | `cache` |
//!
//! # Example
//!
//! ```rust
//! use minijinja::Environment;
//! use skeleton_template::{Config, Extension};
//!
//! #[derive(Debug)]
//! struct Shout;
//!
//! impl Extension for Shout {
//!     fn name(&self) -> &str {
//!         "shout"
//!     }
//!
//!     fn register(&self, env: &mut Environment<'static>) {
//!         env.add_filter("shout", |s: String| s.to_uppercase());
//!     }
//! }
//!
//! let config = Config::new().with_extension(Shout);
//! assert_eq!(config.extensions()[0].name(), "shout");
//! ```

pub mod cache;
pub mod common;
pub mod debug;
pub mod i18n;
pub mod markdown;
pub mod string;
pub mod string_loader;

use std::fmt;
use std::sync::Arc;

use minijinja::Environment;

use crate::capability::Capabilities;
use crate::config::Config;

pub use cache::{CacheExtension, FragmentCache};
pub use common::CommonExtension;
pub use debug::DebugExtension;
pub use i18n::I18nExtension;
pub use markdown::{MarkdownEngine, MarkdownExtension};
pub use string::StringExtension;
pub use string_loader::StringLoaderExtension;

/// A bundle of filters, functions and globals added to the engine.
pub trait Extension: Send + Sync + fmt::Debug {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Adds this extension's filters, functions and globals to `env`.
    fn register(&self, env: &mut Environment<'static>);
}

/// The shared runtimes behind the built-in extensions.
#[derive(Debug, Clone)]
pub(crate) struct Runtimes {
    pub markdown: Arc<MarkdownEngine>,
    pub cache: Arc<FragmentCache>,
}

impl Runtimes {
    pub fn new(config: &Config) -> Self {
        Self {
            markdown: Arc::new(MarkdownEngine::new(&config.markdown)),
            cache: Arc::new(FragmentCache::new(config.cache_path().join("fragments"))),
        }
    }
}

/// Built-in extensions followed by the application's, in registration order.
pub(crate) fn registry(
    config: &Config,
    capabilities: &Capabilities,
    runtimes: &Runtimes,
) -> Vec<Arc<dyn Extension>> {
    let mut extensions: Vec<Arc<dyn Extension>> = Vec::new();

    if capabilities.has_i18n() {
        extensions.push(Arc::new(I18nExtension));
    }
    if config.debug {
        extensions.push(Arc::new(DebugExtension));
    }
    extensions.push(Arc::new(CommonExtension::new(capabilities.rewriter().cloned())));
    extensions.push(Arc::new(StringLoaderExtension));
    extensions.push(Arc::new(StringExtension));
    extensions.push(Arc::new(MarkdownExtension::new(Arc::clone(&runtimes.markdown))));
    extensions.push(Arc::new(CacheExtension::new(Arc::clone(&runtimes.cache))));

    extensions.extend(config.extensions().iter().cloned());
    extensions
}
