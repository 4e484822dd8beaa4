//! Process-wide template configuration.
//!
//! A [`Config`] is built once at startup (in code, or from YAML) and handed to
//! [`Engine::new`](crate::Engine::new). It is never consulted through global
//! state.
//!
//! ```yaml
//! debug: false
//! cache_path: /var/cache/app/templates
//! autoescape: name      # name | html | true | false
//! markdown:
//!   single_linebreak: true
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extension::Extension;

const DEFAULT_CACHE_PATH: &str = "/tmp";

/// How rendered output is escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "AutoEscapeRepr", into = "AutoEscapeRepr")]
pub enum AutoEscapeMode {
    /// Pick the strategy from the template name (`page.html.twig` → HTML).
    #[default]
    Name,
    /// Always escape as HTML.
    Html,
    /// Never escape.
    Disabled,
}

impl AutoEscapeMode {
    /// Returns the engine escaping strategy for a template name.
    ///
    /// With [`AutoEscapeMode::Name`], a trailing `.twig` is ignored and the
    /// remaining extension decides: plain-text, script, style and data formats
    /// are not escaped, everything else (including no extension) is escaped as
    /// HTML.
    pub fn strategy_for(self, name: &str) -> minijinja::AutoEscape {
        match self {
            AutoEscapeMode::Html => minijinja::AutoEscape::Html,
            AutoEscapeMode::Disabled => minijinja::AutoEscape::None,
            AutoEscapeMode::Name => {
                let name = name.strip_suffix(".twig").unwrap_or(name);
                let file_name = name.rsplit('/').next().unwrap_or(name);
                match file_name.rsplit_once('.').map(|(_, ext)| ext) {
                    Some("txt" | "js" | "css" | "json" | "md" | "csv") => {
                        minijinja::AutoEscape::None
                    }
                    _ => minijinja::AutoEscape::Html,
                }
            }
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AutoEscapeRepr {
    Flag(bool),
    Strategy(String),
}

impl TryFrom<AutoEscapeRepr> for AutoEscapeMode {
    type Error = String;

    fn try_from(repr: AutoEscapeRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            AutoEscapeRepr::Flag(true) => Ok(AutoEscapeMode::Html),
            AutoEscapeRepr::Flag(false) => Ok(AutoEscapeMode::Disabled),
            AutoEscapeRepr::Strategy(s) => match s.as_str() {
                "name" => Ok(AutoEscapeMode::Name),
                "html" => Ok(AutoEscapeMode::Html),
                other => Err(format!("unknown autoescape strategy '{other}'")),
            },
        }
    }
}

impl From<AutoEscapeMode> for AutoEscapeRepr {
    fn from(mode: AutoEscapeMode) -> Self {
        match mode {
            AutoEscapeMode::Name => AutoEscapeRepr::Strategy("name".into()),
            AutoEscapeMode::Html => AutoEscapeRepr::Strategy("html".into()),
            AutoEscapeMode::Disabled => AutoEscapeRepr::Flag(false),
        }
    }
}

/// Options for the markdown extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// Treat every single newline inside a paragraph as a line break.
    pub single_linebreak: bool,
}

/// Static configuration shared by every render.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Enables the debug extension (`dump`) and engine debug information.
    pub debug: bool,

    /// Directory used for cached fragments.
    pub cache_path: Option<PathBuf>,

    /// Former name of `cache_path`, honoured when `cache_path` is unset.
    pub cache_directory: Option<PathBuf>,

    /// Escaping strategy for rendered output.
    pub autoescape: AutoEscapeMode,

    /// Markdown extension options.
    pub markdown: MarkdownConfig,

    #[serde(skip)]
    extensions: Vec<Arc<dyn Extension>>,
}

impl Config {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for malformed YAML, unknown keys or
    /// unknown autoescape strategies.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads and parses a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&contents)
    }

    /// Sets the debug flag.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Sets the fragment cache directory.
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Sets the escaping strategy.
    pub fn with_autoescape(mut self, mode: AutoEscapeMode) -> Self {
        self.autoescape = mode;
        self
    }

    /// Adds an application extension, see [`Config::add_extension`].
    pub fn with_extension(mut self, extension: impl Extension + 'static) -> Self {
        self.add_extension(extension);
        self
    }

    /// Adds an application extension.
    ///
    /// Extensions register after the built-in ones, in the order they were
    /// added, so an application filter may replace a built-in filter of the
    /// same name.
    pub fn add_extension(&mut self, extension: impl Extension + 'static) -> &mut Self {
        self.extensions.push(Arc::new(extension));
        self
    }

    /// Application extensions in registration order.
    pub fn extensions(&self) -> &[Arc<dyn Extension>] {
        &self.extensions
    }

    /// Effective cache directory.
    ///
    /// `cache_path` wins; the deprecated `cache_directory` is used when only it
    /// is set; otherwise `/tmp`.
    pub fn cache_path(&self) -> PathBuf {
        match (&self.cache_path, &self.cache_directory) {
            (Some(path), _) => path.clone(),
            (None, Some(directory)) => {
                log::warn!("`cache_directory` is deprecated, use `cache_path`");
                directory.clone()
            }
            (None, None) => PathBuf::from(DEFAULT_CACHE_PATH),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("debug", &self.debug)
            .field("cache_path", &self.cache_path)
            .field("cache_directory", &self.cache_directory)
            .field("autoescape", &self.autoescape)
            .field("markdown", &self.markdown)
            .field(
                "extensions",
                &self.extensions.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
