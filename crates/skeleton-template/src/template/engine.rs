//! The process-wide engine: configuration, search path and extensions.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use minijinja::Environment;

use super::loader::TemplateSearchPath;
use crate::capability::Capabilities;
use crate::config::Config;
use crate::context::{RenderContext, VariableSet};
use crate::error::{Error, Result};
use crate::extension::{self, Extension, FragmentCache, MarkdownEngine, Runtimes};

/// Configured template engine, shared by every render.
///
/// Build it once at startup, add template paths, then share it behind an
/// [`Arc`] and create a [`Renderer`](crate::Renderer) per request.
///
/// Templates are read from disk on every render, so edits show up without a
/// restart.
///
/// # Example
///
/// ```rust
/// use skeleton_template::{Capabilities, Config, Engine};
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(dir.path().join("hello.twig"), "Hello {{ name }}").unwrap();
///
/// let mut engine = Engine::new(Config::new(), Capabilities::new()).unwrap();
/// engine.add_template_path(dir.path(), None).unwrap();
/// assert!(engine.has_template("hello"));
/// ```
pub struct Engine {
    config: Config,
    capabilities: Capabilities,
    search_path: TemplateSearchPath,
    extensions: Vec<Arc<dyn Extension>>,
    runtimes: Runtimes,
    env: Environment<'static>,
}

impl Engine {
    /// Builds the engine and registers every extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the cache path exists but is not
    /// a directory.
    pub fn new(config: Config, capabilities: Capabilities) -> Result<Self> {
        let cache_path = config.cache_path();
        if cache_path.exists() && !cache_path.is_dir() {
            return Err(Error::Configuration(format!(
                "cache path {} is not a directory",
                cache_path.display()
            )));
        }

        let runtimes = Runtimes::new(&config);
        let extensions = extension::registry(&config, &capabilities, &runtimes);

        let mut env = Environment::new();
        let mode = config.autoescape;
        env.set_auto_escape_callback(move |name| mode.strategy_for(name));
        for extension in &extensions {
            log::debug!("registering template extension {}", extension.name());
            extension.register(&mut env);
        }

        Ok(Self {
            config,
            capabilities,
            search_path: TemplateSearchPath::new(),
            extensions,
            runtimes,
            env,
        })
    }

    /// Adds a template directory, optionally under a namespace.
    ///
    /// Directories are searched in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when `path` is not an existing
    /// directory.
    pub fn add_template_path(
        &mut self,
        path: impl AsRef<Path>,
        namespace: Option<&str>,
    ) -> Result<()> {
        let path = path.as_ref();
        self.search_path.add(path, namespace)?;
        log::debug!(
            "added template path {} (namespace {})",
            path.display(),
            namespace.unwrap_or("default")
        );

        let search_path = self.search_path.clone();
        self.env.set_loader(move |name| search_path.load(name));
        Ok(())
    }

    /// Former name of [`Engine::add_template_path`].
    #[deprecated(note = "use `add_template_path`")]
    pub fn add_template_directory(
        &mut self,
        path: impl AsRef<Path>,
        namespace: Option<&str>,
    ) -> Result<()> {
        self.add_template_path(path, namespace)
    }

    /// Whether `name` resolves to a template file.
    pub fn has_template(&self, name: &str) -> bool {
        matches!(self.search_path.resolve(name), Ok(Some(_)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn search_path(&self) -> &TemplateSearchPath {
        &self.search_path
    }

    /// Names of the registered extensions, in registration order.
    pub fn extension_names(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    pub fn fragment_cache(&self) -> &FragmentCache {
        &self.runtimes.cache
    }

    pub fn markdown(&self) -> &MarkdownEngine {
        &self.runtimes.markdown
    }

    /// The underlying environment, with all extensions registered.
    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// Renders `name` with `env` as the global and `variables` as locals.
    pub(crate) fn render(
        &self,
        name: &str,
        globals: &RenderContext,
        variables: &VariableSet,
    ) -> Result<String> {
        let mut env = self.env.clone();
        env.add_global("env", globals.to_value());

        let template = env
            .get_template(name)
            .map_err(|err| Error::from_lookup(name, err))?;
        template.render(variables.to_value()).map_err(|source| Error::Render {
            template: name.to_string(),
            source,
        })
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("capabilities", &self.capabilities)
            .field("search_path", &self.search_path)
            .field("extensions", &self.extension_names())
            .finish_non_exhaustive()
    }
}
