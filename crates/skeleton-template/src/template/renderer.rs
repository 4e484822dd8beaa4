//! Per-request rendering state.

use std::sync::Arc;

use minijinja::Value;
use serde::Serialize;

use super::engine::Engine;
use crate::capability::Translation;
use crate::context::{RenderContext, RequestContext, VariableSet};
use crate::error::{Error, Result};

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    let json = serde_json::to_value(value)?;
    Ok(Value::from_serialize(&json))
}

/// Collects the variables, environment overlay, translation and request data
/// for one request and renders templates with them.
///
/// Templates see assigned variables as plain names and everything describing
/// the request under the `env` global (see [`crate::context`]).
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use skeleton_template::{Capabilities, Config, Engine, Renderer};
///
/// let dir = tempfile::tempdir().unwrap();
/// std::fs::write(
///     dir.path().join("page.html.twig"),
///     "<h1>{{ title }}</h1>{{ env.site }}",
/// ).unwrap();
///
/// let mut engine = Engine::new(Config::new(), Capabilities::new()).unwrap();
/// engine.add_template_path(dir.path(), None).unwrap();
///
/// let mut renderer = Renderer::new(Arc::new(engine));
/// renderer.assign("title", "Fish & Chips").unwrap();
/// renderer.add_environment("site", "example.org").unwrap();
///
/// let html = renderer.render("page").unwrap();
/// assert_eq!(html, "<h1>Fish &amp; Chips</h1>example.org");
/// ```
#[derive(Debug, Clone)]
pub struct Renderer {
    engine: Arc<Engine>,
    request: RequestContext,
    overlay: VariableSet,
    variables: VariableSet,
    translation: Option<Arc<dyn Translation>>,
}

impl Renderer {
    /// A renderer without request data (a command-line or background render).
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            request: RequestContext::default(),
            overlay: VariableSet::new(),
            variables: VariableSet::new(),
            translation: None,
        }
    }

    /// Sets the request data, builder style.
    pub fn with_request(mut self, request: RequestContext) -> Self {
        self.request = request;
        self
    }

    /// Sets the request data.
    pub fn set_request(&mut self, request: RequestContext) {
        self.request = request;
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Assigns a template variable. The last assignment of a key wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] when `value` cannot be serialized.
    pub fn assign<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<()> {
        self.variables.insert(key, to_value(value)?);
        Ok(())
    }

    /// Assigns an engine value directly, keeping objects and their methods.
    pub fn assign_value(&mut self, key: impl Into<String>, value: Value) {
        self.variables.insert(key, value);
    }

    /// Adds an entry to the `env` global. Entries override the request maps
    /// of the same name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] when `value` cannot be serialized.
    pub fn add_environment<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<()> {
        self.overlay.insert(key, to_value(value)?);
        Ok(())
    }

    /// Adds an engine value to the `env` global.
    pub fn add_environment_value(&mut self, key: impl Into<String>, value: Value) {
        self.overlay.insert(key, value);
    }

    /// Sets the translation used for `env.translation` and `trans`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeatureUnavailable`] unless the engine was built with
    /// [`Capabilities::with_i18n`](crate::Capabilities::with_i18n).
    pub fn set_translation(&mut self, translation: Arc<dyn Translation>) -> Result<()> {
        if !self.engine.capabilities().has_i18n() {
            return Err(Error::FeatureUnavailable("translation"));
        }
        self.translation = Some(translation);
        Ok(())
    }

    pub fn translation(&self) -> Option<&Arc<dyn Translation>> {
        self.translation.as_ref()
    }

    /// Variables assigned so far.
    pub fn variables(&self) -> &VariableSet {
        &self.variables
    }

    /// The `env` global as the next render would see it.
    pub fn environment(&self) -> RenderContext {
        RenderContext::assemble(&self.request, &self.overlay, self.translation.as_ref())
    }

    /// Renders `template`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateNotFound`] when no template path has the
    /// template, and [`Error::Render`] for any other failure, including a
    /// failing filter (see [`Error::filter_error`]).
    pub fn render(&self, template: &str) -> Result<String> {
        let globals = self.environment();
        log::debug!(
            "rendering {} with {} variables and {} env keys",
            template,
            self.variables.len(),
            globals.len()
        );
        self.engine.render(template, &globals, &self.variables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Capabilities, Config};

    #[derive(Debug)]
    struct English;

    impl Translation for English {
        fn language(&self) -> &str {
            "en"
        }

        fn translate(&self, text: &str) -> String {
            text.to_string()
        }
    }

    fn renderer(capabilities: Capabilities) -> Renderer {
        Renderer::new(Arc::new(Engine::new(Config::new(), capabilities).unwrap()))
    }

    #[test]
    fn assign_last_write_wins() {
        let mut renderer = renderer(Capabilities::new());
        renderer.assign("a", &1).unwrap();
        renderer.assign("a", "two").unwrap();
        assert_eq!(renderer.variables().len(), 1);
        assert_eq!(renderer.variables().get("a"), Some(&Value::from("two")));
    }

    #[test]
    fn assign_rejects_unserializable_values() {
        use std::collections::HashMap;

        let mut renderer = renderer(Capabilities::new());
        let mut bad = HashMap::new();
        bad.insert(vec![1u8], 1);
        let err = renderer.assign("bad", &bad).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(renderer.variables().is_empty());
    }

    #[test]
    fn set_translation_requires_capability() {
        let mut renderer = renderer(Capabilities::new());
        let err = renderer.set_translation(Arc::new(English)).unwrap_err();
        assert!(matches!(err, Error::FeatureUnavailable("translation")));
        assert!(renderer.translation().is_none());
    }

    #[test]
    fn environment_reflects_translation() {
        let mut renderer = renderer(Capabilities::new().with_i18n());
        assert!(!renderer.environment().contains_key("language"));

        renderer.set_translation(Arc::new(English)).unwrap();
        let env = renderer.environment();
        assert_eq!(env.get("language"), Some(&Value::from("en")));
        assert!(env.contains_key("translation"));
    }

    #[test]
    fn environment_overlay_beats_request() {
        let request = RequestContext::new().with_get("page", Value::from(1));
        let mut renderer = renderer(Capabilities::new()).with_request(request);
        assert_eq!(
            renderer.environment().get("get").unwrap().get_attr("page").unwrap(),
            Value::from(1)
        );

        renderer.add_environment("get", "replaced").unwrap();
        assert_eq!(renderer.environment().get("get"), Some(&Value::from("replaced")));
    }
}
