//! Render-time context assembly.
//!
//! Every template sees a single read-only global, `env`, describing the
//! request and runtime environment. This module builds that map.
//!
//! # Merge Order
//!
//! [`RenderContext::assemble`] applies, in order:
//!
//! 1. `post`, `get`, `cookie`, `server` from the [`RequestContext`] (empty
//!    maps when there is no request, e.g. a command-line render);
//! 2. the caller's overlay from `add_environment` (overlay wins on collision);
//! 3. `translation` and `language`, when a translation is set;
//! 4. `session`, when the request has one.
//!
//! Variables assigned with `assign` are a separate [`VariableSet`] and are
//! never merged into `env`.

use std::collections::BTreeMap;
use std::sync::Arc;

use minijinja::Value;

use crate::capability::{Translation, TranslationObject};

/// Request-scoped data supplied by the host application.
///
/// `RequestContext::default()` describes an invocation without a request:
/// every map is empty and there is no session.
///
/// # Example
///
/// ```rust
/// use skeleton_template::context::RequestContext;
/// use minijinja::Value;
///
/// let request = RequestContext::new()
///     .with_get("page", Value::from(2))
///     .with_server("REQUEST_METHOD", Value::from("GET"))
///     .with_session(Default::default());
///
/// assert!(request.session.is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub post: BTreeMap<String, Value>,
    pub get: BTreeMap<String, Value>,
    pub cookie: BTreeMap<String, Value>,
    pub server: BTreeMap<String, Value>,
    /// Present only when a session exists.
    pub session: Option<BTreeMap<String, Value>>,
}

impl RequestContext {
    /// An empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one `post` entry.
    pub fn with_post(mut self, key: impl Into<String>, value: Value) -> Self {
        self.post.insert(key.into(), value);
        self
    }

    /// Adds one `get` entry.
    pub fn with_get(mut self, key: impl Into<String>, value: Value) -> Self {
        self.get.insert(key.into(), value);
        self
    }

    /// Adds one `cookie` entry.
    pub fn with_cookie(mut self, key: impl Into<String>, value: Value) -> Self {
        self.cookie.insert(key.into(), value);
        self
    }

    /// Adds one `server` entry.
    pub fn with_server(mut self, key: impl Into<String>, value: Value) -> Self {
        self.server.insert(key.into(), value);
        self
    }

    /// Attaches a session.
    pub fn with_session(mut self, session: BTreeMap<String, Value>) -> Self {
        self.session = Some(session);
        self
    }
}

/// An insertion-ordered map of template values with unique keys.
///
/// Inserting an existing key replaces the value in place, so the key keeps
/// its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableSet {
    entries: Vec<(String, Value)>,
}

impl VariableSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Copies every entry of `other` on top of this set.
    pub fn extend(&mut self, other: &VariableSet) {
        for (key, value) in other.iter() {
            self.insert(key, value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts the set into a template map, keeping insertion order.
    pub fn to_value(&self) -> Value {
        Value::from_iter(self.entries.iter().cloned())
    }
}

/// The assembled `env` global for one render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderContext {
    vars: VariableSet,
}

impl RenderContext {
    /// Builds the context from request data, the caller's overlay and the
    /// current translation, in the documented merge order.
    pub fn assemble(
        request: &RequestContext,
        overlay: &VariableSet,
        translation: Option<&Arc<dyn Translation>>,
    ) -> Self {
        let mut vars = VariableSet::new();
        vars.insert("post", Value::from(request.post.clone()));
        vars.insert("get", Value::from(request.get.clone()));
        vars.insert("cookie", Value::from(request.cookie.clone()));
        vars.insert("server", Value::from(request.server.clone()));

        vars.extend(overlay);

        if let Some(translation) = translation {
            vars.insert(
                "translation",
                Value::from_object(TranslationObject(Arc::clone(translation))),
            );
            vars.insert("language", Value::from(translation.language()));
        }

        if let Some(session) = &request.session {
            vars.insert("session", Value::from(session.clone()));
        }

        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// The map exposed to templates as `env`.
    pub fn to_value(&self) -> Value {
        self.vars.to_value()
    }
}
