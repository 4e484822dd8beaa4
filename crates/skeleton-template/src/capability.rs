//! Optional collaborators: translation and URL rewriting.
//!
//! Whether a collaborator is present is decided once, when the engine is
//! built, through [`Capabilities`]. Nothing probes for them at render time.

use std::fmt;
use std::sync::Arc;

use minijinja::value::{from_args, Enumerator, Object};
use minijinja::{Error, ErrorKind, State, Value};

/// A translation for one language.
pub trait Translation: Send + Sync + fmt::Debug {
    /// Language code of this translation (e.g. `"en"`, `"nl_BE"`).
    fn language(&self) -> &str;

    /// Returns the localized form of `text`.
    fn translate(&self, text: &str) -> String;
}

/// Forward and inverse URL rewriting used for link generation.
pub trait UrlRewriter: Send + Sync + fmt::Debug {
    /// Rewrites an internal URL to its public form.
    fn rewrite(&self, url: &str) -> String;

    /// Maps a public URL back to its internal form.
    fn reverse_rewrite(&self, url: &str) -> String;
}

/// The optional collaborators available to an engine.
///
/// # Example
///
/// ```rust
/// use skeleton_template::Capabilities;
///
/// let caps = Capabilities::new().with_i18n();
/// assert!(caps.has_i18n());
/// assert!(caps.rewriter().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    i18n: bool,
    rewriter: Option<Arc<dyn UrlRewriter>>,
}

impl Capabilities {
    /// No optional collaborators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables translations: registers the `trans` filter and allows
    /// [`Renderer::set_translation`](crate::Renderer::set_translation).
    pub fn with_i18n(mut self) -> Self {
        self.i18n = true;
        self
    }

    /// Supplies the URL rewriter behind `rewrite` and `reverse_rewrite`.
    pub fn with_rewriter(mut self, rewriter: impl UrlRewriter + 'static) -> Self {
        self.rewriter = Some(Arc::new(rewriter));
        self
    }

    /// Whether translations are available.
    pub fn has_i18n(&self) -> bool {
        self.i18n
    }

    /// The URL rewriter, if one was supplied.
    pub fn rewriter(&self) -> Option<&Arc<dyn UrlRewriter>> {
        self.rewriter.as_ref()
    }
}

/// Template-side view of a [`Translation`].
///
/// Exposes `language` as an attribute and `translate(text)` as a method, and
/// prints as its language code.
#[derive(Debug)]
pub(crate) struct TranslationObject(pub(crate) Arc<dyn Translation>);

impl Object for TranslationObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "language" => Some(Value::from(self.0.language())),
            _ => None,
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["language"])
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "translate" => {
                let (text,): (&str,) = from_args(args)?;
                Ok(Value::from(self.0.translate(text)))
            }
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.language())
    }
}
