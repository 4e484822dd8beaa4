//! Error types for template configuration and rendering.
//!
//! This module provides [`Error`], returned by every public operation, and
//! [`FilterError`], the failure raised by filter code while a template renders.
//!
//! Filter failures travel through the template engine as the source of a
//! [`minijinja::Error`]. When a render aborts, the engine error ends up inside
//! [`Error::Render`], and [`Error::filter_error`] digs the original
//! [`FilterError`] back out of the source chain.

use thiserror::Error;

/// Error type for configuration and rendering operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration: missing template directory, unreadable or
    /// malformed configuration file.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An optional capability (translation, URL rewriting) was requested but
    /// was not enabled when the engine was built.
    #[error("{0} is not available")]
    FeatureUnavailable(&'static str),

    /// No search path yields the requested template.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Compilation or evaluation of a template failed.
    #[error("failed to render template '{template}': {source}")]
    Render {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    /// A value could not be converted for the template engine.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error while reading configuration or cache files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Maps an engine error raised while looking up `template`.
    pub(crate) fn from_lookup(template: &str, err: minijinja::Error) -> Self {
        match err.kind() {
            minijinja::ErrorKind::TemplateNotFound => Error::TemplateNotFound(template.to_string()),
            _ => Error::Render {
                template: template.to_string(),
                source: err,
            },
        }
    }

    /// Returns the filter failure that aborted a render, if there was one.
    pub fn filter_error(&self) -> Option<&FilterError> {
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(self);
        while let Some(err) = current {
            if let Some(filter_err) = err.downcast_ref::<FilterError>() {
                return Some(filter_err);
            }
            current = err.source();
        }
        None
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Configuration(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Failure raised by a filter or function during rendering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// An argument has the wrong type or an unsupported value.
    #[error("{filter}: invalid argument '{argument}': {reason}")]
    Argument {
        filter: &'static str,
        argument: &'static str,
        reason: String,
    },

    /// `filesize` was asked for a unit system other than `iec` or `metric`.
    #[error("filesize: system '{0}' is not supported")]
    UnsupportedSystem(String),

    /// The filter depends on a capability that is not available.
    #[error("{0} is not available")]
    FeatureUnavailable(&'static str),
}

impl FilterError {
    /// Shorthand for [`FilterError::Argument`].
    pub fn argument(
        filter: &'static str,
        argument: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        FilterError::Argument {
            filter,
            argument,
            reason: reason.into(),
        }
    }
}

impl From<FilterError> for minijinja::Error {
    fn from(err: FilterError) -> Self {
        minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, err.to_string())
            .with_source(err)
    }
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
