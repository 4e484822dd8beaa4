//! # Skeleton Template
//!
//! A configuration layer over [minijinja] for web applications: a request
//! aware `env` global, a library of formatting filters, markdown conversion
//! and a filesystem fragment cache.
//!
//! ## Core Concepts
//!
//! - [`Config`]: process-wide settings (debug, cache path, escaping, markdown
//!   options and application extensions), built in code or loaded from YAML
//! - [`Capabilities`]: the optional collaborators ([`Translation`],
//!   [`UrlRewriter`]) fixed when the engine is built
//! - [`Engine`]: owns the template search path and the registered
//!   [`Extension`]s; build one and share it
//! - [`Renderer`]: per-request variables, `env` overlay and translation
//! - [`RequestContext`]: the post, get, cookie, server and session maps that
//!   end up in `env`
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use skeleton_template::context::RequestContext;
//! use skeleton_template::{Capabilities, Config, Engine, Renderer};
//! use minijinja::Value;
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(
//!     dir.path().join("invoice.html.twig"),
//!     "{{ env.get.id }}: {{ total|number_format(2, ',', '.') }} ({{ size|byte_format }})",
//! ).unwrap();
//!
//! let mut engine = Engine::new(Config::new(), Capabilities::new()).unwrap();
//! engine.add_template_path(dir.path(), None).unwrap();
//! let engine = Arc::new(engine);
//!
//! let request = RequestContext::new().with_get("id", Value::from("INV-7"));
//! let mut renderer = Renderer::new(Arc::clone(&engine)).with_request(request);
//! renderer.assign("total", &1234.5).unwrap();
//! renderer.assign("size", &1536).unwrap();
//!
//! let html = renderer.render("invoice").unwrap();
//! assert_eq!(html, "INV-7: 1.234,50 (1.5 KiB)");
//! ```
//!
//! ## Filters
//!
//! See [`filters`] for the full list. Filters fail with a [`FilterError`],
//! which aborts the render; [`Error::filter_error`] recovers it from the
//! returned [`Error::Render`].
//!
//! ## Extensions
//!
//! Built-in functionality is grouped into [`Extension`]s, registered in a fixed
//! order when the engine is built. Applications add their own through
//! [`Config::with_extension`]; see [`extension`].

pub mod capability;
pub mod config;
pub mod context;
pub mod error;
pub mod extension;
pub mod filters;
pub mod template;
pub mod util;

pub use capability::{Capabilities, Translation, UrlRewriter};
pub use config::{AutoEscapeMode, Config, MarkdownConfig};
pub use context::{RenderContext, RequestContext, VariableSet};
pub use error::{Error, FilterError, Result};
pub use extension::Extension;
pub use template::{Engine, Renderer, TemplateSearchPath};
