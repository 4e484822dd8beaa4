//! Template lookup and rendering.
//!
//! ## Key Types
//!
//! | Type | Lifetime | Purpose |
//! |------|----------|---------|
//! | [`Engine`] | process | Configuration, search path, registered extensions |
//! | [`Renderer`] | request | Assigned variables, `env` overlay, translation |
//! | [`TemplateSearchPath`] | process | Ordered, namespaced template directories |
//!
//! ## Template Names
//!
//! Names are relative paths with or without an extension. The exact name is
//! tried first, then [`TEMPLATE_EXTENSIONS`] in order:
//!
//! | Name | Looks for |
//! |------|-----------|
//! | `page` | `page`, `page.twig`, `page.html.twig`, `page.jinja`, ... |
//! | `users/list.html.twig` | that file only |
//! | `@admin/dashboard` | `dashboard*` in directories registered under `admin` |
//!
//! Escaping is decided from the name as requested, not from the file that was
//! found (see [`AutoEscapeMode`](crate::AutoEscapeMode)).

pub mod engine;
pub mod loader;
pub mod renderer;

pub use engine::Engine;
pub use loader::{SearchEntry, TemplateSearchPath, TEMPLATE_EXTENSIONS};
pub use renderer::Renderer;
