//! Template search path.
//!
//! Directories are registered with an optional namespace. A plain name such
//! as `"users/list"` is looked up in the default namespace; `"@admin/users"`
//! is looked up only in directories registered under `admin`.
//!
//! # Resolution
//!
//! For each directory of the namespace, in registration order, the name is
//! tried as given and then with each of [`TEMPLATE_EXTENSIONS`] appended. The
//! first existing file wins, so an earlier directory shadows a later one.
//!
//! Names are relative paths. `..` segments and backslashes are rejected so a
//! template can never be read from outside the registered directories.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{Error as EngineError, ErrorKind};

use crate::error::{Error, Result};

/// Extensions tried, in order, after the exact name.
pub const TEMPLATE_EXTENSIONS: &[&str] = &[".twig", ".html.twig", ".jinja", ".j2", ".html"];

/// One registered directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntry {
    pub directory: PathBuf,
    /// `None` for the default namespace.
    pub namespace: Option<String>,
}

/// Ordered list of template directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSearchPath {
    entries: Vec<SearchEntry>,
}

/// Splits `@ns/rest` into its namespace and relative name.
fn split_namespace(name: &str) -> (Option<&str>, &str) {
    match name.strip_prefix('@') {
        Some(rest) => match rest.split_once('/') {
            Some((namespace, relative)) => (Some(namespace), relative),
            None => (Some(rest), ""),
        },
        None => (None, name),
    }
}

/// The path segments of a relative template name.
fn segments(name: &str) -> std::result::Result<Vec<&str>, EngineError> {
    if name.contains('\\') {
        return Err(EngineError::new(
            ErrorKind::InvalidOperation,
            format!("invalid template name '{name}'"),
        ));
    }

    let mut parts = Vec::new();
    for part in name.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                return Err(EngineError::new(
                    ErrorKind::InvalidOperation,
                    format!("template '{name}' points outside the template directories"),
                ))
            }
            part => parts.push(part),
        }
    }
    Ok(parts)
}

impl TemplateSearchPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `directory` under `namespace` (`None` or `"@name"`/`"name"`).
    ///
    /// Registering the same directory twice for a namespace has no effect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when `directory` does not exist or is
    /// not a directory.
    pub fn add(&mut self, directory: impl AsRef<Path>, namespace: Option<&str>) -> Result<()> {
        let directory = directory.as_ref();
        if !directory.is_dir() {
            return Err(Error::Configuration(format!(
                "template path {} does not exist or is not a directory",
                directory.display()
            )));
        }

        let namespace = namespace
            .map(|ns| ns.trim_start_matches('@'))
            .filter(|ns| !ns.is_empty())
            .map(str::to_string);
        let entry = SearchEntry {
            directory: directory.to_path_buf(),
            namespace,
        };
        if !self.entries.contains(&entry) {
            self.entries.push(entry);
        }
        Ok(())
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Directories searched for `namespace`, in order.
    pub fn directories(&self, namespace: Option<&str>) -> impl Iterator<Item = &Path> + '_ {
        let namespace = namespace.map(str::to_string);
        self.entries
            .iter()
            .filter(move |entry| entry.namespace == namespace)
            .map(|entry| entry.directory.as_path())
    }

    /// The file a template name resolves to, if any.
    pub fn resolve(&self, name: &str) -> std::result::Result<Option<PathBuf>, EngineError> {
        let (namespace, relative) = split_namespace(name);
        let parts = segments(relative)?;
        let Some((last, parents)) = parts.split_last() else {
            return Ok(None);
        };

        for directory in self.directories(namespace) {
            let mut base = directory.to_path_buf();
            base.extend(parents);

            let candidates = std::iter::once(String::new())
                .chain(TEMPLATE_EXTENSIONS.iter().map(|ext| ext.to_string()));
            for ext in candidates {
                let path = base.join(format!("{last}{ext}"));
                if path.is_file() {
                    return Ok(Some(path));
                }
            }
        }
        Ok(None)
    }

    /// Loader entry point: the source of `name`, or `None` when no directory
    /// has it.
    pub fn load(&self, name: &str) -> std::result::Result<Option<String>, EngineError> {
        let Some(path) = self.resolve(name)? else {
            return Ok(None);
        };
        log::debug!("loading template {name} from {}", path.display());
        fs::read_to_string(&path).map(Some).map_err(|err| {
            EngineError::new(
                ErrorKind::InvalidOperation,
                format!("could not read template {}", path.display()),
            )
            .with_source(err)
        })
    }
}
