//! The `cache` extension: filesystem fragment cache.
//!
//! ```jinja
//! {% filter cache("sidebar", 300) %}
//!   {{ expensive_listing() }}
//! {% endfilter %}
//! ```
//!
//! Fragments are stored as `<key>.html` under the cache root. A fresh entry
//! is returned instead of the newly rendered body. The body is still
//! evaluated on every render; the cache guarantees stable output, not saved
//! work.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use minijinja::{Environment, Error, Value};

use super::Extension;
use crate::error::FilterError;
use crate::filters::{int_arg, is_missing, text_input};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// File name for a cache key: ASCII letters, digits, `-` and `_` are kept,
/// every other byte becomes `~xx`.
fn file_stem(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("~{byte:02x}"));
        }
    }
    out
}

/// A directory of cached fragments.
#[derive(Debug, Clone)]
pub struct FragmentCache {
    root: PathBuf,
}

impl FragmentCache {
    /// A cache rooted at `root`. Nothing is created until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the fragment stored under `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.html", file_stem(key)))
    }

    /// The stored fragment, if it exists and is younger than `ttl`.
    ///
    /// Without a `ttl` entries never expire.
    pub fn get(&self, key: &str, ttl: Option<Duration>) -> Option<String> {
        let path = self.path_for(key);
        let meta = fs::metadata(&path).ok()?;

        if let Some(ttl) = ttl {
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let age = SystemTime::now()
                .duration_since(modified)
                .unwrap_or(Duration::ZERO);
            if age >= ttl {
                return None;
            }
        }

        fs::read_to_string(&path).ok()
    }

    /// Stores `body` under `key`, replacing any previous entry atomically.
    pub fn put(&self, key: &str, body: &str) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(key);
        let tmp = self.root.join(format!(
            ".{}.{}.{}.tmp",
            file_stem(key),
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path).inspect_err(|_| {
            let _ = fs::remove_file(&tmp);
        })
    }

    /// Removes the entry for `key`, if any.
    pub fn invalidate(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }

    /// Returns the fresh entry for `key`, or stores and returns `body`.
    ///
    /// Cache I/O failures are logged and the body is returned.
    pub fn fetch(&self, key: &str, ttl: Option<Duration>, body: &str) -> String {
        if let Some(cached) = self.get(key, ttl) {
            log::debug!("fragment cache hit: {key}");
            return cached;
        }
        if let Err(err) = self.put(key, body) {
            log::warn!(
                "failed to write fragment cache entry {}: {}",
                self.path_for(key).display(),
                err
            );
        }
        body.to_string()
    }
}

/// Registers the `cache` filter backed by a shared [`FragmentCache`].
#[derive(Debug, Clone)]
pub struct CacheExtension {
    cache: Arc<FragmentCache>,
}

impl CacheExtension {
    pub fn new(cache: Arc<FragmentCache>) -> Self {
        Self { cache }
    }
}

impl Extension for CacheExtension {
    fn name(&self) -> &str {
        "cache"
    }

    fn register(&self, env: &mut Environment<'static>) {
        let cache = Arc::clone(&self.cache);
        env.add_filter(
            "cache",
            move |body: Value, key: Value, ttl: Option<Value>| -> Result<Value, Error> {
                let body = text_input("cache", "body", &body)?;
                let key = text_input("cache", "key", &key)?;
                if key.is_empty() {
                    return Err(FilterError::argument("cache", "key", "must not be empty").into());
                }
                let ttl = if is_missing(ttl.as_ref()) {
                    None
                } else {
                    let seconds = int_arg("cache", "ttl", ttl.as_ref(), 0)?;
                    if seconds < 0 {
                        return Err(
                            FilterError::argument("cache", "ttl", "must not be negative").into()
                        );
                    }
                    Some(Duration::from_secs(seconds as u64))
                };
                Ok(Value::from_safe_string(cache.fetch(key, ttl, body)))
            },
        );
    }
}
