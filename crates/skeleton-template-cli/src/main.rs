//! `skt`: render a template from the command line.
//!
//! ```text
//! skt -p templates -p vendor/admin:admin --vars page.yaml --var title=Home page
//! ```
//!
//! Renders without a request, so `env.get`, `env.post`, `env.cookie` and
//! `env.server` are empty and there is no session. Logging goes to stderr and
//! is controlled by `SKT_LOG` (falling back to `RUST_LOG`, default `info`).

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use serde_json::{Map, Value as Json};
use skeleton_template::{Capabilities, Config, Engine, Renderer};

#[derive(Debug, Parser)]
#[command(name = "skt")]
#[command(version)]
#[command(about = "Render a template to stdout")]
struct Cli {
    /// YAML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug mode (adds the `dump` function)
    #[arg(long)]
    debug: bool,

    /// Template directory, optionally with a namespace
    #[arg(
        short = 'p',
        long = "path",
        value_name = "DIR[:NAMESPACE]",
        required = true,
        value_parser = parse_template_path
    )]
    paths: Vec<TemplatePath>,

    /// JSON or YAML file with a map of variables
    #[arg(long, value_name = "FILE")]
    vars: Option<PathBuf>,

    /// Assign a string variable
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    var: Vec<(String, String)>,

    /// Add a string entry to the `env` global
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    env: Vec<(String, String)>,

    /// Name of the template to render
    template: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TemplatePath {
    directory: PathBuf,
    namespace: Option<String>,
}

fn is_namespace(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// `DIR` or `DIR:NAMESPACE`. A suffix that is not a valid namespace is kept
/// as part of the directory.
fn parse_template_path(arg: &str) -> std::result::Result<TemplatePath, String> {
    if arg.is_empty() {
        return Err("template path must not be empty".to_string());
    }
    let (directory, namespace) = match arg.rsplit_once(':') {
        Some((dir, ns)) if !dir.is_empty() && is_namespace(ns.trim_start_matches('@')) => {
            (dir, Some(ns.trim_start_matches('@').to_string()))
        }
        _ => (arg, None),
    };
    Ok(TemplatePath {
        directory: PathBuf::from(directory),
        namespace,
    })
}

fn parse_key_value(arg: &str) -> std::result::Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{arg}'")),
    }
}

/// Reads a map of variables; `.json` files are JSON, anything else YAML.
fn load_vars(path: &Path) -> Result<Map<String, Json>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(Map::new());
    }

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let value: Json = if is_json {
        serde_json::from_str(&contents)
            .with_context(|| format!("invalid JSON in {}", path.display()))?
    } else {
        serde_yaml::from_str(&contents)
            .with_context(|| format!("invalid YAML in {}", path.display()))?
    };

    match value {
        Json::Object(map) => Ok(map),
        Json::Null => Ok(Map::new()),
        _ => bail!("{} must contain a map of variables", path.display()),
    }
}

fn run(cli: &Cli) -> Result<String> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::new(),
    };
    if cli.debug {
        config.debug = true;
    }

    let mut engine = Engine::new(config, Capabilities::new())?;
    for path in &cli.paths {
        engine
            .add_template_path(&path.directory, path.namespace.as_deref())
            .with_context(|| format!("cannot use template path {}", path.directory.display()))?;
    }

    let mut renderer = Renderer::new(Arc::new(engine));
    if let Some(path) = &cli.vars {
        let vars = load_vars(path)?;
        log::debug!("loaded {} variables from {}", vars.len(), path.display());
        for (key, value) in vars {
            renderer.assign(key, &value)?;
        }
    }
    for (key, value) in &cli.var {
        renderer.assign(key.as_str(), value.as_str())?;
    }
    for (key, value) in &cli.env {
        renderer.add_environment(key.as_str(), value.as_str())?;
    }

    let output = renderer
        .render(&cli.template)
        .with_context(|| format!("failed to render '{}'", cli.template))?;
    Ok(output)
}

fn init_logging() {
    let fallback = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(Env::new().filter_or("SKT_LOG", fallback)).init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let output = run(&cli)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
