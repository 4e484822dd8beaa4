//! The `markdown` extension: `markdown_to_html`.
//!
//! Before conversion the body is dedented (so indented `{% filter %}` blocks
//! work) and two embed shortcuts are expanded:
//!
//! ```text
//! ![:vimeo 640x360](76979871)
//! ![:youtube 560x315](dQw4w9WgXcQ)
//! ```
//!
//! A leading backslash (`\![:vimeo …](…)`) leaves the shortcut alone.

use std::sync::Arc;

use minijinja::{Environment, Error, Value};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::Extension;
use crate::config::MarkdownConfig;
use crate::filters::text_input;

static VIMEO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\\?)!\[:vimeo (\d+)x(\d+)\]\(([^)]+)\)").expect("vimeo embed regex")
});

static YOUTUBE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\\?)!\[:youtube (\d+)x(\d+)\]\(([^)]+)\)").expect("youtube embed regex")
});

fn vimeo_embed(width: &str, height: &str, id: &str) -> String {
    let movie = format!(
        "http://vimeo.com/moogaloop.swf?clip_id={id}&server=vimeo.com&show_title=1&show_byline=1&show_portrait=0&color=&fullscreen=1"
    );
    format!(
        "<object width=\"{width}\" height=\"{height}\">\
         <param name=\"allowfullscreen\" value=\"true\" />\
         <param name=\"allowscriptaccess\" value=\"always\" />\
         <param name=\"movie\" value=\"{movie}\" />\
         <embed src=\"{movie}\" type=\"application/x-shockwave-flash\" allowfullscreen=\"true\" allowscriptaccess=\"always\" width=\"{width}\" height=\"{height}\"></embed>\
         </object>"
    )
}

fn youtube_embed(width: &str, height: &str, id: &str) -> String {
    format!(
        "<iframe width=\"{width}\" height=\"{height}\" src=\"http://www.youtube.com/embed/{id}\" frameborder=\"0\" allowfullscreen></iframe>"
    )
}

fn expand(re: &Regex, input: &str, embed: fn(&str, &str, &str) -> String) -> String {
    re.replace_all(input, |caps: &Captures| {
        if !caps[1].is_empty() {
            return caps[0].to_string();
        }
        embed(&caps[2], &caps[3], &caps[4])
    })
    .into_owned()
}

/// Expands `![:vimeo WxH](id)` and `![:youtube WxH](id)`.
pub fn expand_embeds(input: &str) -> String {
    let with_vimeo = expand(&VIMEO, input, vimeo_embed);
    expand(&YOUTUBE, &with_vimeo, youtube_embed)
}

/// Removes the indentation of the first non-blank line from every line.
pub fn dedent(input: &str) -> String {
    let indent: String = input
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| *c == ' ' || *c == '\t').collect())
        .unwrap_or_default();
    if indent.is_empty() {
        return input.to_string();
    }

    input
        .split('\n')
        .map(|line| line.strip_prefix(indent.as_str()).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Marks every single newline inside a paragraph as a hard break.
fn hard_breaks(input: &str) -> String {
    let lines: Vec<&str> = input.split('\n').collect();
    let mut out = String::with_capacity(input.len() + lines.len() * 2);
    let mut in_fence = false;

    for (i, line) in lines.iter().enumerate() {
        if is_fence(line) {
            in_fence = !in_fence;
        }
        out.push_str(line);

        let next_has_text = lines.get(i + 1).is_some_and(|next| !next.trim().is_empty());
        let code_line = line.starts_with("    ") || line.starts_with('\t');
        if !in_fence
            && !is_fence(line)
            && !code_line
            && !line.trim().is_empty()
            && next_has_text
            && !line.ends_with("  ")
        {
            out.push_str("  ");
        }
        if i + 1 < lines.len() {
            out.push('\n');
        }
    }

    out
}

/// Markdown to HTML conversion with the embed and line-break options.
#[derive(Debug, Clone, Default)]
pub struct MarkdownEngine {
    single_linebreak: bool,
}

impl MarkdownEngine {
    pub fn new(config: &MarkdownConfig) -> Self {
        Self {
            single_linebreak: config.single_linebreak,
        }
    }

    /// Converts a markdown body to HTML. Raw HTML in the body is kept.
    ///
    /// # Example
    ///
    /// ```rust
    /// use skeleton_template::config::MarkdownConfig;
    /// use skeleton_template::extension::MarkdownEngine;
    ///
    /// let engine = MarkdownEngine::new(&MarkdownConfig::default());
    /// assert_eq!(engine.to_html("# Hello"), "<h1>Hello</h1>");
    /// ```
    pub fn to_html(&self, body: &str) -> String {
        let mut text = expand_embeds(&dedent(body));
        if self.single_linebreak {
            text = hard_breaks(&text);
        }

        let options = markdown::Options {
            parse: markdown::ParseOptions::gfm(),
            compile: markdown::CompileOptions {
                allow_dangerous_html: true,
                ..markdown::CompileOptions::gfm()
            },
        };
        match markdown::to_html_with_options(&text, &options) {
            Ok(html) => html,
            Err(message) => {
                log::warn!("markdown conversion failed, using defaults: {message}");
                markdown::to_html(&text)
            }
        }
    }
}

/// Registers `markdown_to_html` backed by a shared [`MarkdownEngine`].
#[derive(Debug, Clone)]
pub struct MarkdownExtension {
    engine: Arc<MarkdownEngine>,
}

impl MarkdownExtension {
    pub fn new(engine: Arc<MarkdownEngine>) -> Self {
        Self { engine }
    }
}

impl Extension for MarkdownExtension {
    fn name(&self) -> &str {
        "markdown"
    }

    fn register(&self, env: &mut Environment<'static>) {
        let engine = Arc::clone(&self.engine);
        env.add_filter("markdown_to_html", move |value: Value| -> Result<Value, Error> {
            let body = text_input("markdown_to_html", "value", &value)?;
            Ok(Value::from_safe_string(engine.to_html(body)))
        });
    }
}
