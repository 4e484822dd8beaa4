//! End-to-end rendering through `Engine` and `Renderer`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use insta::assert_snapshot;
use minijinja::value::Object;
use minijinja::{Environment, ErrorKind, State, Value};
use serde_json::json;
use serial_test::serial;
use skeleton_template::context::RequestContext;
use skeleton_template::{
    AutoEscapeMode, Capabilities, Config, Engine, Error, Extension, FilterError, Renderer,
    Translation, UrlRewriter,
};
use tempfile::TempDir;

// ============================================================================
// Test helpers
// ============================================================================

#[derive(Debug)]
struct Dutch;

impl Translation for Dutch {
    fn language(&self) -> &str {
        "nl"
    }

    fn translate(&self, text: &str) -> String {
        match text {
            "Hello" => "Hallo".to_string(),
            "Goodbye" => "Tot ziens".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug)]
struct LanguagePrefix;

impl UrlRewriter for LanguagePrefix {
    fn rewrite(&self, url: &str) -> String {
        format!("/nl{url}")
    }

    fn reverse_rewrite(&self, url: &str) -> String {
        url.strip_prefix("/nl").unwrap_or(url).to_string()
    }
}

#[derive(Debug)]
struct Shout;

impl Extension for Shout {
    fn name(&self) -> &str {
        "shout"
    }

    fn register(&self, env: &mut Environment<'static>) {
        env.add_filter("shout", |s: String| format!("{}!", s.to_uppercase()));
        env.add_filter("round", |_value: Value| "overridden");
    }
}

/// A catalogue entry exposing its price as a method only.
#[derive(Debug)]
struct Item {
    name: &'static str,
    price: i64,
}

impl Object for Item {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "name" => Some(Value::from(self.name)),
            _ => None,
        }
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, minijinja::Error> {
        match (method, args) {
            ("price", []) => Ok(Value::from(self.price)),
            _ => Err(minijinja::Error::from(ErrorKind::UnknownMethod)),
        }
    }
}

fn write_templates(dir: &Path, files: &[(&str, &str)]) {
    for (name, source) in files {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, source).unwrap();
    }
}

fn templates(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_templates(dir.path(), files);
    dir
}

fn renderer_with(config: Config, capabilities: Capabilities, dir: &Path) -> Renderer {
    let mut engine = Engine::new(config, capabilities).unwrap();
    engine.add_template_path(dir, None).unwrap();
    Renderer::new(Arc::new(engine))
}

fn renderer(dir: &Path) -> Renderer {
    renderer_with(Config::new(), Capabilities::new(), dir)
}

// ============================================================================
// Lookup
// ============================================================================

#[test]
fn test_namespaced_and_default_paths() {
    let main = templates(&[("layout.html.twig", "main layout")]);
    let admin = templates(&[("layout.html.twig", "admin layout")]);

    let mut engine = Engine::new(Config::new(), Capabilities::new()).unwrap();
    engine.add_template_path(main.path(), None).unwrap();
    engine.add_template_path(admin.path(), Some("admin")).unwrap();
    let renderer = Renderer::new(Arc::new(engine));

    assert_eq!(renderer.render("layout").unwrap(), "main layout");
    assert_eq!(renderer.render("@admin/layout").unwrap(), "admin layout");
}

#[test]
fn test_first_registered_path_wins() {
    let first = templates(&[("page.twig", "first")]);
    let second = templates(&[("page.twig", "second"), ("other.twig", "from second")]);

    let mut engine = Engine::new(Config::new(), Capabilities::new()).unwrap();
    engine.add_template_path(first.path(), None).unwrap();
    engine.add_template_path(second.path(), None).unwrap();
    let renderer = Renderer::new(Arc::new(engine));

    assert_eq!(renderer.render("page").unwrap(), "first");
    assert_eq!(renderer.render("other").unwrap(), "from second");
}

#[test]
fn test_include_and_extends_use_search_path() {
    let main = templates(&[
        ("base.html.twig", "<main>{% block body %}{% endblock %}</main>"),
        (
            "page.html.twig",
            "{% extends 'base.html.twig' %}{% block body %}{% include '@parts/nav' %}{% endblock %}",
        ),
    ]);
    let parts = templates(&[("nav.html.twig", "<nav>{{ env.get.section }}</nav>")]);

    let mut engine = Engine::new(Config::new(), Capabilities::new()).unwrap();
    engine.add_template_path(main.path(), None).unwrap();
    engine.add_template_path(parts.path(), Some("parts")).unwrap();
    let request = RequestContext::new().with_get("section", Value::from("news"));
    let renderer = Renderer::new(Arc::new(engine)).with_request(request);

    assert_eq!(renderer.render("page").unwrap(), "<main><nav>news</nav></main>");
}

#[test]
fn test_missing_template_is_not_found() {
    let dir = templates(&[]);
    let err = renderer(dir.path()).render("missing").unwrap_err();
    assert!(matches!(err, Error::TemplateNotFound(ref name) if name == "missing"));
    assert_eq!(err.to_string(), "template not found: missing");
}

#[test]
fn test_syntax_error_is_render_error() {
    let dir = templates(&[("broken.twig", "{% if %}")]);
    let err = renderer(dir.path()).render("broken").unwrap_err();
    assert!(matches!(err, Error::Render { ref template, .. } if template == "broken"));
    assert!(err.filter_error().is_none());
}

// ============================================================================
// The env global
// ============================================================================

#[test]
fn test_request_maps_without_request_are_empty() {
    let dir = templates(&[(
        "cli.txt",
        "{{ env.get|length }}{{ env.post|length }}{{ env.cookie|length }}{{ env.server|length }}|{{ env.session is defined }}",
    )]);
    assert_eq!(renderer(dir.path()).render("cli.txt").unwrap(), "0000|false");
}

#[test]
fn test_session_present_only_with_session() {
    let dir = templates(&[(
        "s.txt",
        "{% if env.session is defined %}user={{ env.session.user }}{% else %}none{% endif %}",
    )]);

    let mut session = BTreeMap::new();
    session.insert("user".to_string(), Value::from("ada"));
    let with_session =
        renderer(dir.path()).with_request(RequestContext::new().with_session(session));
    let without = renderer(dir.path()).with_request(RequestContext::new());

    assert_eq!(with_session.render("s.txt").unwrap(), "user=ada");
    assert_eq!(without.render("s.txt").unwrap(), "none");
}

#[test]
fn test_overlay_wins_and_variables_stay_separate() {
    let dir = templates(&[(
        "p.txt",
        "{{ env.get }}|{{ env.title }}|{{ title }}|{{ env.site is defined }}",
    )]);
    let request = RequestContext::new().with_get("page", Value::from(3));
    let mut renderer = renderer(dir.path()).with_request(request);

    renderer.add_environment("get", "overlay").unwrap();
    renderer.add_environment("title", "from env").unwrap();
    renderer.assign("title", "from assign").unwrap();

    assert_eq!(renderer.render("p.txt").unwrap(), "overlay|from env|from assign|false");
}

#[test]
fn test_assign_structured_values() {
    let dir = templates(&[(
        "list.txt",
        "{% for user in users %}{{ user.name }}({{ user.age }}) {% endfor %}",
    )]);
    let mut renderer = renderer(dir.path());
    renderer
        .assign("users", &json!([{"name": "ada", "age": 36}, {"name": "bob", "age": 41}]))
        .unwrap();
    assert_eq!(renderer.render("list.txt").unwrap(), "ada(36) bob(41) ");
}

#[test]
fn test_engine_values_keep_their_methods() {
    let dir = templates(&[(
        "shop.txt",
        "{{ items|object_sort('price', 'desc')|map(attribute='name')|join(',') }}|{{ env.featured.price() }}",
    )]);
    let mut renderer = renderer(dir.path());
    let items: Vec<Value> = [("pen", 2), ("ink", 9), ("pad", 4)]
        .into_iter()
        .map(|(name, price)| Value::from_object(Item { name, price }))
        .collect();
    renderer.assign_value("items", Value::from(items));
    renderer.add_environment_value(
        "featured",
        Value::from_object(Item {
            name: "nib",
            price: 1,
        }),
    );

    assert_eq!(renderer.render("shop.txt").unwrap(), "ink,pad,pen|1");
}

#[test]
fn test_translation_in_env_and_trans_filter() {
    let dir = templates(&[(
        "t.txt",
        "{{ env.language }}:{{ 'Hello'|trans }},{{ env.translation.translate('Goodbye') }}",
    )]);
    let mut renderer = renderer_with(Config::new(), Capabilities::new().with_i18n(), dir.path());
    renderer.set_translation(Arc::new(Dutch)).unwrap();

    assert_eq!(renderer.render("t.txt").unwrap(), "nl:Hallo,Tot ziens");
}

#[test]
fn test_env_variable_does_not_disable_trans() {
    let dir = templates(&[("t.txt", "{{ 'Hello'|trans }}|{{ env.plan }}")]);
    let mut renderer = renderer_with(Config::new(), Capabilities::new().with_i18n(), dir.path());
    renderer.set_translation(Arc::new(Dutch)).unwrap();
    renderer.assign("env", &json!({"plan": "staging"})).unwrap();

    assert_eq!(renderer.render("t.txt").unwrap(), "Hallo|staging");
}

#[test]
fn test_trans_without_translation_passes_through() {
    let dir = templates(&[("t.txt", "{{ 'Hello'|trans }}|{{ env.language is defined }}")]);
    let renderer = renderer_with(Config::new(), Capabilities::new().with_i18n(), dir.path());
    assert_eq!(renderer.render("t.txt").unwrap(), "Hello|false");
}

#[test]
fn test_render_is_repeatable() {
    let dir = templates(&[(
        "r.html",
        "{{ items|object_sort('n')|map(attribute='n')|join(',') }} {{ env.get.q }}",
    )]);
    let request = RequestContext::new().with_get("q", Value::from("x"));
    let mut renderer = renderer(dir.path()).with_request(request);
    renderer
        .assign("items", &json!([{"n": 3}, {"n": 1}, {"n": 2}]))
        .unwrap();

    let first = renderer.render("r.html").unwrap();
    let second = renderer.render("r.html").unwrap();
    assert_eq!(first, "1,2,3 x");
    assert_eq!(first, second);
}

// ============================================================================
// Escaping
// ============================================================================

#[test]
fn test_autoescape_follows_requested_name() {
    let dir = templates(&[
        ("page.html.twig", "{{ v }}"),
        ("mail.txt.twig", "{{ v }}"),
    ]);
    let mut renderer = renderer(dir.path());
    renderer.assign("v", "<b>&</b>").unwrap();

    assert_eq!(renderer.render("page").unwrap(), "&lt;b&gt;&amp;&lt;/b&gt;");
    assert_eq!(renderer.render("mail.txt").unwrap(), "<b>&</b>");
}

#[test]
fn test_autoescape_disabled() {
    let dir = templates(&[("page.html", "{{ v }}")]);
    let config = Config::new().with_autoescape(AutoEscapeMode::Disabled);
    let mut renderer = renderer_with(config, Capabilities::new(), dir.path());
    renderer.assign("v", "<i>").unwrap();
    assert_eq!(renderer.render("page.html").unwrap(), "<i>");
}

#[test]
fn test_safe_filters_are_not_escaped() {
    let dir = templates(&[("page.html", "{{ body|markdown_to_html }}|{{ 1536|byte_format }}")]);
    let mut renderer = renderer(dir.path());
    renderer.assign("body", "**bold** & <em>raw</em>").unwrap();

    assert_eq!(
        renderer.render("page.html").unwrap(),
        "<p><strong>bold</strong> &amp; <em>raw</em></p>|1.5 KiB"
    );
}

// ============================================================================
// Filters through the engine
// ============================================================================

#[test]
fn test_formatting_filters() {
    let dir = templates(&[(
        "f.txt",
        "{{ 3.14159|round(2) }} {{ 1234567.891|number_format(2, ',', '.') }} {{ 1000000|byte_format(true) }} {{ 1536|filesize(1) }}",
    )]);
    assert_eq!(
        renderer(dir.path()).render("f.txt").unwrap(),
        "3.14 1.234.567,89 1.0 MB 1.5 KiB"
    );
}

#[test]
fn test_text_filters() {
    let dir = templates(&[(
        "t.txt",
        "{{ 'The quick brown fox'|truncate(10, true) }}|{{ 'Déjà vu, again!'|slug }}|{{ strpos('hello', 'l') }}|{{ strpos('hello', 'z') }}",
    )]);
    assert_eq!(
        renderer(dir.path()).render("t.txt").unwrap(),
        "The quick brown...|Deja-vu-again|2|false"
    );
}

#[test]
fn test_date_filters() {
    let dir = templates(&[(
        "d.txt",
        "{{ 86400|date('Y-m-d') }} {{ '2024-03-05 14:07:09'|datetime }} {{ '2024-03-05'|date }}",
    )]);
    assert_eq!(
        renderer(dir.path()).render("d.txt").unwrap(),
        "1970-01-02 05/03/2024 14:07:09 05/03/2024"
    );
}

#[test]
fn test_template_from_string() {
    let dir = templates(&[("mail.html", "<p>{{ template_from_string(body) }}</p>")]);
    let mut renderer = renderer(dir.path());
    renderer
        .assign("body", "{{ name|slug }} owes {{ amount|number_format(2) }} to {{ env.site }}")
        .unwrap();
    renderer.assign("name", "Ada & Co").unwrap();
    renderer.assign("amount", &1234.5).unwrap();
    renderer.add_environment("site", "<shop>").unwrap();

    assert_eq!(
        renderer.render("mail.html").unwrap(),
        "<p>Ada-Co owes 1234.50 to &lt;shop&gt;</p>"
    );
}

#[test]
fn test_print_r_layout() {
    let dir = templates(&[("dump.txt", "{{ user|print_r }}")]);
    let mut renderer = renderer(dir.path());
    renderer
        .assign("user", &json!({"name": "Ada", "tags": ["x"]}))
        .unwrap();
    let out = renderer.render("dump.txt").unwrap();

    assert_snapshot!(out.trim_end(), @r"
    Array
    (
        [name] => Ada
        [tags] => Array
            (
                [0] => x
            )

    )
    ");
}

#[test]
fn test_serialize_and_json_decode() {
    let dir = templates(&[(
        "s.txt",
        "{{ data|serialize }}|{{ ('{\"a\": [1, 2]}'|json_decode).a|length }}|{{ data|get_class }}",
    )]);
    let mut renderer = renderer(dir.path());
    renderer.assign("data", &json!({"id": 7, "ok": true})).unwrap();
    assert_snapshot!(
        renderer.render("s.txt").unwrap(),
        @r#"a:2:{s:2:"id";i:7;s:2:"ok";b:1;}|2|map"#
    );
}

#[test]
fn test_rewrite_with_capability() {
    let dir = templates(&[(
        "u.html",
        "{{ '/about'|rewrite }} {{ '/nl/contact'|reverse_rewrite }}",
    )]);
    let renderer = renderer_with(
        Config::new(),
        Capabilities::new().with_rewriter(LanguagePrefix),
        dir.path(),
    );
    assert_eq!(renderer.render("u.html").unwrap(), "/nl/about /contact");
}

#[test]
fn test_reverse_rewrite_without_capability_fails() {
    let dir = templates(&[("u.html", "{{ '/about'|rewrite }}{{ '/x'|reverse_rewrite }}")]);
    let err = renderer(dir.path()).render("u.html").unwrap_err();
    assert_eq!(
        err.filter_error(),
        Some(&FilterError::FeatureUnavailable("url rewriting"))
    );
}

#[test]
fn test_filter_error_is_recoverable() {
    let dir = templates(&[("f.txt", "{{ 1024|filesize(2, '.', 'si') }}")]);
    let err = renderer(dir.path()).render("f.txt").unwrap_err();

    assert!(matches!(err, Error::Render { .. }));
    assert_eq!(
        err.filter_error(),
        Some(&FilterError::UnsupportedSystem("si".to_string()))
    );
}

#[test]
fn test_huge_precision_is_a_filter_error() {
    let dir = templates(&[("f.txt", "{{ 1|filesize(100000000000) }}")]);
    let err = renderer(dir.path()).render("f.txt").unwrap_err();
    match err.filter_error() {
        Some(FilterError::Argument { filter, argument, .. }) => {
            assert_eq!(*filter, "filesize");
            assert_eq!(*argument, "precision");
        }
        other => panic!("unexpected filter error: {other:?}"),
    }
}

#[test]
fn test_argument_error_names_filter() {
    let dir = templates(&[("f.txt", "{{ 'abc'|round }}")]);
    let err = renderer(dir.path()).render("f.txt").unwrap_err();
    match err.filter_error() {
        Some(FilterError::Argument { filter, argument, .. }) => {
            assert_eq!(*filter, "round");
            assert_eq!(*argument, "value");
        }
        other => panic!("unexpected filter error: {other:?}"),
    }
}

// ============================================================================
// Configuration driven extensions
// ============================================================================

#[test]
fn test_debug_enables_dump() {
    let dir = templates(&[("d.html", "{{ dump(n) }}")]);
    let mut debug = renderer_with(Config::new().with_debug(true), Capabilities::new(), dir.path());
    debug.assign("n", &5).unwrap();
    assert_eq!(debug.render("d.html").unwrap(), "<pre>5</pre>");

    let mut plain = renderer(dir.path());
    plain.assign("n", &5).unwrap();
    assert!(matches!(plain.render("d.html"), Err(Error::Render { .. })));
}

#[test]
fn test_application_extension_registered_last() {
    let dir = templates(&[("a.txt", "{{ 'hi'|shout }} {{ 2.5|round }}")]);
    let config = Config::new().with_extension(Shout);
    let renderer = renderer_with(config, Capabilities::new(), dir.path());

    assert_eq!(
        renderer.engine().extension_names(),
        vec!["common", "string_loader", "string", "markdown", "cache", "shout"]
    );
    assert_eq!(renderer.render("a.txt").unwrap(), "HI! overridden");
}

#[test]
fn test_yaml_config() {
    let cache = TempDir::new().unwrap();
    let yaml = format!(
        "debug: true\ncache_path: {}\nautoescape: false\nmarkdown:\n  single_linebreak: true\n",
        cache.path().display()
    );
    let config = Config::from_yaml(&yaml).unwrap();
    let dir = templates(&[("m.html", "{{ '<x>' }}{{ body|markdown_to_html }}")]);
    let mut renderer = renderer_with(config, Capabilities::new(), dir.path());
    renderer.assign("body", "a\nb").unwrap();

    assert!(renderer.engine().config().debug);
    assert_eq!(renderer.render("m.html").unwrap(), "<x><p>a<br />\nb</p>");
}

// ============================================================================
// Fragment cache
// ============================================================================

#[test]
fn test_cache_block_keeps_first_render() {
    let cache = TempDir::new().unwrap();
    let dir = templates(&[(
        "c.html",
        "{% filter cache('sidebar', 300) %}<aside>{{ who }}</aside>{% endfilter %}",
    )]);
    let mut renderer = renderer_with(
        Config::new().with_cache_path(cache.path()),
        Capabilities::new(),
        dir.path(),
    );

    renderer.assign("who", "ada").unwrap();
    assert_eq!(renderer.render("c.html").unwrap(), "<aside>ada</aside>");
    renderer.assign("who", "bob").unwrap();
    assert_eq!(renderer.render("c.html").unwrap(), "<aside>ada</aside>");

    let cached = cache.path().join("fragments").join("sidebar.html");
    assert_eq!(fs::read_to_string(cached).unwrap(), "<aside>ada</aside>");

    renderer.engine().fragment_cache().invalidate("sidebar").unwrap();
    assert_eq!(renderer.render("c.html").unwrap(), "<aside>bob</aside>");
}

#[test]
#[serial(default_cache_path)]
fn test_cache_uses_default_path() {
    let key = format!("skeleton-template-test-{}", std::process::id());
    let dir = templates(&[("c.txt", "{% filter cache(key) %}{{ n }}{% endfilter %}")]);
    let mut renderer = renderer(dir.path());
    renderer.assign("key", &key).unwrap();

    let cache = renderer.engine().fragment_cache().clone();
    cache.invalidate(&key).unwrap();

    renderer.assign("n", &1).unwrap();
    assert_eq!(renderer.render("c.txt").unwrap(), "1");
    renderer.assign("n", &2).unwrap();
    assert_eq!(renderer.render("c.txt").unwrap(), "1");
    assert!(cache.root().starts_with(Config::new().cache_path()));

    cache.invalidate(&key).unwrap();
}

#[test]
fn test_edits_show_up_without_restart() {
    let dir = templates(&[("live.txt", "v1")]);
    let renderer = renderer(dir.path());
    assert_eq!(renderer.render("live.txt").unwrap(), "v1");

    write_templates(dir.path(), &[("live.txt", "v2")]);
    assert_eq!(renderer.render("live.txt").unwrap(), "v2");
}
