//! End-to-end rendering through configured views: exposures feeding
//! templates, part decoration, partials, layouts, and context access.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use minijinja::value::Value;
use tempfile::TempDir;

use vellum::{
    input_from, AsOverride, Exposure, ExposureArgs, MapContext, Part, PartBehavior, Resolution,
    View, ViewConfig, ViewError,
};

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn input(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[test]
fn test_dependent_exposures_feed_the_template() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "summary.html.jinja", "{{ headline }} ({{ count }})");

    let view = View::new(
        ViewConfig::new("summary")
            .path(tmp.path())
            .expose(Exposure::new("posts").undecorated())
            .expose(
                Exposure::with("count", |args: ExposureArgs<'_>| {
                    Ok(Value::from(args.deps[0].len().unwrap_or(0)))
                })
                .depends_on(["posts"])
                .undecorated(),
            )
            .expose(
                Exposure::with("headline", |args: ExposureArgs<'_>| {
                    Ok(Value::from(format!("{} posts", args.deps[0])))
                })
                .depends_on(["count"])
                .undecorated(),
            ),
    )
    .unwrap();

    let posts = Value::from(vec![Value::from("a"), Value::from("b")]);
    let rendered = view.render(input(&[("posts", posts)])).unwrap();
    assert_eq!(rendered.output(), "2 posts (2)");
}

#[test]
fn test_collection_part_iterates_in_template() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "list.html.jinja",
        "{% for user in users %}[{{ user.name }}]{% endfor %}",
    );

    let view = View::new(
        ViewConfig::new("list")
            .path(tmp.path())
            .expose(Exposure::new("users")),
    )
    .unwrap();

    let users = Value::from(vec![
        Value::from_iter([("name", Value::from("ada"))]),
        Value::from_iter([("name", Value::from("grace"))]),
    ]);
    let rendered = view.render(input(&[("users", users)])).unwrap();
    assert_eq!(rendered.output(), "[ada][grace]");
}

#[test]
fn test_part_behavior_accessor_in_template() {
    struct UserPart;
    impl PartBehavior for UserPart {
        fn resolve(&self, part: &Part, name: &str) -> Result<Resolution, ViewError> {
            if name == "display_name" {
                let raw = part.value().get_attr("name").unwrap_or(Value::UNDEFINED);
                return Ok(Resolution::Found(Value::from(format!("@{}", raw))));
            }
            Ok(Resolution::NotFound)
        }
    }

    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "profile.html.jinja", "{{ user.display_name }}");

    let view = View::new(
        ViewConfig::new("profile")
            .path(tmp.path())
            .part("User", Arc::new(UserPart))
            .expose(Exposure::new("user")),
    )
    .unwrap();

    let user = Value::from_iter([("name", Value::from("ada"))]);
    let rendered = view.render(input(&[("user", user)])).unwrap();
    assert_eq!(rendered.output(), "@ada");
}

#[test]
fn test_as_override_picks_registered_behavior() {
    struct Loud;
    impl PartBehavior for Loud {
        fn resolve(&self, part: &Part, name: &str) -> Result<Resolution, ViewError> {
            if name == "shout" {
                return Ok(Resolution::Found(Value::from(
                    part.value().to_string().to_uppercase(),
                )));
            }
            Ok(Resolution::NotFound)
        }
    }

    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "banner.html.jinja", "{{ message.shout }}");

    let view = View::new(
        ViewConfig::new("banner")
            .path(tmp.path())
            .part("Announcement", Arc::new(Loud))
            .expose(Exposure::new("message").with_as(AsOverride::name("announcement"))),
    )
    .unwrap();

    let rendered = view
        .render(input(&[("message", Value::from("hello"))]))
        .unwrap();
    assert_eq!(rendered.output(), "HELLO");
}

#[test]
fn test_part_renders_partial_with_itself_as_local() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "show.html.jinja", "{{ user.render(\"card\") }}");
    write(tmp.path(), "_card.html.jinja", "<card>{{ user.name }}</card>");

    let view = View::new(
        ViewConfig::new("show")
            .path(tmp.path())
            .expose(Exposure::new("user")),
    )
    .unwrap();

    let user = Value::from_iter([("name", Value::from("ada"))]);
    let rendered = view.render(input(&[("user", user)])).unwrap();
    assert_eq!(rendered.output(), "<card>ada</card>");
}

#[test]
fn test_part_render_accepts_rename_and_extra_locals() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "show.html.jinja",
        "{{ user.render(\"badge\", {\"as\": \"person\", \"label\": \"VIP\"}) }}",
    );
    write(
        tmp.path(),
        "_badge.html.jinja",
        "{{ label }}:{{ person.name }}",
    );

    let view = View::new(
        ViewConfig::new("show")
            .path(tmp.path())
            .expose(Exposure::new("user")),
    )
    .unwrap();

    let user = Value::from_iter([("name", Value::from("ada"))]);
    let rendered = view.render(input(&[("user", user)])).unwrap();
    assert_eq!(rendered.output(), "VIP:ada");
}

#[test]
fn test_bare_render_call_renders_partial_against_scope() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "page.html.jinja", "a|{{ render(\"aside\") }}|z");
    write(tmp.path(), "_aside.html.jinja", "{{ note }}");

    let view = View::new(
        ViewConfig::new("page")
            .path(tmp.path())
            .expose(Exposure::new("note").undecorated()),
    )
    .unwrap();

    let rendered = view.render(input(&[("note", Value::from("n"))])).unwrap();
    assert_eq!(rendered.output(), "a|n|z");
}

#[test]
fn test_partial_resolves_next_to_nested_template() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "users/index.html.jinja", "{{ render(\"card\") }}");
    write(tmp.path(), "users/_card.html.jinja", "user card");
    write(tmp.path(), "_card.html.jinja", "root card");

    let view = View::new(ViewConfig::new("users/index").path(tmp.path())).unwrap();
    let rendered = view.render(HashMap::new()).unwrap();
    // The partial next to the template shadows the root-level one.
    assert_eq!(rendered.output(), "user card");
}

#[test]
fn test_partial_found_in_shared_directory() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "page.html.jinja", "{{ render(\"footer\") }}");
    write(tmp.path(), "shared/_footer.html.jinja", "shared footer");

    let view = View::new(ViewConfig::new("page").path(tmp.path())).unwrap();
    let rendered = view.render(HashMap::new()).unwrap();
    assert_eq!(rendered.output(), "shared footer");
}

#[test]
fn test_context_members_resolve_in_scope_and_parts() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "page.html.jinja",
        "{{ site_name }}/{{ user.context.site_name }}",
    );

    let ctx = MapContext::new().with("site_name", Value::from("Example"));
    let view = View::new(
        ViewConfig::new("page")
            .path(tmp.path())
            .context(Arc::new(ctx))
            .expose(Exposure::new("user")),
    )
    .unwrap();

    let user = Value::from_iter([("id", Value::from(1))]);
    let rendered = view.render(input(&[("user", user)])).unwrap();
    assert_eq!(rendered.output(), "Example/Example");
}

#[test]
fn test_layout_wraps_and_sees_locals() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "article.html.jinja", "<p>{{ body }}</p>");
    write(
        tmp.path(),
        "layouts/site.html.jinja",
        "<title>{{ title }}</title>{{ content }}",
    );

    let view = View::new(
        ViewConfig::new("article")
            .path(tmp.path())
            .layout("site")
            .expose(Exposure::new("title").undecorated())
            .expose(Exposure::new("body").undecorated()),
    )
    .unwrap();

    let rendered = view
        .render(input(&[
            ("title", Value::from("T")),
            ("body", Value::from("B")),
        ]))
        .unwrap();
    assert_eq!(rendered.output(), "<title>T</title><p>B</p>");
}

#[test]
fn test_format_selects_template_variant() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "report.html.jinja", "<b>html</b>");
    write(tmp.path(), "report.txt.jinja", "plain");

    let view = View::new(ViewConfig::new("report").path(tmp.path()).format("txt")).unwrap();
    let rendered = view.render(HashMap::new()).unwrap();
    assert_eq!(rendered.output(), "plain");
}

#[test]
fn test_private_exposure_is_invisible_to_template() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "page.html.jinja", "{{ shown }}");

    let view = View::new(
        ViewConfig::new("page")
            .path(tmp.path())
            .expose(Exposure::new("token").private().undecorated())
            .expose(
                Exposure::with("shown", |args: ExposureArgs<'_>| {
                    Ok(Value::from(format!("<{}>", args.deps[0])))
                })
                .depends_on(["token"])
                .undecorated(),
            ),
    )
    .unwrap();

    let rendered = view
        .render(input(&[("token", Value::from("t0k"))]))
        .unwrap();
    assert_eq!(rendered.output(), "<t0k>");
    assert!(rendered.get("token").is_none());
    assert!(rendered.get("shown").is_some());
}

#[test]
fn test_cycle_fails_before_rendering() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "page.html.jinja", "never rendered");

    let view = View::new(
        ViewConfig::new("page")
            .path(tmp.path())
            .expose(Exposure::new("a").depends_on(["b"]))
            .expose(Exposure::new("b").depends_on(["a"])),
    )
    .unwrap();

    let err = view.render(HashMap::new()).unwrap_err();
    assert!(matches!(err, ViewError::CyclicDependency { .. }));
}

#[test]
fn test_strict_templates_error_on_unknown_names() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "page.html.jinja", "{{ no_such_thing }}");

    let view = View::new(ViewConfig::new("page").path(tmp.path())).unwrap();
    let err = view.render(HashMap::new()).unwrap_err();
    assert!(matches!(err, ViewError::Template(_)));
}

#[test]
fn test_input_from_json_feeds_a_render() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "order.html.jinja",
        "order {{ order.id }} for {{ order.customer.name }}",
    );

    let view = View::new(
        ViewConfig::new("order")
            .path(tmp.path())
            .expose(Exposure::new("order")),
    )
    .unwrap();

    let input = input_from(&serde_json::json!({
        "order": { "id": 17, "customer": { "name": "ada" } }
    }))
    .unwrap();
    let rendered = view.render(input).unwrap();
    assert_eq!(rendered.output(), "order 17 for ada");
}

#[test]
fn test_rendered_locals_expose_part_values() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "page.html.jinja", "x");

    let view = View::new(
        ViewConfig::new("page")
            .path(tmp.path())
            .expose(Exposure::new("user")),
    )
    .unwrap();

    let user = Value::from_iter([("name", Value::from("ada"))]);
    let rendered = view.render(input(&[("user", user)])).unwrap();
    let part = rendered
        .get("user")
        .and_then(|value| value.downcast_object_ref::<Part>())
        .unwrap();
    assert_eq!(part.name(), "user");
    assert_eq!(part.get("name").unwrap(), Value::from("ada"));
}
