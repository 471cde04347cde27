use pagekit_core::{DataContext, Error, Field, StateKeys};
use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};

fn node_map(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => panic!("node map must be an object"),
    }
}

fn well_formed() -> Map<String, Value> {
    node_map(json!({
        "ROOT": {
            "id": "ROOT",
            "data": {
                "displayName": "Container",
                "props": {"padding": 20, "background": "#fff"},
                "nodes": ["h1", "t1"],
                "linkedNodes": {}
            }
        },
        "h1": {
            "id": "h1",
            "data": {"displayName": "Heading", "props": {"text": "{{post.title}}", "level": 2}, "parent": "ROOT"}
        },
        "t1": {
            "id": "t1",
            "data": {"displayName": "Text", "props": {"text": "By {{post.author.name}}"}, "nodes": null, "parent": "ROOT"}
        }
    }))
}

#[test]
fn resolve_token_examples() {
    let ctx = DataContext::new(json!({"a": {"b": "X"}}));
    assert_eq!(pagekit_core::resolve("{{a.b}}", &ctx), "X");
    assert_eq!(pagekit_core::resolve("{{a.c}}", &ctx), "{{a.c}}");
    assert_eq!(
        pagekit_core::resolve("Hi {{a.b}}, id {{missing}}", &ctx),
        "Hi X, id {{missing}}"
    );

    let ctx = DataContext::new(json!({"items": [{"name": "x"}, {"name": "y"}], "count": 3, "on": true}));
    assert_eq!(pagekit_core::resolve("{{items[1].name}}", &ctx), "y");
    assert_eq!(pagekit_core::resolve("{{count}} / {{on}}", &ctx), "3 / true");
}

#[test]
fn resolve_value_passes_non_strings_through() {
    let ctx = DataContext::new(json!({"a": 1}));
    assert_eq!(pagekit_core::resolve_value(&Value::Null, &ctx), Value::Null);
    assert_eq!(pagekit_core::resolve_value(&json!(42), &DataContext::default()), json!(42));
    assert_eq!(pagekit_core::resolve_value(&json!("{{a}}"), &ctx), json!("1"));
}

#[test]
fn resolve_is_idempotent() {
    let ctx = DataContext::new(json!({"user": {"name": "Ada"}}));
    let tpl = "Hello {{user.name}} ({{user.id}})";
    let first = pagekit_core::resolve(tpl, &ctx).into_owned();
    let second = pagekit_core::resolve(tpl, &ctx).into_owned();
    assert_eq!(first, second);
    assert_eq!(ctx.root(), &json!({"user": {"name": "Ada"}}));
}

#[test]
fn clean_state_has_empty_report_and_round_trips() {
    let nodes = well_formed();
    let out = pagekit_core::sanitize_and_serialize(&nodes, &StateKeys::default()).expect("sanitize");
    assert!(out.report.is_clean());
    assert_eq!(out.report.summary(), None);

    let back: Value = serde_json::from_str(&out.json).expect("valid json");
    let expected: Map<String, Value> = nodes
        .iter()
        .map(|(id, rec)| (id.clone(), rec["data"].clone()))
        .collect();
    assert_eq!(back, Value::Object(expected));
}

#[test]
fn repairs_malformed_fields() {
    let nodes = node_map(json!({
        "a": {"data": {"displayName": "Heading", "props": null}},
        "b": {"data": {"displayName": "Container", "props": {}, "linkedNodes": "bad"}},
        "c": {"data": {"displayName": "Container", "props": {}, "nodes": {}}},
        "d": {"data": {"name": "Text", "props": ["x"], "linkedNodes": [], "nodes": 7}}
    }));
    let out = pagekit_core::sanitize_and_serialize(&nodes, &StateKeys::default()).expect("sanitize");

    assert_eq!(out.nodes["a"]["props"], json!({}));
    assert_eq!(out.nodes["b"]["linkedNodes"], json!({}));
    assert_eq!(out.nodes["c"]["nodes"], json!([]));
    assert_eq!(out.nodes["d"]["props"], json!({}));
    assert_eq!(out.nodes["d"]["linkedNodes"], json!({}));
    assert_eq!(out.nodes["d"]["nodes"], json!([]));

    assert_eq!(out.report.len(), 6);
    assert_eq!(out.report.repaired_count(), 6);
    let mut seen: Vec<(String, Field)> = out
        .report
        .iter()
        .map(|v| (v.node_id.clone(), v.field))
        .collect();
    seen.sort_by(|x, y| x.0.cmp(&y.0).then(x.1.to_string().cmp(&y.1.to_string())));
    assert_eq!(
        seen,
        vec![
            ("a".to_string(), Field::Properties),
            ("b".to_string(), Field::LinkedNodes),
            ("c".to_string(), Field::ChildIdentities),
            ("d".to_string(), Field::ChildIdentities),
            ("d".to_string(), Field::LinkedNodes),
            ("d".to_string(), Field::Properties),
        ]
    );

    let a = out.report.iter().find(|v| v.node_id == "a").unwrap();
    assert_eq!(a.display_name, "Heading");
    assert_eq!(a.found, Some(Value::Null));
    assert!(a.repaired);
    assert_eq!(
        out.report.summary().as_deref(),
        Some("6 issues were auto-fixed before saving")
    );

    let back: Value = serde_json::from_str(&out.json).unwrap();
    assert_eq!(back["b"]["linkedNodes"], json!({}));
}

#[test]
fn missing_properties_is_repaired_absent_collections_are_not() {
    let nodes = node_map(json!({"n": {"data": {"displayName": "Text"}}}));
    let out = pagekit_core::sanitize_and_serialize(&nodes, &StateKeys::default()).unwrap();
    assert_eq!(out.report.len(), 1);
    let v = out.report.iter().next().unwrap();
    assert_eq!(v.field, Field::Properties);
    assert_eq!(v.found, None);
    assert_eq!(out.nodes["n"], json!({"displayName": "Text", "props": {}}));
}

#[test]
fn missing_envelope_is_fatal() {
    let mut nodes = well_formed();
    nodes.insert("ghost".into(), json!({"id": "ghost"}));
    nodes.insert("nulled".into(), json!({"id": "nulled", "data": null}));
    nodes.insert("broken".into(), json!({"id": "broken", "data": {"props": null}}));

    let err = pagekit_core::sanitize_and_serialize(&nodes, &StateKeys::default()).unwrap_err();
    let Error::UnrecoverableState { report } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(report.unrecoverable_count(), 2);
    // the repairable node is still reported alongside the fatal ones
    assert_eq!(report.repaired_count(), 1);
    assert!(
        report
            .iter()
            .filter(|v| !v.repaired)
            .all(|v| v.field == Field::Data)
    );
    assert!(err.to_string().contains("2 node(s)"));
}

#[test]
fn caller_state_is_not_mutated() {
    let nodes = node_map(json!({
        "a": {"data": {"displayName": "Heading", "props": null, "linkedNodes": 1, "nodes": "x"}}
    }));
    let before = nodes.clone();
    let out = pagekit_core::sanitize_and_serialize(&nodes, &StateKeys::default()).unwrap();
    assert_eq!(nodes, before);
    assert_eq!(out.report.len(), 3);
    assert_eq!(nodes["a"]["data"]["props"], Value::Null);
}

#[test]
fn custom_state_keys() {
    let keys: StateKeys = serde_json::from_value(json!({
        "properties": "properties",
        "childIdentities": "childIdentities"
    }))
    .unwrap();
    let nodes = node_map(json!({
        "n": {"data": {"displayName": "Text", "properties": null, "childIdentities": {}}}
    }));
    let out = pagekit_core::sanitize_and_serialize(&nodes, &keys).unwrap();
    assert_eq!(
        out.nodes["n"],
        json!({"displayName": "Text", "properties": {}, "childIdentities": []})
    );
}

#[test]
fn render_all_bound_components() {
    let nodes = well_formed();
    let ctx = DataContext::new(json!({"post": {"title": "Release notes", "author": {}}}));
    let rendered = pagekit_core::render_all(&nodes, &StateKeys::default(), &ctx);
    assert_eq!(rendered.len(), 2);
    assert_eq!(rendered[0].node_id, "h1");
    assert_eq!(rendered[0].text, json!("Release notes"));
    assert_eq!(rendered[1].text, json!("By {{post.author.name}}"));
    assert_eq!(rendered[1].unresolved, ["post.author.name"]);
}

#[test]
fn context_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("sample.json");
    std::fs::write(&p, r#"{"site": {"name": "Acme"}}"#).unwrap();
    let ctx = DataContext::from_file(&p).expect("load context");
    assert_eq!(pagekit_core::resolve("{{site.name}}", &ctx), "Acme");

    let missing = dir.path().join("nope.json");
    assert!(matches!(DataContext::from_file(&missing), Err(Error::Io { .. })));
}

#[test]
fn prepare_save_builds_form_fields() {
    let mut nodes = well_formed();
    nodes.insert(
        "x".into(),
        json!({"data": {"displayName": "Button", "props": null}}),
    );
    let mut draft = pagekit_core::SaveDraft::new(" Landing page ", "7");
    draft.slug = Some("landing".into());
    let req = pagekit_core::prepare_save(&draft, &nodes, &StateKeys::default()).expect("prepare");
    assert_eq!(req.report().repaired_count(), 1);

    let fields = req.form_fields();
    let names: Vec<&str> = fields.iter().map(|(n, _)| *n).collect();
    assert_eq!(names, ["title", "category_id", "slug", "status", "updated_at", "content"]);
    assert_eq!(fields[0].1, "Landing page");
    assert_eq!(fields[3].1, "draft");
    let content: Value = serde_json::from_str(&fields[5].1).unwrap();
    assert_eq!(content["x"]["props"], json!({}));
}

#[test]
fn prepare_save_rejects_corrupt_state_and_keeps_dirty() {
    let nodes = node_map(json!({"a": {"id": "a"}}));
    let mut tracker = pagekit_core::UnsavedChanges::default();
    tracker.mark_dirty();
    tracker.begin_save().unwrap();
    let res = pagekit_core::prepare_save(
        &pagekit_core::SaveDraft::new("Home", "1"),
        &nodes,
        &StateKeys::default(),
    );
    tracker.finish_save(&res);
    assert!(matches!(res, Err(Error::UnrecoverableState { .. })));
    assert!(tracker.is_dirty());
}
