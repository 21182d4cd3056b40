use hyconf::{from_str_with_options, Document, LoadOptions, Syntax, Value};
use serde_json::json;

fn parse_yaml(input: &str) -> Document {
    from_str_with_options(input, &LoadOptions::new().with_syntax(Syntax::Yaml)).unwrap()
}

fn as_json(doc: &Document) -> serde_json::Value {
    serde_json::to_value(doc).unwrap()
}

#[test]
fn test_item_tables_with_nested_sequences() {
    let doc = parse_yaml(
        "jobs:\n  - name: build\n    steps:\n      - checkout\n      - compile\n  - name: test\n    steps: [run]\n",
    );

    assert_eq!(
        as_json(&doc),
        json!({
            "default": {
                "jobs": [
                    { "name": "build", "steps": ["checkout", "compile"] },
                    { "name": "test", "steps": ["run"] }
                ]
            }
        })
    );
}

#[test]
fn test_block_scalar_inside_item_table() {
    let doc = parse_yaml("jobs:\n  - name: build\n    run: |\n      make\n      make test\n  - name: lint\n");

    assert_eq!(doc.get_string("jobs.0.run", None), "make\nmake test");
    assert_eq!(doc.get_string("jobs.1.name", None), "lint");
}

#[test]
fn test_flow_collection_across_lines() {
    let doc = parse_yaml("ports: [\n  80,   # http\n  443\n]\nnext: 1\n");

    assert_eq!(doc.get("ports", None), Some(Value::from(vec!["80", "443"])));
    assert_eq!(doc.get_int("next", None), 1);
}

#[test]
fn test_dedent_closes_nested_maps() {
    let doc = parse_yaml("a:\n  b:\n    c: 1\n  d: 2\ne: 3\n");

    assert_eq!(
        as_json(&doc),
        json!({ "default": { "a": { "b": { "c": "1" }, "d": "2" }, "e": "3" } })
    );
}

#[test]
fn test_empty_key_is_an_empty_table() {
    let doc = parse_yaml("empty:\nnext: x\n");
    assert_eq!(as_json(&doc), json!({ "default": { "empty": {}, "next": "x" } }));
}

#[test]
fn test_quoted_values_keep_comment_markers() {
    let doc = parse_yaml("a: \"# not a comment\"\nb: 'x; y'\nc: plain # comment\n");

    assert_eq!(doc.get_string("a", None), "# not a comment");
    assert_eq!(doc.get_string("b", None), "x; y");
    assert_eq!(doc.get_string("c", None), "plain");
}

#[test]
fn test_root_sequence_items_are_ignored() {
    let doc = parse_yaml("- a\n- b\nkey: v\n");
    assert_eq!(as_json(&doc), json!({ "default": { "key": "v" } }));
}

#[test]
fn test_references_into_nested_maps() {
    let doc = parse_yaml("paths:\n  root: /srv\nlogs: ${paths.root}/logs\nall: ${paths}\n");

    assert_eq!(doc.get_string("logs", None), "/srv/logs");
    assert_eq!(doc.get("all.root", None), Some(Value::from("/srv")));
}
