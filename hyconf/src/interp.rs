//! `${section:key}` references, substituted when a value is assigned.

use crate::literal::key_segments;
use crate::options::DEFAULT_SECTION;
use crate::tree::PropertyTree;
use crate::value::Value;
use tracing::trace;

/// Substitutes every `${...}` reference in the scalars of `value`.
///
/// A scalar that consists of a single reference takes the referenced value
/// whole, so `${servers}` copies a list or table. References to keys that do
/// not exist (yet) become empty text.
pub(crate) fn interpolate(value: Value, tree: &PropertyTree) -> Value {
    match value {
        Value::Scalar(text) if text.contains("${") => interpolate_scalar(&text, tree),
        Value::List(items) => Value::List(items.into_iter().map(|item| interpolate(item, tree)).collect()),
        Value::Table(table) => Value::Table(
            table
                .into_iter()
                .map(|(key, item)| (key, interpolate(item, tree)))
                .collect(),
        ),
        other => other,
    }
}

fn interpolate_scalar(text: &str, tree: &PropertyTree) -> Value {
    if let Some(reference) = whole_reference(text.trim()) {
        return resolve(reference, tree).unwrap_or_default();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return Value::Scalar(out);
        };

        match resolve(&after[..end], tree) {
            Some(Value::Scalar(s)) => out.push_str(&s),
            Some(other) => trace!(reference = &after[..end], kind = other.kind_name(), "non-scalar reference inside text"),
            None => {}
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    Value::Scalar(out)
}

fn whole_reference(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("${")?.strip_suffix('}')?;
    (!inner.contains('}')).then_some(inner)
}

/// Looks up `section:key` or `key` (in the default section).
fn resolve(reference: &str, tree: &PropertyTree) -> Option<Value> {
    let reference = reference.trim();
    let (section, key) = match reference.split_once(':') {
        Some((section, key)) if !section.trim().is_empty() => (section.trim(), key.trim()),
        Some((_, key)) => (DEFAULT_SECTION, key.trim()),
        None => (DEFAULT_SECTION, reference),
    };

    let value = tree.lookup_path(section, &key_segments(key));
    if value.is_none() {
        trace!(section, key, "unresolved reference");
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> PropertyTree {
        let mut tree = PropertyTree::new();
        tree.assign(DEFAULT_SECTION, &[], &["host".to_string()], Value::from("db.local"));
        tree.assign("paths", &[], &["root".to_string()], Value::from("/srv"));
        tree.assign(DEFAULT_SECTION, &[], &["ports".to_string()], Value::from(vec!["1", "2"]));
        tree
    }

    #[test]
    fn substitutes_each_reference() {
        let value = interpolate(Value::from("${paths:root}/${host}/${paths:root}"), &tree());
        assert_eq!(value, Value::from("/srv/db.local//srv"));
    }

    #[test]
    fn missing_reference_is_empty() {
        let value = interpolate(Value::from("x${nope}y"), &tree());
        assert_eq!(value, Value::from("xy"));
    }

    #[test]
    fn whole_reference_copies_collections() {
        let value = interpolate(Value::from("${ports}"), &tree());
        assert_eq!(value, Value::from(vec!["1", "2"]));
    }

    #[test]
    fn unterminated_reference_is_kept() {
        let value = interpolate(Value::from("a ${host"), &tree());
        assert_eq!(value, Value::from("a ${host"));
    }
}
