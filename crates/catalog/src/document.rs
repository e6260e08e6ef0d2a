//! Accessors over raw catalog documents.
//!
//! Catalog and capability documents are open-ended JSON merged from
//! heterogeneous upstream services, so descriptions stay `serde_json::Value`
//! with typed accessors rather than a closed struct. Field names follow the
//! wire format: `Layer` holds the ordered child sequence, `nm_ext_type`
//! discriminates import payloads.

use serde_json::Value;

pub const LAYER_FIELD: &str = "Layer";
pub const EXT_TYPE_FIELD: &str = "nm_ext_type";
pub const SERVICES_FIELD: &str = "services";

pub fn name(description: &Value) -> Option<&str> {
    description.get("name").and_then(Value::as_str)
}

pub fn title(description: &Value) -> Option<&str> {
    description.get("Title").and_then(Value::as_str)
}

/// A description's own URL. Deliberately does not fall back to `base_url`:
/// a layer without one gets a feature URL composed from its service base
/// instead.
pub fn url(description: &Value) -> Option<&str> {
    description.get("url").and_then(Value::as_str)
}

pub fn base_url(description: &Value) -> Option<&str> {
    description.get("base_url").and_then(Value::as_str)
}

pub fn service_type(description: &Value) -> Option<&str> {
    description.get("type").and_then(Value::as_str)
}

pub fn proxy(description: &Value) -> bool {
    description
        .get("proxy")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

pub fn ext_type(description: &Value) -> Option<&str> {
    description.get(EXT_TYPE_FIELD).and_then(Value::as_str)
}

pub fn layers(description: &Value) -> Option<&Vec<Value>> {
    description.get(LAYER_FIELD).and_then(Value::as_array)
}

pub fn services(description: &Value) -> Option<&Vec<Value>> {
    description.get(SERVICES_FIELD).and_then(Value::as_array)
}

pub fn has_child_layers(description: &Value) -> bool {
    layers(description).is_some_and(|l| !l.is_empty())
}

/// A coordinate that upstream services encode as either a number or a
/// numeric string.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Merge `incoming` into `target` in place.
///
/// Objects merge key-by-key recursively; any non-object value (arrays
/// included) replaces the target's. Merging a document into itself changes
/// nothing, which is what makes re-imports idempotent.
pub fn deep_merge(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, incoming) => *target = incoming.clone(),
    }
}

/// Combine a child description with its parent's: the child's fields win and
/// the parent fills in the rest. The parent's child list and import
/// discriminator never carry over, so an inherited description cannot look
/// like a category.
pub fn inherit(child: &Value, parent: &Value) -> Value {
    let (Value::Object(child_map), Value::Object(parent_map)) = (child, parent) else {
        return child.clone();
    };

    let mut merged = child_map.clone();
    for (key, value) in parent_map {
        if key == LAYER_FIELD || key == EXT_TYPE_FIELD {
            continue;
        }
        merged.entry(key.clone()).or_insert_with(|| value.clone());
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::{as_f64, deep_merge, inherit, name, proxy, title, url};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn url_never_falls_back_to_the_service_base() {
        let d = json!({"url": "http://a", "base_url": "http://b"});
        assert_eq!(url(&d), Some("http://a"));
        let d = json!({"base_url": "http://b"});
        assert_eq!(url(&d), None);
    }

    #[test]
    fn accessors_tolerate_missing_fields() {
        let d = json!({});
        assert_eq!(name(&d), None);
        assert_eq!(title(&d), None);
        assert!(!proxy(&d));
    }

    #[test]
    fn as_f64_accepts_numbers_and_numeric_strings() {
        assert_eq!(as_f64(&json!(1.5)), Some(1.5));
        assert_eq!(as_f64(&json!("  -10.25 ")), Some(-10.25));
        assert_eq!(as_f64(&json!("north")), None);
        assert_eq!(as_f64(&json!(null)), None);
    }

    #[test]
    fn deep_merge_recurses_into_objects_and_replaces_arrays() {
        let mut target = json!({
            "name": "Topography",
            "meta": {"keep": 1, "replace": 2},
            "Layer": [{"name": "old"}]
        });
        let incoming = json!({
            "meta": {"replace": 3, "add": 4},
            "Layer": [{"name": "new"}]
        });
        deep_merge(&mut target, &incoming);
        assert_eq!(
            target,
            json!({
                "name": "Topography",
                "meta": {"keep": 1, "replace": 3, "add": 4},
                "Layer": [{"name": "new"}]
            })
        );
    }

    #[test]
    fn deep_merge_is_idempotent() {
        let mut target = json!({"name": "a", "meta": {"x": 1}});
        let copy = target.clone();
        deep_merge(&mut target, &copy.clone());
        assert_eq!(target, copy);
    }

    #[test]
    fn inherit_fills_gaps_but_never_copies_child_lists() {
        let parent = json!({
            "name": "Hydrography",
            "base_url": "http://example.org/wfs",
            "type": "WFS",
            "proxy": true,
            "Layer": [{"name": "rivers"}]
        });
        let child = json!({"name": "rivers"});
        let merged = inherit(&child, &parent);
        assert_eq!(
            merged,
            json!({
                "name": "rivers",
                "base_url": "http://example.org/wfs",
                "type": "WFS",
                "proxy": true
            })
        );
    }
}
