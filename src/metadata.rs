//! Schemaless per-entity metadata and the merge rule used when assembling a
//! deployment plan: deep-right-wins at the top level only, merged in the
//! order environment, namespace, artifact, then service or database
//! instance (design note: "Metadata merging is not recursive across
//! entities; no cycles in the data model").

use serde_json::{Map, Value};

/// A JSON object. Stored as `TEXT` in SQLite and decoded on read; `None`/
/// empty columns project to an empty object rather than null so callers
/// never need to special-case a missing metadata blob.
pub type Metadata = Map<String, Value>;

pub fn empty() -> Metadata {
    Map::new()
}

pub fn parse(text: &str) -> Metadata {
    if text.trim().is_empty() {
        return empty();
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => map,
        _ => empty(),
    }
}

pub fn to_text(metadata: &Metadata) -> String {
    serde_json::to_string(metadata).unwrap_or_else(|_| "{}".to_string())
}

/// Merges metadata layers in order, later layers overwriting earlier ones
/// at the top level only.
pub fn merge_layers(layers: &[&Metadata]) -> Metadata {
    let mut merged = empty();
    for layer in layers {
        for (k, v) in layer.iter() {
            merged.insert(k.clone(), v.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn obj(v: Value) -> Metadata {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[rstest]
    #[case::later_layer_overwrites_earlier(
        json!({"region": "us-east-1", "team": "platform"}),
        json!({"team": "checkout"}),
        "team",
        "checkout",
    )]
    #[case::non_conflicting_key_from_earliest_layer_survives(
        json!({"region": "us-east-1", "team": "platform"}),
        json!({"team": "checkout"}),
        "region",
        "us-east-1",
    )]
    #[case::last_of_three_overwrites_wins(
        json!({"region": "us-east-1"}),
        json!({"region": "us-west-1"}),
        "region",
        "us-west-1",
    )]
    fn merge_precedence_cases(#[case] first: Value, #[case] second: Value, #[case] key: &str, #[case] expected: &str) {
        let first = obj(first);
        let second = obj(second);
        let merged = merge_layers(&[&first, &second]);
        assert_eq!(merged.get(key).unwrap(), expected);
    }

    #[test]
    fn four_layer_environment_namespace_artifact_service_order() {
        let env = obj(json!({"region": "us-east-1", "team": "platform"}));
        let ns = obj(json!({"team": "checkout"}));
        let artifact = obj(json!({"kind": "service"}));
        let service = obj(json!({"region": "us-west-2"}));

        let merged = merge_layers(&[&env, &ns, &artifact, &service]);

        assert_eq!(merged.get("region").unwrap(), "us-west-2");
        assert_eq!(merged.get("team").unwrap(), "checkout");
        assert_eq!(merged.get("kind").unwrap(), "service");
    }

    #[test]
    fn empty_text_round_trips_to_empty_object() {
        let m = parse("");
        assert!(m.is_empty());
        assert_eq!(to_text(&m), "{}");
    }

    #[test]
    fn non_object_json_falls_back_to_empty() {
        assert!(parse("[1,2,3]").is_empty());
        assert!(parse("not json").is_empty());
    }
}
