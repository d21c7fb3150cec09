use serde_yaml::Value;

/// Dotted paths of every key in `raw` that has no counterpart in `known`.
///
/// `known` is the full serialization of the typed document, so it carries every
/// field the schema accepts. Mappings are matched by key, sequences by index.
pub fn unknown_fields(raw: &Value, known: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect(raw, known, "", &mut found);
    found
}

fn collect(raw: &Value, known: &Value, prefix: &str, found: &mut Vec<String>) {
    match (raw, known) {
        (Value::Mapping(raw_map), Value::Mapping(known_map)) => {
            for (key, raw_value) in raw_map {
                let name = key_name(key);
                let path = if prefix.is_empty() {
                    name
                } else {
                    format!("{}.{}", prefix, name)
                };
                match known_map.get(key) {
                    Some(known_value) => collect(raw_value, known_value, &path, found),
                    None => found.push(path),
                }
            }
        }
        (Value::Sequence(raw_items), Value::Sequence(known_items)) => {
            for (i, (raw_item, known_item)) in raw_items.iter().zip(known_items).enumerate() {
                collect(raw_item, known_item, &format!("{}[{}]", prefix, i), found);
            }
        }
        (Value::Tagged(raw_tagged), _) => collect(&raw_tagged.value, known, prefix, found),
        _ => {}
    }
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_no_unknown_fields() {
        let raw = yaml("a: 1\nb: {c: 2}");
        let known = yaml("a: 1\nb: {c: 2, d: 3}");
        assert!(unknown_fields(&raw, &known).is_empty());
    }

    #[test]
    fn test_nested_unknown_fields() {
        let raw = yaml("spec:\n  columns:\n    - name: id\n      nullable: true\n  extra: x");
        let known = yaml("spec:\n  columns:\n    - name: id\n      type: ''\n");
        let found = unknown_fields(&raw, &known);
        assert_eq!(found, vec!["spec.columns[0].nullable", "spec.extra"]);
    }

    #[test]
    fn test_free_form_maps_accept_any_key() {
        let raw = yaml("properties: {owner: x}");
        let known = yaml("properties: {owner: x}");
        assert!(unknown_fields(&raw, &known).is_empty());
    }
}
