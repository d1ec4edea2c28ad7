use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Types that can be requested as schema-constrained model output.
///
/// Automatically implemented for any `JsonSchema + DeserializeOwned` type.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// JSON schema suitable for a model server's `format` field.
    ///
    /// The schema is closed: every object gets `additionalProperties: false`,
    /// every property is listed in `required`, and `$ref`s are inlined so the
    /// server never has to resolve definitions.
    fn format_schema() -> Value {
        let root = schema_for!(Self);
        let mut value = serde_json::to_value(root).unwrap_or_default();

        let definitions = match &mut value {
            Value::Object(map) => {
                map.remove("$schema");
                map.remove("title");
                map.remove("definitions")
            }
            _ => None,
        };
        let definitions = match definitions {
            Some(Value::Object(defs)) => defs,
            _ => Map::new(),
        };

        close_schema(&mut value, &definitions);
        value
    }

    fn type_name() -> String {
        <Self as JsonSchema>::schema_name()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

fn close_schema(value: &mut Value, definitions: &Map<String, Value>) {
    match value {
        Value::Object(map) => {
            if let Some(resolved) = resolve_ref(map, definitions) {
                *value = resolved;
                close_schema(value, definitions);
                return;
            }

            if map.get("type").and_then(Value::as_str) == Some("object") {
                map.insert("additionalProperties".into(), Value::Bool(false));
                if let Some(Value::Object(props)) = map.get("properties") {
                    let keys = props.keys().cloned().map(Value::String).collect();
                    map.insert("required".into(), Value::Array(keys));
                }
            }

            for child in map.values_mut() {
                close_schema(child, definitions);
            }
        }
        Value::Array(items) => {
            for item in items {
                close_schema(item, definitions);
            }
        }
        _ => {}
    }
}

/// Resolve `$ref` and single-element `allOf` wrappers to the referenced schema.
fn resolve_ref(map: &Map<String, Value>, definitions: &Map<String, Value>) -> Option<Value> {
    if let Some(Value::String(path)) = map.get("$ref") {
        let name = path.strip_prefix("#/definitions/")?;
        return definitions.get(name).cloned();
    }
    match map.get("allOf") {
        Some(Value::Array(all_of)) if all_of.len() == 1 => all_of.first().cloned(),
        _ => None,
    }
}
