// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Input schema sanitation
//!
//! LLM providers reject a few shapes that MCP servers routinely emit: empty
//! `properties`, free-form objects without `additionalProperties`, and arrays
//! with `items: {}`. Every step returns a new value.

use serde_json::{Map, Value};

/// Sanitized schema plus the credential parameter that was removed, if any
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedSchema {
    pub schema: Value,
    pub stripped: Option<String>,
}

/// Run every sanitation step in order.
pub fn sanitize_schema(schema: &Value, credential_param: Option<&str>) -> SanitizedSchema {
    let schema = remove_empty_properties(schema);
    let schema = fix_property_shapes(&schema);
    let (schema, stripped) = match credential_param {
        Some(param) => strip_param(&schema, param),
        None => (schema, None),
    };
    SanitizedSchema {
        schema: remove_empty_properties(&schema),
        stripped,
    }
}

/// Drop a `properties` object with no entries.
pub fn remove_empty_properties(schema: &Value) -> Value {
    let mut schema = schema.clone();
    if let Some(object) = schema.as_object_mut() {
        let empty = object
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(Map::is_empty);
        if empty {
            object.remove("properties");
        }
    }
    schema
}

/// Give free-form object properties `additionalProperties: true` and drop
/// empty array `items`.
pub fn fix_property_shapes(schema: &Value) -> Value {
    let mut schema = schema.clone();
    let Some(properties) = schema
        .get_mut("properties")
        .and_then(Value::as_object_mut)
    else {
        return schema;
    };

    for property in properties.values_mut() {
        let Some(property) = property.as_object_mut() else {
            continue;
        };
        match property.get("type").and_then(Value::as_str) {
            Some("object") => {
                if !property.contains_key("properties")
                    && !property.contains_key("additionalProperties")
                {
                    property.insert("additionalProperties".to_string(), Value::Bool(true));
                }
            }
            Some("array") => {
                let empty_items = property
                    .get("items")
                    .and_then(Value::as_object)
                    .is_some_and(Map::is_empty);
                if empty_items {
                    property.remove("items");
                }
            }
            _ => {}
        }
    }
    schema
}

/// Remove `param` from `properties` and `required`. An emptied `required`
/// is removed. Returns the param name if it was present.
pub fn strip_param(schema: &Value, param: &str) -> (Value, Option<String>) {
    let mut schema = schema.clone();
    let Some(object) = schema.as_object_mut() else {
        return (schema, None);
    };

    let removed = object
        .get_mut("properties")
        .and_then(Value::as_object_mut)
        .and_then(|properties| properties.remove(param))
        .is_some();

    let mut drop_required = false;
    if let Some(required) = object.get_mut("required").and_then(Value::as_array_mut) {
        required.retain(|name| name.as_str() != Some(param));
        drop_required = required.is_empty();
    }
    if drop_required {
        object.remove("required");
    }

    (schema, removed.then(|| param.to_string()))
}
