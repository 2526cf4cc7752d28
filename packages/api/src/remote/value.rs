//! # Firestore value codec
//!
//! Firestore's REST API wraps every field in a typed envelope
//! (`{"stringValue": "..."}`, `{"integerValue": "42"}`, `{"mapValue": {"fields": ...}}`).
//! Records travel through the services as plain JSON, so documents are converted
//! at the edge:
//!
//! | JSON | Firestore |
//! |------|-----------|
//! | `null` | `nullValue` |
//! | `bool` | `booleanValue` |
//! | integer | `integerValue` (decimal string) |
//! | other number | `doubleValue` |
//! | string | `stringValue` |
//! | array | `arrayValue.values` |
//! | object | `mapValue.fields` |
//!
//! On the way back `timestampValue` and `referenceValue` decode to strings and
//! unknown envelopes decode to `null`.

use serde_json::{json, Map, Value};

use super::Fields;

/// Encode plain fields into Firestore's `fields` map.
pub fn encode_fields(fields: &Fields) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(key, value)| (key.clone(), encode(value)))
        .collect();
    Value::Object(encoded)
}

/// Decode Firestore's `fields` map into plain fields.
pub fn decode_fields(fields: &Value) -> Fields {
    match fields {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| (key.clone(), decode(value)))
            .collect(),
        _ => Fields::new(),
    }
}

pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn decode(value: &Value) -> Value {
    let Value::Object(envelope) = value else {
        return Value::Null;
    };
    let Some((kind, inner)) = envelope.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => match inner {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            Value::Number(n) => Value::Number(n.clone()),
            _ => Value::Null,
        },
        "doubleValue" => inner.as_f64().map(Value::from).unwrap_or(Value::Null),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode).collect())
                .unwrap_or_default();
            Value::Array(values)
        }
        "mapValue" => Value::Object(decode_fields(inner.get("fields").unwrap_or(&Value::Null))),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_project_fields() {
        let fields = json!({
            "title": "Eco-Center",
            "technologies": ["Revit", "Lumion"],
            "visible": true,
        });
        let Value::Object(fields) = fields else { unreachable!() };

        let encoded = encode_fields(&fields);
        assert_eq!(encoded["title"], json!({ "stringValue": "Eco-Center" }));
        assert_eq!(encoded["visible"], json!({ "booleanValue": true }));
        assert_eq!(
            encoded["technologies"],
            json!({ "arrayValue": { "values": [
                { "stringValue": "Revit" },
                { "stringValue": "Lumion" }
            ] } })
        );
    }

    #[test]
    fn test_integers_travel_as_strings() {
        assert_eq!(encode(&json!(42)), json!({ "integerValue": "42" }));
        assert_eq!(decode(&json!({ "integerValue": "42" })), json!(42));
        assert_eq!(encode(&json!(1.5)), json!({ "doubleValue": 1.5 }));
    }

    #[test]
    fn test_decode_document_from_rest_payload() {
        let payload = json!({
            "name": { "stringValue": "Ada" },
            "read": { "booleanValue": false },
            "date": { "timestampValue": "2024-05-01T10:00:00Z" },
            "meta": { "mapValue": { "fields": { "n": { "integerValue": "3" } } } },
            "empty": { "arrayValue": {} },
            "geo": { "geoPointValue": { "latitude": 1.0, "longitude": 2.0 } },
        });

        let decoded = decode_fields(&payload);
        assert_eq!(decoded["name"], "Ada");
        assert_eq!(decoded["read"], false);
        assert_eq!(decoded["date"], "2024-05-01T10:00:00Z");
        assert_eq!(decoded["meta"], json!({ "n": 3 }));
        assert_eq!(decoded["empty"], json!([]));
        assert_eq!(decoded["geo"], Value::Null);
    }
}
