//! Typed attribute values of the key-value store and their plain JSON form.
//!
//! On the wire every value is a single-key object whose key names the type:
//! `{"S": "text"}`, `{"N": "12.50"}`, `{"M": {...}}` and so on. Change records carry
//! item images in that form; `item_to_json` flattens them into ordinary JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::PipelineError;
use crate::result::Result;

/// A stored item: attribute name to typed value.
pub type Item = BTreeMap<String, AttributeValue>;

/// One typed value as the key-value store represents it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// String.
    S(String),
    /// Number, kept as its decimal string.
    N(String),
    /// Binary, base64 encoded.
    B(String),
    /// Boolean.
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Null marker; the flag is always `true` on the wire.
    #[serde(rename = "NULL")]
    Null(bool),
    /// Ordered list of values.
    L(Vec<AttributeValue>),
    /// Nested map.
    M(BTreeMap<String, AttributeValue>),
    /// String set.
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    /// Number set.
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    /// Binary set.
    #[serde(rename = "BS")]
    Bs(Vec<String>),
}

impl AttributeValue {
    /// Convert into plain JSON. Numbers become JSON floats.
    pub fn to_json(&self) -> Result<Value> {
        Ok(match self {
            AttributeValue::S(s) | AttributeValue::B(s) => Value::String(s.clone()),
            AttributeValue::N(n) => number_to_json(n)?,
            AttributeValue::Bool(b) => Value::Bool(*b),
            AttributeValue::Null(_) => Value::Null,
            AttributeValue::L(items) => Value::Array(
                items
                    .iter()
                    .map(AttributeValue::to_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            AttributeValue::M(fields) => {
                let mut out = Map::new();
                for (key, value) in fields {
                    out.insert(key.clone(), value.to_json()?);
                }
                Value::Object(out)
            }
            AttributeValue::Ss(values) | AttributeValue::Bs(values) => {
                Value::Array(values.iter().cloned().map(Value::String).collect())
            }
            AttributeValue::Ns(values) => Value::Array(
                values
                    .iter()
                    .map(|n| number_to_json(n))
                    .collect::<Result<Vec<_>>>()?,
            ),
        })
    }
}

fn number_to_json(raw: &str) -> Result<Value> {
    let parsed: f64 = raw
        .trim()
        .parse()
        .map_err(|_| PipelineError::Attribute(format!("N value is not numeric: {raw:?}")))?;
    Number::from_f64(parsed)
        .map(Value::Number)
        .ok_or_else(|| PipelineError::Attribute(format!("N value is not finite: {raw:?}")))
}

/// Convert one wire-form value to plain JSON.
///
/// Anything that is not a recognised type-tagged object is returned unchanged.
pub fn attribute_to_json(value: &Value) -> Result<Value> {
    match serde_json::from_value::<AttributeValue>(value.clone()) {
        Ok(typed) => typed.to_json(),
        Err(_) => Ok(value.clone()),
    }
}

/// Flatten a wire-form item image (attribute name to typed value) into a JSON object.
pub fn item_to_json(image: &Map<String, Value>) -> Result<Map<String, Value>> {
    let mut out = Map::with_capacity(image.len());
    for (key, value) in image {
        out.insert(key.clone(), attribute_to_json(value)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_form_is_type_tagged() {
        let value = AttributeValue::M(BTreeMap::from([
            ("flag".to_string(), AttributeValue::Bool(true)),
            ("none".to_string(), AttributeValue::Null(true)),
        ]));
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({"M": {"flag": {"BOOL": true}, "none": {"NULL": true}}})
        );
    }

    #[test]
    fn test_item_to_json_flattens_scalars() {
        let image = json!({
            "transaction_id": {"S": "abc"},
            "price": {"N": "2500.50"},
            "active": {"BOOL": false},
            "note": {"NULL": true}
        });
        let flat = item_to_json(image.as_object().unwrap()).unwrap();
        assert_eq!(flat["transaction_id"], json!("abc"));
        assert_eq!(flat["price"], json!(2500.5));
        assert_eq!(flat["active"], json!(false));
        assert_eq!(flat["note"], Value::Null);
    }

    #[test]
    fn test_item_to_json_recurses_into_lists_and_maps() {
        let image = json!({
            "tags": {"L": [{"S": "a"}, {"N": "2"}]},
            "meta": {"M": {"depth": {"N": "1"}, "inner": {"L": []}}},
            "ids": {"SS": ["x", "y"]},
            "sizes": {"NS": ["1", "2.5"]}
        });
        let flat = item_to_json(image.as_object().unwrap()).unwrap();
        assert_eq!(flat["tags"], json!(["a", 2.0]));
        assert_eq!(flat["meta"], json!({"depth": 1.0, "inner": []}));
        assert_eq!(flat["ids"], json!(["x", "y"]));
        assert_eq!(flat["sizes"], json!([1.0, 2.5]));
    }

    #[test]
    fn test_unknown_shape_passes_through() {
        let image = json!({"raw": {"X": 1}, "plain": 7});
        let flat = item_to_json(image.as_object().unwrap()).unwrap();
        assert_eq!(flat["raw"], json!({"X": 1}));
        assert_eq!(flat["plain"], json!(7));
    }

    #[test]
    fn test_non_numeric_n_is_an_error() {
        let image = json!({"price": {"N": "abc"}});
        let err = item_to_json(image.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, PipelineError::Attribute(_)));
    }
}
