// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Untrusted request payloads: a flat string-keyed map of primitives.
//! Typed accessors decode everything at the boundary so handlers only ever
//! see typed command structs, never the raw map.

use crate::errors::DomainError;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default)]
pub struct Payload {
    values: Map<String, Value>,
}

impl Payload {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            _ => Err(DomainError::validation("Request payload must be an object")),
        }
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Scalar as text: strings verbatim, numbers and bools rendered. Null
    /// and missing both read as `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.values.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(Value::Number(number)) => Some(number.to_string()),
            Some(Value::Bool(flag)) => Some(flag.to_string()),
            Some(_) => None,
        }
    }

    pub fn required_text(&self, key: &str) -> Result<String, DomainError> {
        self.text(key)
            .ok_or_else(|| DomainError::validation(format!("Missing required field '{}'", key)))
    }

    /// A positive integer id; zero, negative, and unparsable values are
    /// validation errors.
    pub fn required_id(&self, key: &str) -> Result<u64, DomainError> {
        let raw = self.required_text(key)?;
        match raw.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(id as u64),
            _ => Err(DomainError::validation(format!(
                "Field '{}' must be a positive id",
                key
            ))),
        }
    }

    pub fn usize_or(&self, key: &str, fallback: usize) -> usize {
        self.text(key)
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(fallback)
    }

    /// Id collections arrive either as a comma-joined string or a native
    /// array of scalars. Both decode to a de-duplicated, order-preserving
    /// list of positive ids; invalid entries are dropped silently.
    pub fn id_list(&self, key: &str) -> Vec<u64> {
        match self.values.get(key) {
            Some(value) => decode_id_list(value),
            None => Vec::new(),
        }
    }

    /// String collections: native array of strings, or a comma-joined
    /// string. Empty entries are dropped.
    pub fn text_list(&self, key: &str) -> Vec<String> {
        match self.values.get(key) {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|entry| match entry {
                    Value::String(text) => Some(text.clone()),
                    _ => None,
                })
                .filter(|text| !text.trim().is_empty())
                .collect(),
            Some(Value::String(joined)) => joined
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }
}

pub fn decode_id_list(value: &Value) -> Vec<u64> {
    let mut ids = Vec::new();
    let mut push = |id: i64| {
        if id > 0 && !ids.contains(&(id as u64)) {
            ids.push(id as u64);
        }
    };
    match value {
        Value::String(joined) => {
            for part in joined.split(',') {
                if let Ok(id) = part.trim().parse::<i64>() {
                    push(id);
                }
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                match entry {
                    Value::Number(number) => {
                        if let Some(id) = number.as_i64() {
                            push(id);
                        }
                    }
                    Value::String(text) => {
                        if let Ok(id) = text.trim().parse::<i64>() {
                            push(id);
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        Payload::from_value(value).expect("object payload")
    }

    #[test]
    fn rejects_non_object_payloads() {
        assert!(Payload::from_value(json!([1, 2])).is_err());
        assert!(Payload::from_value(json!("text")).is_err());
        assert!(Payload::from_value(json!({})).is_ok());
    }

    #[test]
    fn text_renders_scalars() {
        let p = payload(json!({"a": "x", "b": 7, "c": true, "d": null}));
        assert_eq!(p.text("a").as_deref(), Some("x"));
        assert_eq!(p.text("b").as_deref(), Some("7"));
        assert_eq!(p.text("c").as_deref(), Some("true"));
        assert_eq!(p.text("d"), None);
        assert_eq!(p.text("missing"), None);
    }

    #[test]
    fn required_id_rejects_non_positive() {
        let p = payload(json!({"id": "0", "neg": -4, "ok": 12}));
        assert!(p.required_id("id").is_err());
        assert!(p.required_id("neg").is_err());
        assert!(p.required_id("missing").is_err());
        assert_eq!(p.required_id("ok").unwrap(), 12);
    }

    #[test]
    fn id_list_comma_string_form() {
        let p = payload(json!({"ids": "3, 1,3,junk,0,-2, 8"}));
        assert_eq!(p.id_list("ids"), vec![3, 1, 8]);
    }

    #[test]
    fn id_list_native_array_form() {
        let p = payload(json!({"ids": [5, "6", 5, 0, -1, true]}));
        assert_eq!(p.id_list("ids"), vec![5, 6]);
        assert_eq!(p.id_list("missing"), Vec::<u64>::new());
    }

    #[test]
    fn text_list_both_forms() {
        let p = payload(json!({"a": "x, y ,", "b": ["m", "", " n "]}));
        assert_eq!(p.text_list("a"), vec!["x", "y"]);
        assert_eq!(p.text_list("b"), vec!["m", " n "]);
    }
}
