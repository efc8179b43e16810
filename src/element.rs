//! Canvas element model mirrored into the replicated document.
//!
//! The rendering surface owns these records; the sync core only mirrors
//! them. An element carries a small set of fixed fields plus an open
//! string-keyed payload, because the editing surface is free to attach
//! whatever it needs (position, color, points, ...). Diffing treats the
//! payload as an unordered key/value bag.

use std::collections::BTreeMap;

use loro::LoroValue;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Key of the per-element revision counter inside the replicated map.
pub const VERSION_KEY: &str = "version";
/// Key of the element identity inside the replicated map.
pub const ID_KEY: &str = "id";
/// Key of the tombstone flag inside the replicated map.
pub const DELETED_KEY: &str = "deleted";

/// A scalar or structured payload value.
///
/// Structural equality (`PartialEq`) is what the change detector uses to
/// decide whether a field must be rewritten into the replicated map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Convert into the value form the replicated map stores.
    ///
    /// Compound values go through serde, which matches how the engine
    /// itself (de)serializes plain values.
    pub fn to_loro(&self) -> LoroValue {
        match self {
            FieldValue::Null => LoroValue::Null,
            FieldValue::Bool(b) => (*b).into(),
            FieldValue::Int(i) => (*i).into(),
            FieldValue::Double(d) => (*d).into(),
            FieldValue::Str(s) => s.as_str().into(),
            compound => serde_json::to_value(compound)
                .ok()
                .and_then(|json| serde_json::from_value::<LoroValue>(json).ok())
                .unwrap_or_else(|| {
                    log::warn!("unrepresentable payload value, storing null");
                    LoroValue::Null
                }),
        }
    }

    /// Rebuild a payload value from a materialized replicated value.
    pub fn from_loro(value: &LoroValue) -> FieldValue {
        match value {
            LoroValue::Null => FieldValue::Null,
            LoroValue::Bool(b) => FieldValue::Bool(*b),
            LoroValue::I64(i) => FieldValue::Int(*i),
            LoroValue::Double(d) => FieldValue::Double(*d),
            LoroValue::String(s) => FieldValue::Str(s.to_string()),
            LoroValue::List(items) => {
                FieldValue::List(items.iter().map(FieldValue::from_loro).collect())
            }
            LoroValue::Map(entries) => FieldValue::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), FieldValue::from_loro(v)))
                    .collect(),
            ),
            // Binary payloads and nested containers never originate from
            // the rendering surface; flatten them to null rather than
            // inventing a lossy mapping.
            _ => FieldValue::Null,
        }
    }

    /// Structural equality against a materialized replicated value.
    pub fn matches_loro(&self, value: &LoroValue) -> bool {
        match (self, value) {
            (FieldValue::Null, LoroValue::Null) => true,
            (FieldValue::Bool(a), LoroValue::Bool(b)) => a == b,
            (FieldValue::Int(a), LoroValue::I64(b)) => a == b,
            (FieldValue::Double(a), LoroValue::Double(b)) => a == b,
            (FieldValue::Str(a), LoroValue::String(b)) => a.as_str() == b.as_ref(),
            (FieldValue::List(a), LoroValue::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.matches_loro(y))
            }
            (FieldValue::Map(a), LoroValue::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| v.matches_loro(other)))
            }
            _ => false,
        }
    }
}

/// One record of the rendering surface's element list.
///
/// `version` must strictly increase on every payload mutation made by the
/// surface; the change detector relies on that to skip untouched elements
/// and the coordinator sums it for its dirty check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub version: i64,
    #[serde(default)]
    pub deleted: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, FieldValue>,
}

impl Element {
    /// Create a fresh element with a random identity at version 1.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            version: 1,
            deleted: false,
            extra: BTreeMap::new(),
        }
    }

    /// Set a payload field and bump the revision counter.
    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) -> &mut Self {
        self.extra.insert(key.into(), value);
        self.version += 1;
        self
    }

    /// Mark the element deleted and bump the revision counter.
    pub fn mark_deleted(&mut self) {
        self.deleted = true;
        self.version += 1;
    }

    /// Every field of this element as (key, value) pairs, fixed fields
    /// included, in the shape the replicated map stores them.
    pub fn fields(&self) -> Vec<(&str, FieldValue)> {
        let mut fields = vec![
            (ID_KEY, FieldValue::Str(self.id.clone())),
            (VERSION_KEY, FieldValue::Int(self.version)),
            (DELETED_KEY, FieldValue::Bool(self.deleted)),
        ];
        for (key, value) in &self.extra {
            fields.push((key.as_str(), value.clone()));
        }
        fields
    }

    /// Rebuild an element from one materialized replicated map value.
    /// Returns `None` when the value is not a map.
    pub fn from_loro(value: &LoroValue) -> Option<Element> {
        let LoroValue::Map(entries) = value else {
            return None;
        };
        let mut element = Element {
            id: String::new(),
            version: 0,
            deleted: false,
            extra: BTreeMap::new(),
        };
        for (key, value) in entries.iter() {
            match key.as_str() {
                ID_KEY => {
                    if let LoroValue::String(s) = value {
                        element.id = s.to_string();
                    }
                }
                VERSION_KEY => {
                    if let LoroValue::I64(v) = value {
                        element.version = *v;
                    }
                }
                DELETED_KEY => {
                    if let LoroValue::Bool(b) = value {
                        element.deleted = *b;
                    }
                }
                _ => {
                    element
                        .extra
                        .insert(key.clone(), FieldValue::from_loro(value));
                }
            }
        }
        Some(element)
    }
}

impl Default for Element {
    fn default() -> Self {
        Self::new()
    }
}

/// Sum of every element's revision counter.
///
/// This is the coordinator's cheap dirty check for telling user edits
/// apart from the surface's own programmatic scene updates. It can
/// collide; that approximation is accepted.
pub fn version_aggregate(elements: &[Element]) -> i64 {
    elements.iter().map(|e| e.version).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_element_has_identity_and_version() {
        let a = Element::new();
        let b = Element::new();
        assert_eq!(a.version, 1);
        assert!(!a.deleted);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_set_bumps_version() {
        let mut e = Element::new();
        e.set("x", FieldValue::Double(10.0));
        e.set("x", FieldValue::Double(20.0));
        assert_eq!(e.version, 3);
        assert_eq!(e.extra.get("x"), Some(&FieldValue::Double(20.0)));
    }

    #[test]
    fn test_version_aggregate_sums() {
        let mut a = Element::new();
        let mut b = Element::new();
        a.set("x", FieldValue::Double(1.0)); // version 2
        b.set("x", FieldValue::Double(2.0));
        b.set("y", FieldValue::Double(3.0)); // version 3
        assert_eq!(version_aggregate(&[a, b]), 5);
        assert_eq!(version_aggregate(&[]), 0);
    }

    #[test]
    fn test_fields_include_fixed_fields() {
        let mut e = Element::new();
        e.set("color", FieldValue::Str("red".into()));
        let fields = e.fields();
        let keys: Vec<&str> = fields.iter().map(|(k, _)| *k).collect();
        assert!(keys.contains(&ID_KEY));
        assert!(keys.contains(&VERSION_KEY));
        assert!(keys.contains(&DELETED_KEY));
        assert!(keys.contains(&"color"));
    }

    #[test]
    fn test_field_value_structural_equality() {
        let a = FieldValue::List(vec![FieldValue::Double(1.0), FieldValue::Double(2.0)]);
        let b = FieldValue::List(vec![FieldValue::Double(1.0), FieldValue::Double(2.0)]);
        let c = FieldValue::List(vec![FieldValue::Double(1.0)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_scalar_loro_roundtrip() {
        for v in [
            FieldValue::Null,
            FieldValue::Bool(true),
            FieldValue::Int(42),
            FieldValue::Double(3.5),
            FieldValue::Str("hi".into()),
        ] {
            let loro = v.to_loro();
            assert!(v.matches_loro(&loro));
            assert_eq!(FieldValue::from_loro(&loro), v);
        }
    }

    #[test]
    fn test_element_json_shape() {
        // The surface hands elements over as flat JSON objects.
        let json = r#"{"id":"e1","version":3,"x":10.0,"locked":false}"#;
        let e: Element = serde_json::from_str(json).unwrap();
        assert_eq!(e.id, "e1");
        assert_eq!(e.version, 3);
        assert!(!e.deleted);
        assert_eq!(e.extra.get("x"), Some(&FieldValue::Double(10.0)));
        assert_eq!(e.extra.get("locked"), Some(&FieldValue::Bool(false)));
    }
}
