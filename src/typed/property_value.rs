//! Typed property values and property trees.

use serde::Serialize;
use std::fmt;

use crate::schema::ScalarKind;
use crate::value::{Map, Value};

/// Scalar is a single value already coerced to its declared kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// Lowercase hex literal including the `0x` prefix.
    Blob(String),
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::String(_) => ScalarKind::String,
            Scalar::Integer(_) => ScalarKind::Integer,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Boolean(_) => ScalarKind::Boolean,
            Scalar::Blob(_) => ScalarKind::Blob,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    /// Converts back to the raw value in its natural typed form.
    pub fn to_value(&self) -> Value {
        match self {
            Scalar::String(s) => Value::String(s.clone()),
            Scalar::Integer(i) => Value::Int(*i),
            Scalar::Float(f) => Value::Float(*f),
            Scalar::Boolean(b) => Value::Bool(*b),
            Scalar::Blob(hex) => Value::String(hex.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => f.write_str(&quote(s)),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(v) => write!(f, "{:?}", v),
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::Blob(hex) => f.write_str(hex),
        }
    }
}

/// Quotes a string as a CQL text literal, doubling embedded quotes.
pub(crate) fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// PropertyValue is the typed value of one property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
    Map(Map<PropertyValue>),
}

impl PropertyValue {
    pub fn string(s: impl Into<String>) -> Self {
        PropertyValue::Scalar(Scalar::String(s.into()))
    }

    pub fn integer(i: i64) -> Self {
        PropertyValue::Scalar(Scalar::Integer(i))
    }

    pub fn float(f: f64) -> Self {
        PropertyValue::Scalar(Scalar::Float(f))
    }

    pub fn boolean(b: bool) -> Self {
        PropertyValue::Scalar(Scalar::Boolean(b))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            PropertyValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Scalar]> {
        match self {
            PropertyValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map<PropertyValue>> {
        match self {
            PropertyValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Converts back to the raw value in its natural typed form, keeping map
    /// insertion order.
    pub fn to_value(&self) -> Value {
        match self {
            PropertyValue::Scalar(s) => s.to_value(),
            PropertyValue::List(items) => Value::List(items.iter().map(Scalar::to_value).collect()),
            PropertyValue::Map(m) => Value::Map(
                m.iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Scalar(s) => write!(f, "{}", s),
            PropertyValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            PropertyValue::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// PropertyTree is the normalized property set of one table.
///
/// Trees are only built by the normalizer; once built they are read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PropertyTree {
    properties: Map<PropertyValue>,
}

impl PropertyTree {
    pub(crate) fn from_map(properties: Map<PropertyValue>) -> Self {
        PropertyTree { properties }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.has(name)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.properties.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.properties.keys()
    }

    pub fn as_map(&self) -> &Map<PropertyValue> {
        &self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caching(keys: &str, rows: &str) -> PropertyValue {
        let mut m = Map::new();
        m.set("keys", PropertyValue::string(keys));
        m.set("rows_per_partition", PropertyValue::string(rows));
        PropertyValue::Map(m)
    }

    #[test]
    fn test_scalar_equality_is_typed() {
        assert_eq!(PropertyValue::integer(32), PropertyValue::integer(32));
        assert_ne!(PropertyValue::integer(32), PropertyValue::string("32"));
        assert_ne!(PropertyValue::float(1.0), PropertyValue::integer(1));
    }

    #[test]
    fn test_to_value_keeps_natural_types() {
        assert_eq!(PropertyValue::integer(7).to_value(), Value::Int(7));
        assert_eq!(PropertyValue::boolean(true).to_value(), Value::Bool(true));

        let raw = caching("ALL", "NONE").to_value();
        let map = raw.as_map().unwrap();
        assert_eq!(map.keys().cloned().collect::<Vec<_>>(), vec!["keys", "rows_per_partition"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(caching("ALL", "100").to_string(), "{keys: 'ALL', rows_per_partition: '100'}");
        assert_eq!(PropertyValue::float(1.0).to_string(), "1.0");
        assert_eq!(
            PropertyValue::List(vec![Scalar::String("a".into()), Scalar::String("b".into())]).to_string(),
            "['a', 'b']"
        );
    }

    #[test]
    fn test_display_doubles_quotes() {
        assert_eq!(PropertyValue::string("it's").to_string(), "'it''s'");
        let mut m = Map::new();
        m.set("owner", PropertyValue::string("o'brien"));
        assert_eq!(PropertyValue::Map(m).to_string(), "{owner: 'o''brien'}");
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&caching("ALL", "100")).unwrap();
        assert_eq!(json, r#"{"keys":"ALL","rows_per_partition":"100"}"#);
    }
}
