//! Core schema elements and type definitions.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use crate::fieldpath::Path;
use crate::value::Value;

/// Schema is the list of properties a table recognizes.
///
/// Properties are indexed in a map before the first lookup so this type
/// should be considered immutable.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyDef>,

    #[serde(skip)]
    property_map: OnceCell<HashMap<String, usize>>,
}

impl Clone for Schema {
    fn clone(&self) -> Self {
        Schema {
            properties: self.properties.clone(),
            property_map: OnceCell::new(),
        }
    }
}

/// PropertyDef declares one property: its name, type, default and whether
/// the backing store can reset it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,

    #[serde(rename = "type")]
    pub property_type: PropertyType,

    /// Raw default value, None if the property has no default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// False when returning the property to its default has to be spelled
    /// out as an explicit assignment.
    #[serde(default = "default_resettable", skip_serializing_if = "is_true")]
    pub resettable: bool,
}

fn default_resettable() -> bool {
    true
}

fn is_true(b: &bool) -> bool {
    *b
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// PropertyType declares the shape of a property value.
/// Exactly one of `scalar`, `list` and `map` must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalar: Option<ScalarKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<MapType>,

    /// String scalars only: Java class names are reduced to their last
    /// dotted segment.
    #[serde(default, rename = "shortClassName", skip_serializing_if = "is_false")]
    pub short_class_name: bool,
}

/// ScalarKind is the declared type of a single scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Integer,
    Float,
    Boolean,
    /// Bytes, written as a `0x` hex literal.
    Blob,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Blob => "blob",
        };
        f.write_str(name)
    }
}

/// ListType is an ordered sequence of scalars of one kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListType {
    #[serde(rename = "elementType")]
    pub element_type: ScalarKind,
}

/// MapType is a nested mapping. Keys listed in `fields` carry their own type
/// and default; any other key is accepted only when `element_type` is set.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MapType {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<PropertyDef>,

    /// ElementType is the type of the map's open-ended keys.
    #[serde(default, rename = "elementType", skip_serializing_if = "Option::is_none")]
    pub element_type: Option<Box<PropertyType>>,

    #[serde(skip)]
    field_map: OnceCell<HashMap<String, usize>>,
}

impl Clone for MapType {
    fn clone(&self) -> Self {
        MapType {
            fields: self.fields.clone(),
            element_type: self.element_type.clone(),
            field_map: OnceCell::new(),
        }
    }
}

/// TypeShape is a borrowed view of whichever variant a PropertyType holds.
#[derive(Debug, Clone, Copy)]
pub enum TypeShape<'a> {
    Scalar(ScalarKind),
    List(&'a ListType),
    Map(&'a MapType),
}

/// SchemaError is returned for malformed schema definitions.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse schema: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{path}: property declared more than once")]
    DuplicateProperty { path: Path },

    #[error("{path}: invalid type: {reason}")]
    InvalidType { path: Path, reason: String },

    #[error("{path}: invalid default: {reason}")]
    InvalidDefault { path: Path, reason: String },
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Schema::default()
    }

    /// Creates a schema with the given property definitions.
    pub fn with_properties(properties: Vec<PropertyDef>) -> Self {
        Schema {
            properties,
            property_map: OnceCell::new(),
        }
    }

    /// Parses a schema from YAML and checks its structure.
    pub fn from_yaml(yaml: &str) -> Result<Schema, SchemaError> {
        let schema: Schema = serde_yaml::from_str(yaml)?;
        schema.check_structure()?;
        Ok(schema)
    }

    /// Serializes the schema to YAML.
    pub fn to_yaml(&self) -> Result<String, SchemaError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Returns the named PropertyDef, if it exists.
    pub fn find_property(&self, name: &str) -> Option<&PropertyDef> {
        let map = self.property_map.get_or_init(|| index_by_name(&self.properties));
        map.get(name).map(|&i| &self.properties[i])
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.name.as_str())
    }

    /// Checks that names are unique and every type declares exactly one
    /// shape. Defaults are checked when a Normalizer is built from the schema.
    pub fn check_structure(&self) -> Result<(), SchemaError> {
        check_defs(&self.properties, &Path::new())
    }
}

fn index_by_name(defs: &[PropertyDef]) -> HashMap<String, usize> {
    defs.iter()
        .enumerate()
        .map(|(i, d)| (d.name.clone(), i))
        .collect()
}

fn check_defs(defs: &[PropertyDef], parent: &Path) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for def in defs {
        let path = parent.with(def.name.clone());
        if !seen.insert(def.name.as_str()) {
            return Err(SchemaError::DuplicateProperty { path });
        }
        check_type(&def.property_type, &path)?;
    }
    Ok(())
}

fn check_type(property_type: &PropertyType, path: &Path) -> Result<(), SchemaError> {
    let shape = property_type.shape().ok_or_else(|| SchemaError::InvalidType {
        path: path.clone(),
        reason: "exactly one of scalar, list or map must be set".to_string(),
    })?;

    if property_type.short_class_name && !matches!(shape, TypeShape::Scalar(ScalarKind::String)) {
        return Err(SchemaError::InvalidType {
            path: path.clone(),
            reason: "shortClassName only applies to string scalars".to_string(),
        });
    }

    if let TypeShape::Map(map) = shape {
        check_defs(&map.fields, path)?;
        if let Some(ref element_type) = map.element_type {
            check_type(element_type, &path.with("*"))?;
        }
    }
    Ok(())
}

impl PropertyDef {
    /// Creates a resettable property without a default.
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        PropertyDef {
            name: name.into(),
            property_type,
            default: None,
            resettable: true,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn not_resettable(mut self) -> Self {
        self.resettable = false;
        self
    }
}

impl PropertyType {
    pub fn scalar(kind: ScalarKind) -> Self {
        PropertyType {
            scalar: Some(kind),
            ..Default::default()
        }
    }

    pub fn list(element_type: ScalarKind) -> Self {
        PropertyType {
            list: Some(ListType { element_type }),
            ..Default::default()
        }
    }

    pub fn map(map: MapType) -> Self {
        PropertyType {
            map: Some(map),
            ..Default::default()
        }
    }

    /// Marks a string scalar as holding Java class names.
    pub fn with_short_class_name(mut self) -> Self {
        self.short_class_name = true;
        self
    }

    /// Returns the declared shape, or None unless exactly one is set.
    pub fn shape(&self) -> Option<TypeShape<'_>> {
        match (&self.scalar, &self.list, &self.map) {
            (Some(kind), None, None) => Some(TypeShape::Scalar(*kind)),
            (None, Some(list), None) => Some(TypeShape::List(list)),
            (None, None, Some(map)) => Some(TypeShape::Map(map)),
            _ => None,
        }
    }
}

impl MapType {
    /// Creates a new empty MapType.
    pub fn new() -> Self {
        MapType::default()
    }

    /// Creates a new MapType with the given fields.
    pub fn with_fields(fields: Vec<PropertyDef>) -> Self {
        MapType {
            fields,
            ..Default::default()
        }
    }

    /// Accepts keys outside `fields`, typed as `element_type`.
    pub fn with_element_type(mut self, element_type: PropertyType) -> Self {
        self.element_type = Some(Box::new(element_type));
        self
    }

    /// Returns the referenced field, if it exists.
    pub fn find_field(&self, name: &str) -> Option<&PropertyDef> {
        let map = self.field_map.get_or_init(|| index_by_name(&self.fields));
        map.get(name).map(|&i| &self.fields[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_kind_serialization() {
        assert_eq!(serde_json::to_string(&ScalarKind::Integer).unwrap(), "\"integer\"");
        assert_eq!(serde_json::to_string(&ScalarKind::Boolean).unwrap(), "\"boolean\"");
        assert_eq!(ScalarKind::Float.to_string(), "float");
        assert_eq!(serde_yaml::from_str::<ScalarKind>("blob").unwrap(), ScalarKind::Blob);
    }

    #[test]
    fn test_schema_from_yaml() {
        let schema = Schema::from_yaml(
            r#"properties:
- name: gc_grace_seconds
  type:
    scalar: integer
  default: 864000
- name: compaction
  resettable: false
  type:
    map:
      fields:
      - name: class
        type:
          scalar: string
          shortClassName: true
        default: SizeTieredCompactionStrategy
      elementType:
        scalar: string
"#,
        )
        .unwrap();

        let gc = schema.find_property("gc_grace_seconds").unwrap();
        assert!(gc.resettable);
        assert_eq!(gc.default, Some(Value::Int(864000)));

        let compaction = schema.find_property("compaction").unwrap();
        assert!(!compaction.resettable);
        let Some(TypeShape::Map(map)) = compaction.property_type.shape() else {
            panic!("compaction should be a map");
        };
        assert!(map.find_field("class").unwrap().property_type.short_class_name);
        assert!(map.find_field("max_threshold").is_none());
        assert!(map.element_type.is_some());

        assert!(schema.find_property("nonexistent").is_none());
    }

    #[test]
    fn test_schema_rejects_duplicate_property() {
        let schema = Schema::with_properties(vec![
            PropertyDef::new("comment", PropertyType::scalar(ScalarKind::String)),
            PropertyDef::new("comment", PropertyType::scalar(ScalarKind::String)),
        ]);
        assert!(matches!(
            schema.check_structure(),
            Err(SchemaError::DuplicateProperty { .. })
        ));
    }

    #[test]
    fn test_schema_rejects_ambiguous_type() {
        let err = Schema::from_yaml(
            r#"properties:
- name: broken
  type:
    scalar: string
    list:
      elementType: string
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_schema_rejects_misplaced_short_class_name() {
        let schema = Schema::with_properties(vec![PropertyDef::new(
            "ttl",
            PropertyType::scalar(ScalarKind::Integer).with_short_class_name(),
        )]);
        assert!(matches!(
            schema.check_structure(),
            Err(SchemaError::InvalidType { .. })
        ));
    }

    #[test]
    fn test_schema_yaml_roundtrip() {
        let schema = Schema::with_properties(vec![
            PropertyDef::new("cdc", PropertyType::scalar(ScalarKind::Boolean)).with_default(false),
            PropertyDef::new(
                "caching",
                PropertyType::map(MapType::with_fields(vec![PropertyDef::new(
                    "keys",
                    PropertyType::scalar(ScalarKind::String),
                )
                .with_default("ALL")])),
            )
            .not_resettable(),
        ]);

        let yaml = schema.to_yaml().unwrap();
        let parsed = Schema::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.property_names().collect::<Vec<_>>(), vec!["cdc", "caching"]);
        assert!(!parsed.find_property("caching").unwrap().resettable);
    }
}
