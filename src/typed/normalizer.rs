//! Normalization of raw property trees against a schema.

use once_cell::sync::Lazy;

use super::property_value::{PropertyTree, PropertyValue, Scalar};
use super::validation::{SchemaViolation, SchemaViolations};
use crate::fieldpath::Path;
use crate::schema::{
    cassandra_table_schema, MapType, PropertyDef, PropertyType, ScalarKind, Schema, SchemaError,
    TypeShape,
};
use crate::value::{Map, Value};

/// Normalizer turns raw property trees into PropertyTrees.
///
/// Desired and observed trees go through the same normalizer so that an
/// omitted property and its explicit default, or `"32"` and `32` for an
/// integer property, end up equal.
#[derive(Debug, Clone)]
pub struct Normalizer {
    schema: Schema,
    defaults: PropertyTree,
}

static BUILTIN: Lazy<Normalizer> = Lazy::new(|| {
    Normalizer::new(cassandra_table_schema().clone())
        .expect("built-in table schema defaults should coerce")
});

impl Normalizer {
    /// Creates a normalizer, checking the schema structure and that every
    /// declared default coerces to its declared kind.
    pub fn new(schema: Schema) -> Result<Normalizer, SchemaError> {
        schema.check_structure()?;

        let mut violations = SchemaViolations::new();
        let defaults = field_defaults(&schema.properties, &Path::new(), &mut violations);
        for def in &schema.properties {
            check_element_defaults(&def.property_type, &Path::property(def.name.clone()), &mut violations);
        }

        if let Some(first) = violations.into_iter().next() {
            return Err(SchemaError::InvalidDefault {
                path: first.path().cloned().unwrap_or_default(),
                reason: first.to_string(),
            });
        }

        Ok(Normalizer {
            schema,
            defaults: PropertyTree::from_map(defaults),
        })
    }

    /// Parses a YAML schema and creates a normalizer for it.
    pub fn from_yaml(schema_yaml: &str) -> Result<Normalizer, SchemaError> {
        Normalizer::new(Schema::from_yaml(schema_yaml)?)
    }

    /// Returns the normalizer for the built-in Cassandra table schema.
    pub fn builtin() -> &'static Normalizer {
        &BUILTIN
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the tree every table has when nothing is set.
    pub fn defaults(&self) -> &PropertyTree {
        &self.defaults
    }

    /// Returns the normalized default of a top-level property.
    pub fn default_for(&self, name: &str) -> Option<&PropertyValue> {
        self.defaults.get(name)
    }

    /// Returns false when the property must be reset with an explicit
    /// assignment of its default. Unknown names count as resettable.
    pub fn is_resettable(&self, name: &str) -> bool {
        self.schema.find_property(name).map_or(true, |p| p.resettable)
    }

    /// Normalizes a raw value, which must be a mapping of property names.
    pub fn normalize(&self, raw: &Value) -> Result<PropertyTree, SchemaViolations> {
        match raw {
            Value::Map(properties) => self.normalize_properties(properties),
            Value::Null => Ok(self.defaults.clone()),
            other => Err(SchemaViolations::from_violation(SchemaViolation::type_mismatch(
                Path::new(),
                "map",
                other.type_name(),
            ))),
        }
    }

    /// Normalizes a raw mapping of property names to raw values.
    ///
    /// The result starts as the default tree; every raw entry is coerced to
    /// its declared type and overwrites the default. All violations are
    /// collected before failing.
    pub fn normalize_properties(&self, raw: &Map) -> Result<PropertyTree, SchemaViolations> {
        let mut violations = SchemaViolations::new();
        let properties = overlay(
            self.defaults.as_map().clone(),
            raw,
            |name| self.schema.find_property(name),
            None,
            &Path::new(),
            &mut violations,
        );

        if violations.is_empty() {
            Ok(PropertyTree::from_map(properties))
        } else {
            Err(violations)
        }
    }
}

/// Normalizes `raw` against `schema`.
///
/// Builds a throwaway Normalizer; callers normalizing many trees should
/// keep one around instead.
pub fn normalize(raw: &Value, schema: &Schema) -> Result<PropertyTree, SchemaViolations> {
    let normalizer = Normalizer::new(schema.clone()).map_err(|e| {
        SchemaViolations::from_violation(SchemaViolation::InvalidSchema {
            message: e.to_string(),
        })
    })?;
    normalizer.normalize(raw)
}

/// Writes every raw entry over `base`. Keys are resolved with `lookup`,
/// falling back to `element_type` for open-ended maps.
fn overlay<'s>(
    mut base: Map<PropertyValue>,
    raw: &Map,
    lookup: impl Fn(&str) -> Option<&'s PropertyDef>,
    element_type: Option<&'s PropertyType>,
    parent: &Path,
    violations: &mut SchemaViolations,
) -> Map<PropertyValue> {
    for (key, value) in raw.iter() {
        let path = parent.with(key.clone());
        let property_type = match lookup(key) {
            Some(def) => &def.property_type,
            None => match element_type {
                Some(t) => t,
                None => {
                    violations.add(SchemaViolation::unknown_property(path));
                    continue;
                }
            },
        };

        // Null means "not set": whatever default is in place stays.
        if value.is_null() {
            continue;
        }

        if let Some(coerced) = coerce(value, property_type, &path, violations) {
            base.set(key.clone(), coerced);
        }
    }
    base
}

/// Builds the defaults of a list of fields, in declaration order. Fields
/// without a default are left out, except maps, which default to their own
/// field defaults.
fn field_defaults(
    fields: &[PropertyDef],
    parent: &Path,
    violations: &mut SchemaViolations,
) -> Map<PropertyValue> {
    let mut out = Map::new();
    for def in fields {
        let path = parent.with(def.name.clone());
        if let Some(value) = default_value(def, &path, violations) {
            out.set(def.name.clone(), value);
        }
    }
    out
}

fn default_value(
    def: &PropertyDef,
    path: &Path,
    violations: &mut SchemaViolations,
) -> Option<PropertyValue> {
    match def.default {
        Some(ref raw) if !raw.is_null() => coerce(raw, &def.property_type, path, violations),
        _ => match def.property_type.shape()? {
            TypeShape::Map(map) => Some(PropertyValue::Map(field_defaults(&map.fields, path, violations))),
            _ => None,
        },
    }
}

/// Open-ended map keys never appear in a default tree, so their sub-defaults
/// would otherwise go unchecked until first use.
fn check_element_defaults(property_type: &PropertyType, path: &Path, violations: &mut SchemaViolations) {
    let Some(TypeShape::Map(map)) = property_type.shape() else {
        return;
    };
    for field in &map.fields {
        check_element_defaults(&field.property_type, &path.with(field.name.clone()), violations);
    }
    if let Some(ref element_type) = map.element_type {
        let element_path = path.with("*");
        if let Some(TypeShape::Map(element_map)) = element_type.shape() {
            field_defaults(&element_map.fields, &element_path, violations);
        }
        check_element_defaults(element_type, &element_path, violations);
    }
}

fn coerce(
    raw: &Value,
    property_type: &PropertyType,
    path: &Path,
    violations: &mut SchemaViolations,
) -> Option<PropertyValue> {
    let Some(shape) = property_type.shape() else {
        violations.add(SchemaViolation::InvalidSchema {
            message: format!("{}: type declares no single shape", path),
        });
        return None;
    };

    match shape {
        TypeShape::Scalar(kind) => {
            match coerce_scalar(raw, kind, property_type.short_class_name, path) {
                Ok(scalar) => Some(PropertyValue::Scalar(scalar)),
                Err(v) => {
                    violations.add(v);
                    None
                }
            }
        }
        TypeShape::List(list) => {
            let Value::List(items) = raw else {
                violations.add(SchemaViolation::type_mismatch(path.clone(), "list", raw.type_name()));
                return None;
            };
            let mut out = Vec::with_capacity(items.len());
            let mut ok = true;
            for (i, item) in items.iter().enumerate() {
                match coerce_scalar(item, list.element_type, false, &path.with(i.to_string())) {
                    Ok(scalar) => out.push(scalar),
                    Err(v) => {
                        violations.add(v);
                        ok = false;
                    }
                }
            }
            ok.then_some(PropertyValue::List(out))
        }
        TypeShape::Map(map) => {
            let Value::Map(entries) = raw else {
                violations.add(SchemaViolation::type_mismatch(path.clone(), "map", raw.type_name()));
                return None;
            };
            Some(PropertyValue::Map(coerce_map(entries, map, path, violations)))
        }
    }
}

fn coerce_map(
    raw: &Map,
    map: &MapType,
    path: &Path,
    violations: &mut SchemaViolations,
) -> Map<PropertyValue> {
    let base = field_defaults(&map.fields, path, violations);
    overlay(
        base,
        raw,
        |name| map.find_field(name),
        map.element_type.as_deref(),
        path,
        violations,
    )
}

fn coerce_scalar(
    raw: &Value,
    kind: ScalarKind,
    short_class_name: bool,
    path: &Path,
) -> Result<Scalar, SchemaViolation> {
    let mismatch = || SchemaViolation::type_mismatch(path.clone(), kind.to_string(), raw.type_name());

    match kind {
        ScalarKind::String => {
            let text = match raw {
                Value::String(s) => s.clone(),
                Value::Int(i) => i.to_string(),
                Value::Float(f) => f.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return Err(mismatch()),
            };
            if short_class_name {
                Ok(Scalar::String(short_class(&text).to_string()))
            } else {
                Ok(Scalar::String(text))
            }
        }
        ScalarKind::Integer => match raw {
            Value::Int(i) => Ok(Scalar::Integer(*i)),
            Value::Float(f) => integral(*f)
                .map(Scalar::Integer)
                .ok_or_else(|| SchemaViolation::invalid_value(path.clone(), "not an integer")),
            Value::String(s) => {
                let text = s.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().and_then(integral))
                    .map(Scalar::Integer)
                    .ok_or_else(|| {
                        SchemaViolation::invalid_value(path.clone(), format!("'{}' is not an integer", s))
                    })
            }
            _ => Err(mismatch()),
        },
        ScalarKind::Float => {
            let f = match raw {
                Value::Float(f) => *f,
                Value::Int(i) => *i as f64,
                Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
                    SchemaViolation::invalid_value(path.clone(), format!("'{}' is not a number", s))
                })?,
                _ => return Err(mismatch()),
            };
            if f.is_finite() {
                Ok(Scalar::Float(f))
            } else {
                Err(SchemaViolation::invalid_value(path.clone(), "number must be finite"))
            }
        }
        ScalarKind::Boolean => match raw {
            Value::Bool(b) => Ok(Scalar::Boolean(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Scalar::Boolean(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Scalar::Boolean(false)),
            Value::String(s) => Err(SchemaViolation::invalid_value(
                path.clone(),
                format!("'{}' is not a boolean", s),
            )),
            _ => Err(mismatch()),
        },
        ScalarKind::Blob => match raw {
            Value::String(s) => blob_literal(s)
                .map(Scalar::Blob)
                .ok_or_else(|| SchemaViolation::invalid_value(path.clone(), format!("'{}' is not a 0x hex blob", s))),
            _ => Err(mismatch()),
        },
    }
}

/// Normalizes a `0x` hex literal to lowercase; None if `text` is not one.
fn blob_literal(text: &str) -> Option<String> {
    let text = text.trim();
    let digits = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))?;
    if digits.len() % 2 != 0 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("0x{}", digits.to_ascii_lowercase()))
}

/// Returns `f` as an i64 when it is finite, whole and in range.
fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

/// Returns the last dotted segment of a Java class name.
fn short_class(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
