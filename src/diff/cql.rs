//! CQL rendering of change statements.

use super::statement::ChangeStatement;
use crate::typed::{quote, PropertyValue, Scalar};

/// Renders `ALTER TABLE <table> WITH <p> = <v> AND ...;`.
pub fn render_statement(statement: &ChangeStatement) -> String {
    let assignments: Vec<String> = statement
        .payload
        .iter()
        .map(|(name, value)| format!("{} = {}", name, render_value(value, false)))
        .collect();
    format!("ALTER TABLE {} WITH {};", statement.table, assignments.join(" AND "))
}

/// Renders a property value as a CQL literal. Option maps are
/// `map<text, text>`, so scalars inside a map are always quoted.
pub fn render_value(value: &PropertyValue, in_map: bool) -> String {
    match value {
        PropertyValue::Scalar(s) => render_scalar(s, in_map),
        PropertyValue::List(items) => {
            let items: Vec<String> = items.iter().map(|s| render_scalar(s, in_map)).collect();
            format!("[{}]", items.join(", "))
        }
        PropertyValue::Map(m) => {
            let entries: Vec<String> = m
                .iter()
                .map(|(k, v)| format!("{}: {}", quote(k), render_value(v, true)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

fn render_scalar(scalar: &Scalar, as_text: bool) -> String {
    match scalar {
        Scalar::String(s) => quote(s),
        Scalar::Integer(i) if as_text => quote(&i.to_string()),
        Scalar::Integer(i) => i.to_string(),
        Scalar::Float(f) if as_text => quote(&f.to_string()),
        // Debug formatting keeps the decimal point on integral floats.
        Scalar::Float(f) => format!("{:?}", f),
        Scalar::Boolean(b) if as_text => quote(&b.to_string()),
        Scalar::Boolean(b) => b.to_string(),
        // Blob literals are never quoted, even as map values.
        Scalar::Blob(hex) => hex.clone(),
    }
}
