use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use zeroapp_fiql::ComparisonOp;

/// Declared scalar type of an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Integer,
    Float,
    Text,
    Boolean,
    Date,
    DateTime,
}

impl FieldType {
    /// Whether a comparison operator is valid for this field type.
    ///
    /// This table is the single source of truth for `UnsupportedOperator`
    /// decisions: numeric and date/time types take all six operators, text
    /// takes all six with lexicographic ordering, booleans take only
    /// equality and inequality.
    pub fn supports(&self, op: ComparisonOp) -> bool {
        match self {
            FieldType::Integer | FieldType::Float | FieldType::Date | FieldType::DateTime => true,
            FieldType::Text => true,
            FieldType::Boolean => !op.is_ordering(),
        }
    }

    /// Whether a JSON value written through the API fits this field type.
    /// `null` is always accepted; every field is nullable. This mirrors the
    /// filter-value coercion rules, so anything a write stores can later be
    /// filtered and sorted on without failing a cast in the database.
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            FieldType::Integer => value.as_i64().is_some(),
            FieldType::Float => value.as_f64().is_some(),
            FieldType::Text => value.is_string(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Date => value
                .as_str()
                .is_some_and(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()),
            FieldType::DateTime => value.as_str().is_some_and(|s| parse_datetime(s).is_some()),
        }
    }

    /// JSON-Schema style type/format pair for the introspection endpoint.
    fn json_schema_type(&self) -> (&'static str, Option<&'static str>) {
        match self {
            FieldType::Integer => ("integer", None),
            FieldType::Float => ("number", None),
            FieldType::Text => ("string", None),
            FieldType::Boolean => ("boolean", None),
            FieldType::Date => ("string", Some("date")),
            FieldType::DateTime => ("string", Some("date-time")),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Text => "text",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// RFC 3339, or a bare `%Y-%m-%dT%H:%M:%S` assumed to be UTC. Shared by
/// filter-value coercion and write-body validation.
pub(crate) fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// A single field declaration within an entity schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub field_type: FieldType,
    /// Non-queryable fields (e.g. credential columns) compile-fail exactly
    /// like absent fields and are stripped from API responses.
    pub queryable: bool,
}

/// The declared, queryable field set of one entity.
///
/// Ordered map so schema introspection and error output are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    fields: BTreeMap<String, FieldDef>,
}

impl FieldSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a queryable field.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(
            name.into(),
            FieldDef {
                field_type,
                queryable: true,
            },
        );
        self
    }

    /// Declare a field that exists on the entity but may not be filtered on
    /// and never appears in responses.
    pub fn hidden_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(
            name.into(),
            FieldDef {
                field_type,
                queryable: false,
            },
        );
        self
    }

    /// Look up a field regardless of queryability.
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    /// Look up a field the query engine may reference.
    pub fn queryable(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name).filter(|def| def.queryable)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldDef)> {
        self.fields.iter()
    }

    /// Names of the fields that are allowed to appear in responses.
    pub fn visible_names(&self) -> impl Iterator<Item = &String> {
        self.fields
            .iter()
            .filter(|(_, def)| def.queryable)
            .map(|(name, _)| name)
    }

    /// Render the queryable fields as a JSON-Schema style document for the
    /// `_schema` introspection endpoint.
    pub fn to_json_schema(&self, title: &str) -> Value {
        let mut properties = serde_json::Map::new();
        for (name, def) in self.fields.iter().filter(|(_, def)| def.queryable) {
            let (ty, format) = def.field_type.json_schema_type();
            let mut prop = json!({ "type": ty });
            if let Some(format) = format {
                prop["format"] = json!(format);
            }
            properties.insert(name.clone(), prop);
        }
        json!({
            "title": title,
            "type": "object",
            "properties": properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_fields_are_not_queryable() {
        let schema = FieldSchema::new()
            .field("email", FieldType::Text)
            .hidden_field("password", FieldType::Text);

        assert!(schema.queryable("email").is_some());
        assert!(schema.queryable("password").is_none());
        assert!(schema.get("password").is_some());
    }

    #[test]
    fn boolean_rejects_ordering_operators() {
        for op in [
            ComparisonOp::Lt,
            ComparisonOp::Le,
            ComparisonOp::Gt,
            ComparisonOp::Ge,
        ] {
            assert!(!FieldType::Boolean.supports(op));
        }
        assert!(FieldType::Boolean.supports(ComparisonOp::Eq));
        assert!(FieldType::Boolean.supports(ComparisonOp::Ne));
    }

    #[test]
    fn accepts_gates_json_values_by_type() {
        use serde_json::json;

        assert!(FieldType::Integer.accepts(&json!(42)));
        assert!(!FieldType::Integer.accepts(&json!(4.5)));
        assert!(!FieldType::Integer.accepts(&json!("42")));

        assert!(FieldType::Float.accepts(&json!(4.5)));
        assert!(FieldType::Float.accepts(&json!(4)));

        assert!(FieldType::Text.accepts(&json!("hello")));
        assert!(!FieldType::Text.accepts(&json!(5)));

        assert!(FieldType::Boolean.accepts(&json!(true)));
        assert!(!FieldType::Boolean.accepts(&json!("true")));

        assert!(FieldType::Date.accepts(&json!("1990-01-01")));
        assert!(!FieldType::Date.accepts(&json!("yesterday")));

        assert!(FieldType::DateTime.accepts(&json!("2024-05-01T12:00:00Z")));
        assert!(FieldType::DateTime.accepts(&json!("2024-05-01T12:00:00")));
        assert!(!FieldType::DateTime.accepts(&json!("garbage")));

        // Every field is nullable.
        for ty in [
            FieldType::Integer,
            FieldType::Float,
            FieldType::Text,
            FieldType::Boolean,
            FieldType::Date,
            FieldType::DateTime,
        ] {
            assert!(ty.accepts(&Value::Null));
        }
    }

    #[test]
    fn json_schema_lists_only_visible_fields() {
        let schema = FieldSchema::new()
            .field("id", FieldType::Integer)
            .field("dob", FieldType::Date)
            .hidden_field("password", FieldType::Text);

        let doc = schema.to_json_schema("user");
        let props = doc["properties"].as_object().unwrap();
        assert_eq!(props["id"]["type"], "integer");
        assert_eq!(props["dob"]["format"], "date");
        assert!(!props.contains_key("password"));
    }
}
