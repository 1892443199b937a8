use serde_json::{Map, Value};

use crate::TableSpec;

/// Fixed-length embedding as produced by a provider.
pub type EmbeddingVector = Vec<f32>;

/// Read-only snapshot of one candidate row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Stringified primary key value.
    pub id: String,
    /// Text-field values keyed by column name, held as JSON so string,
    /// array and numeric columns render uniformly.
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self { id: id.into(), fields }
    }
}

/// Text sent to the embedding provider for `record` under `spec`.
///
/// Values render in `text_fields` order, joined by single spaces. Null or
/// absent values contribute nothing; array elements are flattened in order.
/// Returns an empty string when no field renders any text.
#[must_use]
pub fn embedding_text(spec: &TableSpec, record: &Record) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(spec.text_fields.len());
    for field in &spec.text_fields {
        let rendered = record.fields.get(field).map(render_value).unwrap_or_default();
        if !rendered.is_empty() {
            parts.push(rendered);
        }
    }
    parts.join(" ")
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => {
            let rendered: Vec<String> =
                items.iter().map(render_value).filter(|s| !s.is_empty()).collect();
            rendered.join(" ")
        },
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(fields: &[&str]) -> TableSpec {
        TableSpec::builder("clinics")
            .text_fields(fields.iter().copied())
            .embedding_target("vector_embedding")
            .build()
            .unwrap()
    }

    fn record(value: Value) -> Record {
        let Value::Object(fields) = value else { panic!("test record must be an object") };
        Record::new("row-1", fields)
    }

    #[test]
    fn joins_fields_in_spec_order() {
        let spec = spec(&["name", "location"]);
        let record = record(json!({"name": "Acme", "location": "Nairobi"}));
        assert_eq!(embedding_text(&spec, &record), "Acme Nairobi");
    }

    #[test]
    fn spec_order_wins_over_record_order() {
        let spec = spec(&["location", "name"]);
        let record = record(json!({"name": "Acme", "location": "Nairobi"}));
        assert_eq!(embedding_text(&spec, &record), "Nairobi Acme");
    }

    #[test]
    fn null_and_absent_fields_contribute_nothing() {
        let spec = spec(&["name", "specialty", "location"]);
        let record = record(json!({"name": "Acme", "specialty": null}));
        assert_eq!(embedding_text(&spec, &record), "Acme");
    }

    #[test]
    fn no_double_space_around_empty_middle_field() {
        let spec = spec(&["name", "specialty", "location"]);
        let record = record(json!({"name": "Acme", "specialty": "", "location": "Nairobi"}));
        assert_eq!(embedding_text(&spec, &record), "Acme Nairobi");
    }

    #[test]
    fn array_values_flatten_in_order() {
        let spec = spec(&["name", "services"]);
        let record = record(json!({"name": "Acme", "services": ["physio", "massage"]}));
        assert_eq!(embedding_text(&spec, &record), "Acme physio massage");
    }

    #[test]
    fn numbers_render_as_text() {
        let spec = spec(&["name", "beds"]);
        let record = record(json!({"name": "Acme", "beds": 12}));
        assert_eq!(embedding_text(&spec, &record), "Acme 12");
    }

    #[test]
    fn whitespace_only_record_renders_empty() {
        let spec = spec(&["name", "bio"]);
        let record = record(json!({"name": "  ", "bio": null}));
        assert_eq!(embedding_text(&spec, &record), "");
    }
}
