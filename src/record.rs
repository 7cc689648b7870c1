use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const TEXT_FIELD: &str = "text";

/// A single input object. Field order is kept as it appeared on the input line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

impl Record {
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        match serde_json::from_str::<Value>(line)? {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(RecordError::NotAnObject(json_kind(&other))),
        }
    }

    /// The `text` field, when it is a non-empty string.
    pub fn text(&self) -> Option<&str> {
        self.fields
            .get(TEXT_FIELD)
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
    }

    pub fn word_count(&self) -> usize {
        self.text().map_or(0, |text| text.split_whitespace().count())
    }

    /// Replaces `text` in place; its position among the fields does not move.
    pub fn set_text(&mut self, text: String) {
        self.fields.insert(TEXT_FIELD.to_string(), Value::String(text));
    }

    pub fn insert(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_objects_and_rejects_other_json() {
        let record = Record::parse(r#"{"id": 7, "text": "hello there"}"#).unwrap();
        assert_eq!(record.text(), Some("hello there"));
        assert_eq!(record.word_count(), 2);

        assert!(matches!(
            Record::parse("[1, 2]"),
            Err(RecordError::NotAnObject("an array"))
        ));
        assert!(matches!(Record::parse("{not json"), Err(RecordError::Json(_))));
    }

    #[test]
    fn empty_or_non_string_text_reads_as_absent() {
        assert_eq!(Record::parse(r#"{"text": ""}"#).unwrap().text(), None);
        assert_eq!(Record::parse(r#"{"text": 42}"#).unwrap().text(), None);
        assert_eq!(Record::parse(r#"{"body": "x"}"#).unwrap().text(), None);
    }

    #[test]
    fn set_text_keeps_field_position() {
        let mut record = Record::parse(r#"{"a": 1, "text": "I'm here", "z": 2}"#).unwrap();
        record.set_text("I am here".to_string());
        record.insert("extra", Value::Bool(true));
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"a":1,"text":"I am here","z":2,"extra":true}"#
        );
    }
}
