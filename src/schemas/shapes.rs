//! Named descriptors for the JSON shapes a model response must have.

use serde_json::Value;
use std::fmt::Debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("response does not match {shape}: {reason}")]
pub struct SchemaViolation {
    pub shape: &'static str,
    pub reason: String,
}

pub trait ResponseShape: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, value: &Value) -> Result<(), SchemaViolation>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Array,
    NonEmptyString,
}

fn require_field(
    shape: &'static str,
    value: &Value,
    field: &str,
    kind: FieldKind,
) -> Result<(), SchemaViolation> {
    let violation = |reason: String| SchemaViolation { shape, reason };

    let object = value
        .as_object()
        .ok_or_else(|| violation("top-level value is not an object".to_string()))?;
    let found = object
        .get(field)
        .ok_or_else(|| violation(format!("missing field `{}`", field)))?;

    match (kind, found) {
        (FieldKind::Array, Value::Array(_)) => Ok(()),
        (FieldKind::NonEmptyString, Value::String(s)) if !s.trim().is_empty() => Ok(()),
        (FieldKind::Array, _) => Err(violation(format!("field `{}` is not an array", field))),
        (FieldKind::NonEmptyString, _) => Err(violation(format!(
            "field `{}` is not a non-empty string",
            field
        ))),
    }
}

/// Quiz output: an object with a `questions` array.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionsShape;

impl ResponseShape for QuestionsShape {
    fn name(&self) -> &'static str {
        "QuestionsShape"
    }

    fn check(&self, value: &Value) -> Result<(), SchemaViolation> {
        require_field(self.name(), value, "questions", FieldKind::Array)
    }
}

/// Hint output: an object with a non-empty `hint` string.
#[derive(Debug, Clone, Copy, Default)]
pub struct HintShape;

impl ResponseShape for HintShape {
    fn name(&self) -> &'static str {
        "HintShape"
    }

    fn check(&self, value: &Value) -> Result<(), SchemaViolation> {
        require_field(self.name(), value, "hint", FieldKind::NonEmptyString)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn questions_shape_accepts_array() {
        assert!(QuestionsShape.check(&json!({ "questions": [] })).is_ok());
    }

    #[test]
    fn questions_shape_rejects_missing_or_wrong_type() {
        let missing = QuestionsShape.check(&json!({ "hint": "x" })).unwrap_err();
        assert_eq!(missing.reason, "missing field `questions`");

        let wrong = QuestionsShape.check(&json!({ "questions": "q1" })).unwrap_err();
        assert_eq!(wrong.shape, "QuestionsShape");
        assert!(wrong.reason.contains("not an array"));
    }

    #[test]
    fn hint_shape_requires_non_empty_string() {
        assert!(HintShape.check(&json!({ "hint": "Check the theorem." })).is_ok());
        assert!(HintShape.check(&json!({ "hint": "" })).is_err());
        assert!(HintShape.check(&json!({ "hint": 3 })).is_err());
        assert!(HintShape.check(&json!(["hint"])).is_err());
    }
}
