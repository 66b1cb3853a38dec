use crate::errors::AttemptError;
use crate::schemas::shapes::ResponseShape;
use serde_json::Value;

/// Parses the span between the first `{` and the last `}` of `text`.
pub fn extract_json(text: &str) -> Result<Value, AttemptError> {
    if text.trim().is_empty() {
        return Err(AttemptError::Parse("model returned no text".into()));
    }

    let (start, end) = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => (start, end),
        _ => return Err(AttemptError::Parse("no JSON object found in output".into())),
    };

    serde_json::from_str(&text[start..=end]).map_err(|e| AttemptError::Parse(e.to_string()))
}

pub fn extract_validated(text: &str, shape: &dyn ResponseShape) -> Result<Value, AttemptError> {
    let value = extract_json(text)?;
    shape.check(&value)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::shapes::{HintShape, QuestionsShape};
    use serde_json::json;

    #[test]
    fn ignores_surrounding_prose() {
        let value =
            extract_json("Sure! Here you go: {\"hint\":\"Check the theorem.\"} Thanks.").unwrap();

        assert_eq!(value, json!({ "hint": "Check the theorem." }));
    }

    #[test]
    fn keeps_nested_objects() {
        let text = "```json\n{\"questions\":[{\"id\":\"q1\",\"options\":[{\"id\":\"a\"}]}]}\n```";

        let value = extract_validated(text, &QuestionsShape).unwrap();
        assert_eq!(value["questions"][0]["options"][0]["id"], "a");
    }

    #[test]
    fn missing_braces_is_parse_error() {
        assert!(matches!(extract_json("no json here"), Err(AttemptError::Parse(_))));
        assert!(matches!(extract_json("} backwards {"), Err(AttemptError::Parse(_))));
        assert!(matches!(extract_json(""), Err(AttemptError::Parse(_))));
    }

    #[test]
    fn invalid_json_between_braces_is_parse_error() {
        assert!(matches!(
            extract_json("{ hint: unquoted }"),
            Err(AttemptError::Parse(_))
        ));
    }

    #[test]
    fn shape_mismatch_is_schema_error() {
        assert!(matches!(
            extract_validated("{\"questions\":[]}", &HintShape),
            Err(AttemptError::Schema(_))
        ));
    }
}
