use serde_json::Value;

/// A validated model output handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub value: Value,
    pub cached: bool,
    /// Model that produced the value; `None` when served from cache.
    pub model: Option<String>,
}

impl GenerationResult {
    pub fn from_cache(value: Value) -> Self {
        Self {
            value,
            cached: true,
            model: None,
        }
    }

    pub fn from_model(value: Value, model: &str) -> Self {
        Self {
            value,
            cached: false,
            model: Some(model.to_string()),
        }
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}
