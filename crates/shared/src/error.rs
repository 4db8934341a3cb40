use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured body the backend attaches to non-2xx responses.
///
/// `detail` is usually a string, but request-validation failures carry a list
/// of objects instead, so it is kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl ErrorBody {
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::Null => None,
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn failure_reason_text(&self) -> Option<String> {
        self.failure_reason
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_structured_detail_as_json() {
        let body: ErrorBody = serde_json::from_value(json!({
            "detail": [{ "loc": ["body", "job_position"], "msg": "field required" }]
        }))
        .expect("body");
        let text = body.detail_text().expect("detail");
        assert!(text.contains("field required"));
        assert!(body.failure_reason_text().is_none());
    }

    #[test]
    fn blank_fields_count_as_absent() {
        let body: ErrorBody =
            serde_json::from_value(json!({ "detail": "  ", "failure_reason": "" })).expect("body");
        assert!(body.detail_text().is_none());
        assert!(body.failure_reason_text().is_none());
    }
}
