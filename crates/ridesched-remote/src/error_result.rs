//! Failed HTTP responses to structured errors.

use serde_json::Value;

use crate::error::RemoteError;
use crate::result::OperationResult;
use crate::transport::HttpResponse;

/// Longest raw (non-JSON) body quoted in an error message.
pub const MAX_RAW_BODY_CHARS: usize = 200;

/// Builds the error for a failed response.
///
/// The message always carries the status and `context`. A JSON `error`,
/// `message` or `errors` field is appended when present; otherwise a short
/// plain-text body is quoted.
pub fn error_from_response(response: &HttpResponse, context: &str) -> RemoteError {
    let mut message = format!("{} failed (HTTP {})", context, response.status);
    if let Some(detail) = response_detail(&response.body) {
        message.push_str(": ");
        message.push_str(&detail);
    }
    RemoteError::remote(response.status, message)
}

/// Builds the failed result for a response.
pub fn build_error_result<T>(response: &HttpResponse, context: &str) -> OperationResult<T> {
    OperationResult::failure(error_from_response(response, context))
}

fn response_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => json_detail(&json),
        Err(_) => raw_detail(trimmed),
    }
}

fn json_detail(json: &Value) -> Option<String> {
    let mut parts = Vec::new();
    for key in ["error", "message"] {
        if let Some(text) = json.get(key).and_then(flatten) {
            if !parts.contains(&text) {
                parts.push(text);
            }
        }
    }
    if let Some(errors) = json.get("errors").and_then(flatten) {
        parts.push(errors);
    }
    (!parts.is_empty()).then(|| parts.join("; "))
}

/// Renders a JSON error field: strings as-is, arrays joined, objects as
/// `field: message` pairs.
fn flatten(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items.iter().filter_map(flatten).collect::<Vec<_>>().join(", "),
        Value::Object(map) => map
            .iter()
            .filter_map(|(k, v)| flatten(v).map(|v| format!("{} {}", k, v)))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn raw_detail(body: &str) -> Option<String> {
    // HTML error pages carry nothing useful in a one-line message.
    if body.starts_with('<') || body.chars().count() > MAX_RAW_BODY_CHARS {
        return None;
    }
    Some(body.split_whitespace().collect::<Vec<_>>().join(" "))
}
