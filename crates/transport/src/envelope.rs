use serde_json::Value;

use crate::error::{ErrorKind, Result};

/// Reject a response carrying the API's error envelope.
///
/// The texts API reports failures (unknown refs, missing versions) with a
/// success status and a body of `{"error": "..."}`. Any object with an
/// `error` key is turned into [`ErrorKind::Server`]; everything else passes
/// through untouched.
///
/// ```
/// use folio_transport::check_envelope;
/// use serde_json::json;
///
/// assert!(check_envelope(json!({"ref": "Genesis 1"})).is_ok());
/// assert!(check_envelope(json!({"error": "Unknown book."})).is_err());
/// ```
pub fn check_envelope(value: Value) -> Result<Value> {
    if let Some(error) = value.as_object().and_then(|object| object.get("error")) {
        let message = match error {
            Value::String(message) => message.clone(),
            other => other.to_string(),
        };
        tracing::warn!(%message, "API returned an error envelope");
        exn::bail!(ErrorKind::Server(message));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_passes_payloads_through() {
        let payload = json!([{"anchorRef": "Genesis 1:1"}]);
        assert_eq!(check_envelope(payload.clone()).unwrap(), payload);
    }

    #[test]
    fn test_rejects_error_envelope() {
        let err = check_envelope(json!({"error": "Unknown book."})).unwrap_err();
        assert_eq!(*err, ErrorKind::Server("Unknown book.".to_string()));
    }

    #[test]
    fn test_non_string_error() {
        let err = check_envelope(json!({"error": {"code": 4}})).unwrap_err();
        assert_eq!(*err, ErrorKind::Server(r#"{"code":4}"#.to_string()));
    }
}
