//! Raw transaction events as they arrive off the wire.

use crate::error::PipelineError;
use serde_json::Value;

/// A transaction event decoded from one bus message.
///
/// Producers use inconsistent naming conventions (snake_case and camelCase
/// synonyms for the same concept), so the event stays an untyped JSON map and
/// the normalizer resolves canonical feature names against it.
pub type TransactionEvent = serde_json::Map<String, Value>;

/// Decode a message payload into a transaction event.
///
/// The payload must be UTF-8 JSON and the top-level value must be an object;
/// anything else is rejected so the ingress loop can log and skip it.
pub fn decode_event(payload: &[u8]) -> Result<TransactionEvent, PipelineError> {
    if payload.is_empty() {
        return Err(PipelineError::Decode("empty payload".to_string()));
    }

    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| PipelineError::Decode(e.to_string()))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(PipelineError::Decode(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_object() {
        let event = decode_event(br#"{"transactionId":"tx-1","amount":100}"#).unwrap();
        assert_eq!(event.get("transactionId").unwrap(), "tx-1");
        assert_eq!(event.get("amount").unwrap(), 100);
    }

    #[test]
    fn test_decode_rejects_empty_payload() {
        assert!(decode_event(b"").is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        assert!(decode_event(b"{not json").is_err());
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(decode_event(b"[1,2,3]").is_err());
        assert!(decode_event(b"\"gray\"").is_err());
        assert!(decode_event(b"42").is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert!(decode_event(&[0xff, 0xfe, 0x7b]).is_err());
    }
}
