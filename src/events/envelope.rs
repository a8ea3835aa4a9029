use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{base64_bytes, Event};
use crate::errors::{ErrorCode, ServiceError};

/// Response published for every handled event.
///
/// Built only through [`ResponseEnvelope::success`] and
/// [`ResponseEnvelope::failure`], so exactly one of `result` and
/// `error`/`error_code` is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "aggregateID")]
    pub aggregate_id: i8,
    #[serde(rename = "correlationID")]
    pub correlation_id: Uuid,
    /// Unique id of the originating event.
    pub uuid: Uuid,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_bytes::option"
    )]
    pub result: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(
        rename = "errorCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub error_code: Option<ErrorCode>,
}

impl ResponseEnvelope {
    pub fn success(event: &Event, result: Vec<u8>) -> Self {
        Self {
            aggregate_id: event.aggregate_id,
            correlation_id: event.correlation_id,
            uuid: event.time_uuid,
            result: Some(result),
            error: None,
            error_code: None,
        }
    }

    pub fn failure(event: &Event, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            aggregate_id: event.aggregate_id,
            correlation_id: event.correlation_id,
            uuid: event.time_uuid,
            result: None,
            error: Some(message.into()),
            error_code: Some(code),
        }
    }

    /// Failure envelope for a service error, message prefixed with `context`.
    pub fn from_error(event: &Event, context: &str, err: &ServiceError) -> Self {
        Self::failure(event, err.error_code(), format!("{}: {}", context, err))
    }

    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }

    /// Decodes the success payload as JSON.
    pub fn result_json<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.result
            .as_deref()
            .map(|bytes| serde_json::from_slice(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::shipment::AGGREGATE_ID;
    use serde_json::{json, Value};

    fn event() -> Event {
        Event::new("delete", AGGREGATE_ID, b"{}".to_vec())
    }

    #[test]
    fn success_echoes_event_identity() {
        let event = event();
        let envelope = ResponseEnvelope::success(&event, br#"{"deletedCount":3}"#.to_vec());

        assert_eq!(envelope.aggregate_id, event.aggregate_id);
        assert_eq!(envelope.correlation_id, event.correlation_id);
        assert_eq!(envelope.uuid, event.time_uuid);
        assert!(envelope.is_success());
        assert!(envelope.error.is_none() && envelope.error_code.is_none());
        let payload: Value = envelope.result_json().unwrap().unwrap();
        assert_eq!(payload, json!({"deletedCount": 3}));
    }

    #[test]
    fn failure_has_no_result() {
        let event = event();
        let err = ServiceError::ValidationError("blank filter provided".into());
        let envelope = ResponseEnvelope::from_error(&event, "Delete", &err);

        assert!(!envelope.is_success());
        assert_eq!(envelope.error_code, Some(ErrorCode::Internal));
        assert_eq!(
            envelope.error.as_deref(),
            Some("Delete: Validation error: blank filter provided")
        );
        assert!(envelope.result_json::<Value>().is_none());
    }

    #[test]
    fn json_form_omits_the_unused_half() {
        let event = event();
        let ok = serde_json::to_value(ResponseEnvelope::success(&event, b"{}".to_vec())).unwrap();
        assert_eq!(ok["result"], json!("e30="));
        assert!(ok.get("error").is_none() && ok.get("errorCode").is_none());

        let failed = ResponseEnvelope::failure(&event, ErrorCode::Database, "down");
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["errorCode"], json!("database"));
        assert!(value.get("result").is_none());

        let back: ResponseEnvelope = serde_json::from_value(value).unwrap();
        assert_eq!(back, failed);
    }
}
